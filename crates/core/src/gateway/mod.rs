//! The offline cache gateway.
//!
//! Lifecycle state machine over a generation-named cache store:
//!
//! - **install**: populate the current generation from the precache
//!   manifest; any failure is fatal to the attempt (no automatic retry).
//! - **activate**: purge every other generation, then claim open clients.
//! - **serving**: cache-first for same-origin GET requests, with lazy
//!   store population on miss and a cached fallback page for failed
//!   document navigations. Everything else passes through untouched.
//!
//! Cache writes on the serving path are fire-and-forget: the response is
//! returned before the write lands, and write failures are only logged.

pub mod host;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use url::Url;

use crate::cache::CacheDb;
use crate::error::Error;
use crate::net::Network;
use crate::request::{Destination, Request};
use crate::response::Response;

pub use host::{DefaultHost, HostCapabilities, InertHost};

/// Gateway construction parameters.
///
/// Explicit configuration instead of module globals, so multiple gateways
/// with distinct generations can coexist (and be tested) without shared
/// state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Name of the current cache generation.
    pub generation: String,
    /// Site origin; only requests sharing it are intercepted.
    pub origin: Url,
    /// Site-relative paths fetched and stored at install time.
    pub precache: Vec<String>,
    /// Path of the cached page served when a document navigation fails.
    pub fallback_path: String,
}

/// Gateway lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, not yet installed.
    Idle,
    Installing,
    /// Install finished; takeover is immediate (no waiting on prior
    /// generations).
    Installed,
    Activating,
    Active,
    /// Install failed; the attempt is abandoned and left for the host to
    /// retry wholesale.
    Failed,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Installing => "installing",
            Lifecycle::Installed => "installed",
            Lifecycle::Activating => "activating",
            Lifecycle::Active => "active",
            Lifecycle::Failed => "failed",
        }
    }
}

/// How the gateway answered an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted: non-GET, cross-origin, or no interception support.
    PassThrough,
    /// Served from the store, no network involved.
    Hit(Response),
    /// Served from the network (and stored in the background if eligible).
    Miss(Response),
    /// Network failed on a document navigation; cached fallback served.
    Fallback(Response),
}

impl FetchOutcome {
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::PassThrough => "pass-through",
            FetchOutcome::Hit(_) => "cache",
            FetchOutcome::Miss(_) => "network",
            FetchOutcome::Fallback(_) => "fallback",
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Hit(r) | FetchOutcome::Miss(r) | FetchOutcome::Fallback(r) => Some(r),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Hit(r) | FetchOutcome::Miss(r) | FetchOutcome::Fallback(r) => Some(r),
        }
    }
}

/// The offline cache gateway.
pub struct Gateway<N: Network> {
    db: CacheDb,
    network: N,
    config: GatewayConfig,
    host: Arc<dyn HostCapabilities>,
    state: Mutex<Lifecycle>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl<N: Network> Gateway<N> {
    pub fn new(db: CacheDb, network: N, config: GatewayConfig) -> Self {
        Self {
            db,
            network,
            config,
            host: Arc::new(DefaultHost),
            state: Mutex::new(Lifecycle::Idle),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Replace the host capability provider.
    pub fn with_host(mut self, host: Arc<dyn HostCapabilities>) -> Self {
        self.host = host;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: Lifecycle) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Populate the current generation from the precache manifest.
    ///
    /// Returns the number of precached paths. Any fetch failure, non-200
    /// status, or non-basic response fails the whole install; the gateway
    /// is left in [`Lifecycle::Failed`] and nothing is retried here.
    pub async fn install(&self) -> Result<usize, Error> {
        self.set_state(Lifecycle::Installing);
        match self.precache_all().await {
            Ok(count) => {
                // Forced takeover: installed immediately, no waiting on
                // prior generations.
                self.set_state(Lifecycle::Installed);
                tracing::info!(generation = %self.config.generation, count, "install complete");
                Ok(count)
            }
            Err(err) => {
                self.set_state(Lifecycle::Failed);
                tracing::error!(%err, generation = %self.config.generation, "install failed");
                Err(err)
            }
        }
    }

    async fn precache_all(&self) -> Result<usize, Error> {
        for path in &self.config.precache {
            let request = self.site_request(path)?;
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.is_cacheable() {
                return Err(Error::InstallFailed(format!(
                    "{path}: status {} ({})",
                    response.status,
                    response.kind.as_str()
                )));
            }
            self.db.put_entry(&self.config.generation, &request, &response).await?;
        }
        Ok(self.config.precache.len())
    }

    /// Purge every generation other than the current one, then claim all
    /// open clients.
    ///
    /// Returns the names of the purged generations.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.set_state(Lifecycle::Activating);
        let mut purged = Vec::new();
        for generation in self.db.generations().await? {
            if generation != self.config.generation {
                let deleted = self.db.delete_generation(&generation).await?;
                tracing::info!(%generation, deleted, "purged stale generation");
                purged.push(generation);
            }
        }
        self.host.claim_clients().await;
        self.set_state(Lifecycle::Active);
        Ok(purged)
    }

    /// Serve an intercepted request, cache-first.
    ///
    /// Same-origin GET requests are answered from the store when present
    /// (no freshness check); on a miss the network response is returned
    /// and, if it is a `200 Basic`, stored in the background. A transport
    /// failure on a document navigation is answered with the cached
    /// fallback page; on any other destination the failure propagates.
    ///
    /// Everything else is [`FetchOutcome::PassThrough`].
    pub async fn handle(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !self.host.supports_interception() || !request.is_get() || !request.same_origin(&self.config.origin) {
            return Ok(FetchOutcome::PassThrough);
        }

        if let Some(entry) = self.db.match_request(&self.config.generation, request).await? {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(FetchOutcome::Hit(entry.into_response()?));
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.spawn_write(request.clone(), response.clone());
                }
                Ok(FetchOutcome::Miss(response))
            }
            Err(err) => {
                if request.destination == Destination::Document {
                    let fallback = self.site_request(&self.config.fallback_path)?;
                    if let Some(entry) = self.db.match_request(&self.config.generation, &fallback).await? {
                        tracing::warn!(url = %request.url, %err, "network failed, serving fallback page");
                        return Ok(FetchOutcome::Fallback(entry.into_response()?));
                    }
                }
                Err(err)
            }
        }
    }

    /// Detached background write; failures are logged, never surfaced.
    fn spawn_write(&self, request: Request, response: Response) {
        let db = self.db.clone();
        let generation = self.config.generation.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = db.put_entry(&generation, &request, &response).await {
                tracing::warn!(%err, url = %request.url, "cache write failed");
            }
        });
        let mut pending = self.pending_writes.lock().unwrap_or_else(PoisonError::into_inner);
        // Keep the backlog bounded in hosts that never drain.
        pending.retain(|write| !write.is_finished());
        pending.push(handle);
    }

    /// Wait for all outstanding background cache writes.
    ///
    /// The serving path never waits on writes; this exists so tests (and
    /// short-lived hosts about to exit) can settle them deterministically.
    pub async fn drain_writes(&self) {
        let handles = std::mem::take(&mut *self.pending_writes.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn site_request(&self, path: &str) -> Result<Request, Error> {
        let url = self
            .config
            .origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Request::get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Route {
        Respond(Response),
        Fail,
    }

    /// Scripted network: fixed routes by URL, counting every fetch.
    struct StubNetwork {
        routes: HashMap<String, Route>,
        fetches: AtomicUsize,
    }

    impl StubNetwork {
        fn new() -> Self {
            Self { routes: HashMap::new(), fetches: AtomicUsize::new(0) }
        }

        fn respond(mut self, url: &str, response: Response) -> Self {
            self.routes.insert(url.to_string(), Route::Respond(response));
            self
        }

        fn fail(mut self, url: &str) -> Self {
            self.routes.insert(url.to_string(), Route::Fail);
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.routes.get(request.url.as_str()) {
                Some(Route::Respond(response)) => Ok(response.clone()),
                Some(Route::Fail) => Err(Error::Network("connection reset".to_string())),
                None => Err(Error::Network(format!("no route for {}", request.url))),
            }
        }
    }

    const ORIGIN: &str = "https://ksvisual.example";

    fn config() -> GatewayConfig {
        GatewayConfig {
            generation: "v1".to_string(),
            origin: Url::parse(ORIGIN).unwrap(),
            precache: vec!["/".to_string(), "/index.html".to_string(), "/404.html".to_string()],
            fallback_path: "/404.html".to_string(),
        }
    }

    fn site_network() -> StubNetwork {
        StubNetwork::new()
            .respond(&format!("{ORIGIN}/"), Response::basic("<html>home</html>"))
            .respond(&format!("{ORIGIN}/index.html"), Response::basic("<html>index</html>"))
            .respond(&format!("{ORIGIN}/404.html"), Response::basic("<html>not found</html>"))
    }

    async fn gateway(network: StubNetwork) -> Gateway<Arc<StubNetwork>> {
        let db = CacheDb::open_in_memory().await.unwrap();
        Gateway::new(db, Arc::new(network), config())
    }

    fn page(path: &str) -> Request {
        Request::document(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    fn asset(path: &str) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap()).with_destination(Destination::Image)
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let gw = gateway(site_network()).await;

        let count = gw.install().await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(gw.lifecycle(), Lifecycle::Installed);
        assert_eq!(gw.db().entry_count("v1").await.unwrap(), 3);

        let paths = gw.config().precache.clone();
        for path in &paths {
            let request = Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap());
            assert!(gw.db().match_request("v1", &request).await.unwrap().is_some(), "missing precache: {path}");
        }
    }

    #[tokio::test]
    async fn test_install_failure_is_fatal() {
        let network = site_network().fail(&format!("{ORIGIN}/index.html"));
        let gw = gateway(network).await;

        let err = gw.install().await.unwrap_err();
        assert!(matches!(err, Error::InstallFailed(_)));
        assert_eq!(gw.lifecycle(), Lifecycle::Failed);
    }

    #[tokio::test]
    async fn test_install_rejects_non_200() {
        let network = site_network().respond(
            &format!("{ORIGIN}/index.html"),
            Response { status: 500, ..Response::basic("oops") },
        );
        let gw = gateway(network).await;

        let err = gw.install().await.unwrap_err();
        assert!(matches!(err, Error::InstallFailed(_)));
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let gw = gateway(site_network()).await;
        gw.install().await.unwrap();
        let installed_fetches = gw.network.fetch_count();

        let outcome = gw.handle(&page("/index.html")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Hit(_)));
        assert_eq!(outcome.response().unwrap().body, Bytes::from("<html>index</html>"));
        assert_eq!(gw.network.fetch_count(), installed_fetches);
    }

    #[tokio::test]
    async fn test_miss_fetches_stores_and_returns_original() {
        let network = site_network().respond(
            &format!("{ORIGIN}/about.html"),
            Response::basic("<html>about</html>").with_header("Content-Type", "text/html"),
        );
        let gw = gateway(network).await;

        let outcome = gw.handle(&page("/about.html")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Miss(_)));
        assert_eq!(outcome.response().unwrap().body, Bytes::from("<html>about</html>"));

        gw.drain_writes().await;
        let entry = gw.db().match_request("v1", &page("/about.html")).await.unwrap().unwrap();
        assert_eq!(entry.into_response().unwrap().body, Bytes::from("<html>about</html>"));
    }

    #[tokio::test]
    async fn test_repeat_request_served_from_cache() {
        let network = site_network().respond(&format!("{ORIGIN}/about.html"), Response::basic("<html>about</html>"));
        let gw = gateway(network).await;

        let first = gw.handle(&page("/about.html")).await.unwrap();
        assert_eq!(first.source(), "network");
        assert_eq!(gw.network.fetch_count(), 1);

        gw.drain_writes().await;

        let second = gw.handle(&page("/about.html")).await.unwrap();
        assert_eq!(second.source(), "cache");
        assert_eq!(gw.network.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_non_cacheable_miss_not_stored() {
        let network = site_network().respond(
            &format!("{ORIGIN}/missing.html"),
            Response { status: 404, ..Response::basic("nope") },
        );
        let gw = gateway(network).await;

        let outcome = gw.handle(&page("/missing.html")).await.unwrap();
        assert_eq!(outcome.response().unwrap().status, 404);

        gw.drain_writes().await;
        assert!(gw.db().match_request("v1", &page("/missing.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let gw = gateway(site_network()).await;
        let request = Request {
            method: crate::request::Method::Post,
            url: Url::parse(&format!("{ORIGIN}/contact.html")).unwrap(),
            destination: Destination::Other,
        };

        let outcome = gw.handle(&request).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(gw.network.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through() {
        let gw = gateway(site_network()).await;
        let request = Request::get(Url::parse("https://cdn.example/font.woff2").unwrap());

        let outcome = gw.handle(&request).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(gw.network.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_inert_host_never_intercepts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let gw = Gateway::new(db, Arc::new(site_network()), config()).with_host(Arc::new(InertHost));

        let outcome = gw.handle(&page("/index.html")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PassThrough));
    }

    #[tokio::test]
    async fn test_activate_purges_stale_generations() {
        let gw = gateway(site_network()).await;
        gw.db().put_entry("v0", &page("/old.html"), &Response::basic("old")).await.unwrap();
        gw.db().put_entry("v0.9", &page("/older.html"), &Response::basic("older")).await.unwrap();
        gw.install().await.unwrap();

        let purged = gw.activate().await.unwrap();
        assert_eq!(purged, vec!["v0".to_string(), "v0.9".to_string()]);
        assert_eq!(gw.lifecycle(), Lifecycle::Active);
        assert_eq!(gw.db().generations().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_document_failure_serves_fallback() {
        let network = site_network().fail(&format!("{ORIGIN}/gallery.html"));
        let gw = gateway(network).await;
        gw.install().await.unwrap();

        let outcome = gw.handle(&page("/gallery.html")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Fallback(_)));
        assert_eq!(outcome.response().unwrap().body, Bytes::from("<html>not found</html>"));
    }

    #[tokio::test]
    async fn test_document_failure_without_cached_fallback_propagates() {
        let network = site_network().fail(&format!("{ORIGIN}/gallery.html"));
        let gw = gateway(network).await;
        // No install, so /404.html is not cached.

        let err = gw.handle(&page("/gallery.html")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_resource_failure_propagates() {
        let network = site_network().fail(&format!("{ORIGIN}/assets/photo.jpg"));
        let gw = gateway(network).await;
        gw.install().await.unwrap();

        let err = gw.handle(&asset("/assets/photo.jpg")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_failed_background_write_never_surfaces() {
        let gw = gateway(site_network()).await;
        gw.db()
            .conn
            .call(|conn| -> Result<(), Error> {
                conn.execute_batch("DROP TABLE entries")?;
                Ok(())
            })
            .await
            .unwrap();

        gw.spawn_write(page("/about.html"), Response::basic("<html>about</html>"));

        // The write fails against the dropped table; settling it must not
        // panic or propagate anything.
        gw.drain_writes().await;
    }

    #[tokio::test]
    async fn test_finished_writes_pruned_on_push() {
        let gw = gateway(site_network()).await;
        for _ in 0..4 {
            gw.spawn_write(page("/index.html"), Response::basic("<html>index</html>"));
        }

        loop {
            let all_done = gw
                .pending_writes
                .lock()
                .unwrap()
                .iter()
                .all(|write| write.is_finished());
            if all_done {
                break;
            }
            tokio::task::yield_now().await;
        }

        gw.spawn_write(page("/about.html"), Response::basic("<html>about</html>"));
        assert_eq!(gw.pending_writes.lock().unwrap().len(), 1);

        gw.drain_writes().await;
    }

    #[tokio::test]
    async fn test_two_gateways_distinct_generations() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let old = Gateway::new(
            db.clone(),
            Arc::new(site_network()),
            GatewayConfig { generation: "v1".to_string(), ..config() },
        );
        let new = Gateway::new(
            db.clone(),
            Arc::new(site_network()),
            GatewayConfig { generation: "v2".to_string(), ..config() },
        );

        old.install().await.unwrap();
        new.install().await.unwrap();
        assert_eq!(db.generations().await.unwrap(), vec!["v1".to_string(), "v2".to_string()]);

        new.activate().await.unwrap();
        assert_eq!(db.generations().await.unwrap(), vec!["v2".to_string()]);
    }
}
