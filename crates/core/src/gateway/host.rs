//! Host capability provider.
//!
//! The gateway asks its host two things: whether request interception is
//! available at all, and to claim open clients at activation so they are
//! served without a reload. Hosts without interception support get the
//! inert implementation, which turns every `handle` call into a
//! pass-through.

use async_trait::async_trait;

/// Capabilities provided by the environment hosting the gateway.
#[async_trait]
pub trait HostCapabilities: Send + Sync {
    /// Whether the host can intercept requests at all.
    fn supports_interception(&self) -> bool;

    /// Take control of all open clients so they are served by this
    /// gateway without requiring a reload.
    async fn claim_clients(&self);
}

/// Default host: interception supported, claiming is a local no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHost;

#[async_trait]
impl HostCapabilities for DefaultHost {
    fn supports_interception(&self) -> bool {
        true
    }

    async fn claim_clients(&self) {
        tracing::debug!("claimed open clients");
    }
}

/// No-op host for environments lacking interception support.
#[derive(Debug, Clone, Copy, Default)]
pub struct InertHost;

#[async_trait]
impl HostCapabilities for InertHost {
    fn supports_interception(&self) -> bool {
        false
    }

    async fn claim_clients(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_host_supports_interception() {
        let host = DefaultHost;
        assert!(host.supports_interception());
        host.claim_clients().await;
    }

    #[tokio::test]
    async fn test_inert_host_lacks_interception() {
        let host = InertHost;
        assert!(!host.supports_interception());
        host.claim_clients().await;
    }
}
