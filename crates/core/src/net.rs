//! Network seam between the gateway and the outside world.

use async_trait::async_trait;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Performs the actual network fetch for a request.
///
/// Implementors return `Ok` for any completed HTTP exchange, including
/// error statuses; `Err` is reserved for transport failures (the case
/// that triggers the gateway's fallback policy).
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait]
impl<T: Network + ?Sized> Network for std::sync::Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
