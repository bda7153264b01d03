//! Transport trait for abstracting the HTTP exchange.
//!
//! This module defines the [`ObjectTransport`] trait, the boundary between
//! the protocol logic in this crate and whatever actually moves bytes.

use async_trait::async_trait;

use super::error::ObjectResult;
use super::protocol::{WireRequest, WireResponse};

/// Executes one wire request and returns the raw response.
///
/// This trait allows for different transport implementations:
/// - Production: [`HttpTransport`](super::http_transport::HttpTransport), or a
///   wrapper that signs requests before sending them
/// - Testing: an in-memory service
///
/// Implementations return `Ok` for every response the service produced,
/// including error statuses; classification happens in the protocol layer.
/// `Err` is reserved for failures where no response exists.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct SigningTransport {
///     inner: HttpTransport,
///     signer: Signer,
/// }
///
/// #[async_trait]
/// impl ObjectTransport for SigningTransport {
///     async fn execute(&self, mut request: WireRequest) -> ObjectResult<WireResponse> {
///         self.signer.sign(&mut request);
///         self.inner.execute(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    /// Send `request` and return the response.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Transport`](super::error::ObjectError::Transport)
    /// if the exchange failed below HTTP (connect, timeout, body read).
    async fn execute(&self, request: WireRequest) -> ObjectResult<WireResponse>;
}
