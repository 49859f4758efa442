//! Transport seam between the engine and the network.
//!
//! The engine only needs "GET this URL, give me status, content type and a
//! body stream". [`HttpClient`](super::HttpClient) implements it over
//! reqwest; tests substitute an in-memory fake.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};

use super::DownloadError;

/// Response body as a stream of chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// Status line, content type and body of a GET response.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub body: BodyStream,
}

impl TransportResponse {
    /// Builds a response whose body is a single in-memory chunk.
    pub fn from_bytes(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests on behalf of the engine.
///
/// Implementations must be shareable across worker tasks; connection
/// limiting is applied by the engine before `get` is called.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a GET request for `url`.
    ///
    /// Non-success statuses are returned as a response, not an error: the
    /// engine decides which statuses it accepts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for transport failures (invalid URL, DNS,
    /// refused connection, timeout).
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_bytes_yields_single_chunk() {
        let mut response = TransportResponse::from_bytes(200, Some("image/jpeg"), vec![1u8, 2, 3]);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("image/jpeg"));

        let chunk = response.body.next().await.unwrap().unwrap();
        assert_eq!(chunk.as_ref(), &[1, 2, 3]);
        assert!(response.body.next().await.is_none());
    }

    #[test]
    fn test_debug_omits_body() {
        let response = TransportResponse::from_bytes(202, None, Vec::new());
        let debug = format!("{response:?}");
        assert!(debug.contains("202"));
        assert!(debug.contains(".."));
    }
}
