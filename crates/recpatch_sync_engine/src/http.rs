//! HTTP transport.
//!
//! The HTTP client itself sits behind [`HttpClient`] so any library (or a
//! loopback into an in-process server) can carry the JSON bodies.

use crate::error::{SyncError, SyncResult};
use crate::transport::PatchTransport;
use parking_lot::RwLock;
use recpatch_sync_protocol::{PatchRequest, PatchResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Failure reported by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    /// No response within the timeout.
    TimedOut,
    /// The server answered with a non-success status.
    Status(u16),
    /// Connection-level failure.
    Network(String),
}

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Sends a POST with a JSON body and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<Vec<u8>, HttpFailure>;

    /// Checks if the client is healthy.
    fn is_healthy(&self) -> bool;
}

/// Patch transport over an [`HttpClient`].
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a transport posting under `base_url` (e.g. `https://patches.example.com`).
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the message of the last failed request.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn post_json<Req, Res>(&self, endpoint: &str, request: &Req, timeout: Duration) -> SyncResult<Res>
    where
        Req: JsonEncode,
        Res: JsonDecode,
    {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let body = request
            .encode_json()
            .map_err(|e| SyncError::Protocol(format!("failed to encode request: {e}")))?;

        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, bytes = body.len(), "posting patch request");
        let response = self.client.post(&url, body, timeout).map_err(|failure| {
            let err = match failure {
                HttpFailure::TimedOut => SyncError::Timeout,
                HttpFailure::Status(code) if code >= 500 => {
                    SyncError::transport_retryable(format!("server returned {code}"))
                }
                HttpFailure::Status(code) => {
                    SyncError::transport_fatal(format!("server returned {code}"))
                }
                HttpFailure::Network(message) => {
                    self.connected.store(false, Ordering::SeqCst);
                    SyncError::transport_retryable(message)
                }
            };
            *self.last_error.write() = Some(err.to_string());
            err
        })?;

        *self.last_error.write() = None;
        Res::decode_json(&response)
            .map_err(|e| SyncError::Protocol(format!("failed to decode response: {e}")))
    }

    /// Marks the transport usable again after a network failure.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }
}

impl<C: HttpClient> PatchTransport for HttpTransport<C> {
    fn request_patches(
        &self,
        endpoint: &str,
        request: &PatchRequest,
        timeout: Duration,
    ) -> SyncResult<PatchResponse> {
        self.post_json(endpoint, request, timeout)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    fn close(&self) -> SyncResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON body encoding.
pub trait JsonEncode {
    /// Encodes self to JSON bytes.
    fn encode_json(&self) -> Result<Vec<u8>, String>;
}

/// JSON body decoding.
pub trait JsonDecode: Sized {
    /// Decodes self from JSON bytes.
    fn decode_json(bytes: &[u8]) -> Result<Self, String>;
}

impl JsonEncode for PatchRequest {
    fn encode_json(&self) -> Result<Vec<u8>, String> {
        self.encode().map_err(|e| e.to_string())
    }
}

impl JsonDecode for PatchResponse {
    fn decode_json(bytes: &[u8]) -> Result<Self, String> {
        Self::decode(bytes).map_err(|e| e.to_string())
    }
}

/// Server side of a loopback connection.
pub trait LoopbackServer {
    /// Handles a POST to `path` and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, HttpFailure>;
}

/// An [`HttpClient`] that hands requests straight to an in-process server.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a loopback client for `server`.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(&self, url: &str, body: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>, HttpFailure> {
        self.server.handle_post(url_path(url), &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

/// Path component of `url`: everything from the first `/` after the host.
fn url_path(url: &str) -> &str {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    url[after_scheme..]
        .find('/')
        .map_or("/", |i| &url[after_scheme + i..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use recpatch_core::Fingerprint;

    struct TestClient {
        response: RwLock<Result<Vec<u8>, HttpFailure>>,
        healthy: AtomicBool,
        last_url: RwLock<Option<String>>,
    }

    impl TestClient {
        fn answering(response: Result<Vec<u8>, HttpFailure>) -> Self {
            Self {
                response: RwLock::new(response),
                healthy: AtomicBool::new(true),
                last_url: RwLock::new(None),
            }
        }
    }

    impl HttpClient for TestClient {
        fn post(&self, url: &str, _body: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>, HttpFailure> {
            *self.last_url.write() = Some(url.to_string());
            self.response.read().clone()
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn request() -> PatchRequest {
        PatchRequest::new("1.0", &Fingerprint::new("aa"))
    }

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn posts_to_base_plus_endpoint() {
        let body = PatchResponse::up_to_date("2.0").encode().unwrap();
        let transport = HttpTransport::new("https://patches.example.com/", TestClient::answering(Ok(body)));
        assert_eq!(transport.base_url(), "https://patches.example.com");

        let response = transport.request_patches("/patches", &request(), SECOND).unwrap();
        assert_eq!(response.target_version, "2.0");
        assert_eq!(
            transport.client().last_url.read().as_deref(),
            Some("https://patches.example.com/patches")
        );
    }

    #[test]
    fn failures_are_classified() {
        let timed_out = HttpTransport::new("http://h", TestClient::answering(Err(HttpFailure::TimedOut)));
        assert!(matches!(
            timed_out.request_patches("/p", &request(), SECOND),
            Err(SyncError::Timeout)
        ));
        assert!(timed_out.last_error().is_some());

        let not_found = HttpTransport::new("http://h", TestClient::answering(Err(HttpFailure::Status(404))));
        let err = not_found.request_patches("/p", &request(), SECOND).unwrap_err();
        assert!(!err.is_retryable());

        let unavailable = HttpTransport::new("http://h", TestClient::answering(Err(HttpFailure::Status(503))));
        let err = unavailable.request_patches("/p", &request(), SECOND).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn network_failure_disconnects() {
        let transport = HttpTransport::new(
            "http://h",
            TestClient::answering(Err(HttpFailure::Network("reset".into()))),
        );
        assert!(transport.request_patches("/p", &request(), SECOND).is_err());
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.request_patches("/p", &request(), SECOND),
            Err(SyncError::NotConnected)
        ));

        transport.reconnect();
        assert!(transport.is_connected());
    }

    #[test]
    fn garbage_body_is_protocol_error() {
        let transport = HttpTransport::new("http://h", TestClient::answering(Ok(b"<html>".to_vec())));
        assert!(matches!(
            transport.request_patches("/p", &request(), SECOND),
            Err(SyncError::Protocol(_))
        ));
    }

    #[test]
    fn unhealthy_client_is_not_connected() {
        let client = TestClient::answering(Ok(Vec::new()));
        client.healthy.store(false, Ordering::SeqCst);
        assert!(!HttpTransport::new("http://h", client).is_connected());
    }

    #[test]
    fn url_path_extraction() {
        assert_eq!(url_path("https://host:8080/v1/patches"), "/v1/patches");
        assert_eq!(url_path("loopback://patches"), "/");
        assert_eq!(url_path("/patches"), "/patches");
    }
}
