//! Transport abstraction for reaching a patch source.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use recpatch_sync_protocol::{PatchRequest, PatchResponse};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Sends a patch request to a remote source and returns its answer.
///
/// Implementations block until a response arrives, the timeout passes, or
/// the transport fails.
pub trait PatchTransport: Send + Sync {
    /// Posts `request` to `endpoint`.
    fn request_patches(
        &self,
        endpoint: &str,
        request: &PatchRequest,
        timeout: Duration,
    ) -> SyncResult<PatchResponse>;

    /// Checks if the transport is usable.
    fn is_connected(&self) -> bool;

    /// Closes the transport.
    fn close(&self) -> SyncResult<()>;
}

/// A scripted transport for tests.
///
/// Returns the configured response and records every request it sees.
/// `fail_next(n)` makes the next `n` requests fail with a retryable error.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    response: Mutex<Option<PatchResponse>>,
    failures: AtomicU32,
    requests: Mutex<Vec<(String, PatchRequest)>>,
}

impl MockTransport {
    /// Creates a connected mock with no response set.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            response: Mutex::new(None),
            failures: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock answering every request with `response`.
    pub fn responding(response: PatchResponse) -> Self {
        let mock = Self::new();
        mock.set_response(response);
        mock
    }

    /// Sets the response.
    pub fn set_response(&self, response: PatchResponse) {
        *self.response.lock() = Some(response);
    }

    /// Makes the next `count` requests fail.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Returns the requests received so far, with their endpoints.
    pub fn requests(&self) -> Vec<(String, PatchRequest)> {
        self.requests.lock().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchTransport for MockTransport {
    fn request_patches(
        &self,
        endpoint: &str,
        request: &PatchRequest,
        _timeout: Duration,
    ) -> SyncResult<PatchResponse> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.requests
            .lock()
            .push((endpoint.to_string(), request.clone()));

        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(SyncError::transport_retryable("simulated transport failure"));
        }

        self.response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock response set".into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) -> SyncResult<()> {
        self.set_connected(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recpatch_core::Fingerprint;

    fn request() -> PatchRequest {
        PatchRequest::new("1.0", &Fingerprint::new("aa"))
    }

    #[test]
    fn mock_records_requests() {
        let mock = MockTransport::responding(PatchResponse::up_to_date("1.0"));
        let response = mock
            .request_patches("/patches", &request(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(response, PatchResponse::up_to_date("1.0"));

        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/patches");
        assert_eq!(seen[0].1.fingerprint, "aa");
    }

    #[test]
    fn mock_scripted_failures() {
        let mock = MockTransport::responding(PatchResponse::up_to_date("1.0"));
        mock.fail_next(1);
        let err = mock
            .request_patches("/patches", &request(), Duration::from_secs(1))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(mock
            .request_patches("/patches", &request(), Duration::from_secs(1))
            .is_ok());
    }

    #[test]
    fn closed_mock_refuses() {
        let mock = MockTransport::new();
        mock.close().unwrap();
        assert!(matches!(
            mock.request_patches("/patches", &request(), Duration::from_secs(1)),
            Err(SyncError::NotConnected)
        ));
    }

    #[test]
    fn missing_response_is_protocol_error() {
        let mock = MockTransport::new();
        assert!(matches!(
            mock.request_patches("/patches", &request(), Duration::from_secs(1)),
            Err(SyncError::Protocol(_))
        ));
    }
}
