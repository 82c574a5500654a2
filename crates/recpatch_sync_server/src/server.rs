//! The patch source.

use crate::catalog::{Release, ReleaseCatalog};
use crate::config::{ServerConfig, PATCHES_PATH};
use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use recpatch_sync_protocol::{PatchRequest, PatchResponse};
use std::sync::atomic::{AtomicU64, Ordering};

/// Answers patch requests from a [`ReleaseCatalog`].
///
/// A fingerprint some release starts from gets that release (`ok`). One
/// that only ends a release, or any fingerprint while the catalog is empty,
/// is `up-to-date`. Anything else is `hash-mismatch`, unless unknown
/// fingerprints are configured to count as current.
///
/// ```
/// use recpatch_sync_server::{PatchServer, ServerConfig};
/// use recpatch_sync_protocol::{PatchRequest, ResponseStatus};
/// use recpatch_core::Fingerprint;
///
/// let server = PatchServer::new(ServerConfig::new("1.0"));
/// let response = server.handle_request(&PatchRequest::new("1.0", &Fingerprint::new("ab")));
/// assert_eq!(response.status, ResponseStatus::UpToDate);
/// ```
pub struct PatchServer {
    config: ServerConfig,
    catalog: RwLock<ReleaseCatalog>,
    served: AtomicU64,
}

impl PatchServer {
    /// Creates a server with an empty catalog.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_catalog(config, ReleaseCatalog::new())
    }

    /// Creates a server over an existing catalog.
    pub fn with_catalog(config: ServerConfig, catalog: ReleaseCatalog) -> Self {
        Self {
            config,
            catalog: RwLock::new(catalog),
            served: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Publishes a release.
    pub fn publish(&self, release: Release) -> ServerResult<()> {
        self.catalog.write().publish(release)
    }

    /// Returns the number of published releases.
    pub fn release_count(&self) -> usize {
        self.catalog.read().len()
    }

    /// Returns the number of requests answered.
    pub fn requests_served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    /// Answers a patch request.
    pub fn handle_request(&self, request: &PatchRequest) -> PatchResponse {
        self.served.fetch_add(1, Ordering::SeqCst);
        let catalog = self.catalog.read();
        let fingerprint = request.fingerprint.as_str();

        if let Some(release) = catalog.lookup(fingerprint) {
            tracing::info!(
                client_version = %request.client_version,
                version = %release.version(),
                patches = release.patch_set().len(),
                "serving release"
            );
            return PatchResponse::from_patch_set(release.version(), release.patch_set());
        }

        let known = catalog.is_empty() || catalog.is_release_target(fingerprint);
        if known || !self.config.reject_unknown_fingerprints {
            tracing::debug!(fingerprint, "client up to date");
            PatchResponse::up_to_date(self.config.latest_version.clone())
        } else {
            tracing::warn!(
                fingerprint,
                client_version = %request.client_version,
                "unknown client fingerprint"
            );
            PatchResponse::hash_mismatch(self.config.latest_version.clone())
        }
    }

    /// Handles a POST carrying a JSON [`PatchRequest`].
    pub fn handle_post(&self, path: &str, body: &[u8]) -> ServerResult<Vec<u8>> {
        if path != PATCHES_PATH {
            return Err(ServerError::NotFound(path.to_string()));
        }
        let request = PatchRequest::decode(body)?;
        Ok(self.handle_request(&request).encode()?)
    }
}
