//! Server configuration.

/// Path patch requests are accepted on.
pub const PATCHES_PATH: &str = "/patches";

/// Configuration for the patch source.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Version reported when the client is already current.
    pub latest_version: String,
    /// Answer `hash-mismatch` for fingerprints no release knows about.
    /// When false such clients are told they are up to date.
    pub reject_unknown_fingerprints: bool,
}

impl ServerConfig {
    /// Creates a configuration reporting `latest_version`.
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self {
            latest_version: latest_version.into(),
            reject_unknown_fingerprints: true,
        }
    }

    /// Sets whether unknown fingerprints are rejected.
    pub fn with_reject_unknown(mut self, reject: bool) -> Self {
        self.reject_unknown_fingerprints = reject;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0")
    }
}
