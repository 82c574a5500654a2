//! Engine configuration.

use crate::snapshot::SnapshotOptions;

/// Configuration for a [`PatchEngine`](crate::PatchEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Revert automatically on any apply or verification failure.
    pub safe_mode: bool,

    /// Require exact description matches when resolving targets.
    pub strict_target_resolution: bool,

    /// Refuse patch sets whose required fingerprint differs from the
    /// store's current fingerprint.
    pub verify_required_fingerprint: bool,

    /// Options used by snapshots taken without explicit options.
    pub snapshot_options: SnapshotOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            strict_target_resolution: true,
            verify_required_fingerprint: true,
            snapshot_options: SnapshotOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets safe mode.
    #[must_use]
    pub const fn safe_mode(mut self, value: bool) -> Self {
        self.safe_mode = value;
        self
    }

    /// Sets strict target resolution.
    #[must_use]
    pub const fn strict_target_resolution(mut self, value: bool) -> Self {
        self.strict_target_resolution = value;
        self
    }

    /// Sets whether the required fingerprint is checked before applying.
    #[must_use]
    pub const fn verify_required_fingerprint(mut self, value: bool) -> Self {
        self.verify_required_fingerprint = value;
        self
    }

    /// Sets the default snapshot options.
    #[must_use]
    pub const fn snapshot_options(mut self, options: SnapshotOptions) -> Self {
        self.snapshot_options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert!(config.safe_mode);
        assert!(config.strict_target_resolution);
        assert!(config.verify_required_fingerprint);
        assert!(config.snapshot_options.include_scripts);
        assert!(!config.snapshot_options.include_values);
    }

    #[test]
    fn builder_pattern() {
        let config = EngineConfig::new()
            .safe_mode(false)
            .strict_target_resolution(false)
            .snapshot_options(SnapshotOptions::all());

        assert!(!config.safe_mode);
        assert!(!config.strict_target_resolution);
        assert!(config.snapshot_options.include_values);
    }
}
