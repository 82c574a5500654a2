//! The patch engine context.

use crate::config::EngineConfig;
use crate::diff::generate_patch_set;
use crate::error::{CoreError, CoreResult};
use crate::fingerprint::{build_fingerprint, Fingerprint};
use crate::patch::{Patch, PatchSet};
use crate::record::RecordStore;
use crate::resolver::TargetResolver;
use crate::snapshot::{Snapshot, SnapshotOptions, SnapshotStore};
use crate::transaction::{restore_all, Applier, ApplyError, ApplyReport, RevertReport, RollbackLog};

/// Snapshots, the rollback log and configuration for one record store.
///
/// The engine does not own the store; every operation takes it as an
/// argument. Exactly one apply transaction is open at a time: starting an
/// apply discards whatever the previous one captured.
///
/// ```
/// use recpatch_core::{MemoryRecordStore, PatchEngine, RecordStore};
///
/// let mut store = MemoryRecordStore::new();
/// let id = store.create("X").unwrap();
/// let mut engine = PatchEngine::default();
///
/// engine.take_snapshot("v1", &store).unwrap();
/// store.record_mut(id).unwrap().description = "Y".into();
///
/// let set = engine.generate_patch_from_snapshot("v1", &store).unwrap();
/// assert_eq!(set.patches.len(), 1);
/// assert_eq!(set.patches[0].path, "Description");
/// ```
#[derive(Debug, Default)]
pub struct PatchEngine {
    config: EngineConfig,
    snapshots: SnapshotStore,
    rollback: RollbackLog,
    pre_apply: Option<Fingerprint>,
}

impl PatchEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Computes the store's current fingerprint.
    pub fn fingerprint<S: RecordStore + ?Sized>(&self, store: &S) -> CoreResult<Fingerprint> {
        build_fingerprint(store)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures the store under `name` with the configured default options.
    pub fn take_snapshot<S: RecordStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
    ) -> CoreResult<Fingerprint> {
        self.take_snapshot_with(name, store, self.config.snapshot_options)
    }

    /// Captures the store under `name`. Retaking a name overwrites it.
    pub fn take_snapshot_with<S: RecordStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
        options: SnapshotOptions,
    ) -> CoreResult<Fingerprint> {
        self.snapshots.take(name, store, options)
    }

    /// Returns a snapshot by name.
    pub fn get_snapshot(&self, name: &str) -> CoreResult<&Snapshot> {
        self.snapshots.get(name)
    }

    /// Returns snapshot names in sorted order.
    pub fn list_snapshots(&self) -> Vec<String> {
        self.snapshots.names()
    }

    /// Removes a snapshot. Returns true if it existed.
    pub fn remove_snapshot(&mut self, name: &str) -> bool {
        self.snapshots.remove(name)
    }

    /// Diffs a snapshot against the store's current state.
    pub fn generate_patch_from_snapshot<S: RecordStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> CoreResult<PatchSet> {
        generate_patch_set(self.snapshots.get(name)?, store)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Applies a patch set as one transaction.
    ///
    /// With `verify_required_fingerprint` set, a set whose required
    /// fingerprint differs from the store's is refused before anything is
    /// written, unless the store is already at the set's new fingerprint;
    /// reapplying then skips every patch. A set carrying a new fingerprint
    /// is verified after the last patch.
    pub fn apply_patch_set<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        set: &PatchSet,
    ) -> Result<ApplyReport, ApplyError> {
        if self.config.verify_required_fingerprint {
            if let Some(required) = &set.required_fingerprint {
                let current = self
                    .fingerprint(store)
                    .map_err(|e| ApplyError::transaction(e, false))?;
                let already_applied = set
                    .new_fingerprint
                    .as_ref()
                    .is_some_and(|new| current.matches(new.as_str()));
                if already_applied {
                    tracing::debug!(fingerprint = %current, "store already at the set's new fingerprint");
                } else if !current.matches(required.as_str()) {
                    tracing::warn!(required = %required, current = %current, "required fingerprint mismatch");
                    return Err(ApplyError::transaction(
                        CoreError::verification(required.as_str(), current.as_str()),
                        false,
                    ));
                }
            }
        }
        self.apply_patches(store, &set.patches, set.new_fingerprint.as_ref())
    }

    /// Applies patches in order as one transaction.
    ///
    /// The first failing patch stops the transaction; later patches are
    /// never attempted. In safe mode every field touched so far is then
    /// restored. If `expected` is given and the resulting fingerprint
    /// differs, the transaction fails the same way.
    ///
    /// After success the rollback log is kept, so [`PatchEngine::revert_all`]
    /// can still undo the transaction until [`PatchEngine::commit`] or the
    /// next apply.
    pub fn apply_patches<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        patches: &[Patch],
        expected: Option<&Fingerprint>,
    ) -> Result<ApplyReport, ApplyError> {
        let before = self
            .fingerprint(store)
            .map_err(|e| ApplyError::transaction(e, false))?;
        self.rollback.clear();
        self.pre_apply = Some(before);

        tracing::info!(patches = patches.len(), "apply transaction started");
        let applier = Applier::new(TargetResolver::new(self.config.strict_target_resolution));
        let mut applied = 0;
        let mut skipped = 0;

        for (position, patch) in patches.iter().enumerate() {
            match applier.apply(store, &mut self.rollback, patch) {
                Ok(true) => applied += 1,
                Ok(false) => skipped += 1,
                Err(source) => {
                    tracing::warn!(patch = %patch.id, position, error = %source, "patch failed");
                    let reverted = self.abort(store);
                    return Err(ApplyError::at_patch(position, patch, source, reverted));
                }
            }
        }

        let after = match self.fingerprint(store) {
            Ok(fp) => fp,
            Err(source) => {
                let reverted = self.abort(store);
                return Err(ApplyError::transaction(source, reverted));
            }
        };
        if let Some(expected) = expected {
            if !after.matches(expected.as_str()) {
                tracing::warn!(expected = %expected, actual = %after, "post-apply fingerprint mismatch");
                let reverted = self.abort(store);
                return Err(ApplyError::transaction(
                    CoreError::verification(expected.as_str(), after.as_str()),
                    reverted,
                ));
            }
        }

        tracing::info!(applied, skipped, fingerprint = %after, "apply transaction finished");
        Ok(ApplyReport {
            applied,
            skipped,
            touched_fields: self.rollback.len(),
            fingerprint: after,
        })
    }

    fn abort<S: RecordStore + ?Sized>(&mut self, store: &mut S) -> bool {
        if !self.config.safe_mode {
            tracing::warn!(
                touched = self.rollback.len(),
                "safe mode disabled, store left partially patched"
            );
            return false;
        }
        match self.revert_all(store) {
            Ok(report) => report.matches_pre_apply.unwrap_or(true),
            Err(e) => {
                tracing::error!(error = %e, "revert failed");
                false
            }
        }
    }

    /// Restores every field captured by the current transaction and clears
    /// the transaction bookkeeping.
    pub fn revert_all<S: RecordStore + ?Sized>(&mut self, store: &mut S) -> CoreResult<RevertReport> {
        let pre_apply = self.pre_apply.take();
        let restored = restore_all(store, &mut self.rollback)?;
        let fingerprint = build_fingerprint(store)?;
        let matches_pre_apply = pre_apply.as_ref().map(|fp| *fp == fingerprint);

        if matches_pre_apply == Some(false) {
            tracing::warn!(restored, fingerprint = %fingerprint, "revert did not reach pre-apply fingerprint");
        } else {
            tracing::info!(restored, "transaction reverted");
        }
        Ok(RevertReport {
            restored,
            fingerprint,
            matches_pre_apply,
        })
    }

    /// Accepts the current transaction: the rollback log is dropped without
    /// restoring anything. Returns the number of entries dropped.
    pub fn commit(&mut self) -> usize {
        let dropped = self.rollback.len();
        self.rollback.clear();
        self.pre_apply = None;
        dropped
    }

    /// Drops every snapshot and the current transaction.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.rollback.clear();
        self.pre_apply = None;
    }

    /// Returns the current rollback log.
    pub fn rollback_log(&self) -> &RollbackLog {
        &self.rollback
    }

    /// Returns the fingerprint taken when the current transaction began.
    pub fn pre_apply_fingerprint(&self) -> Option<&Fingerprint> {
        self.pre_apply.as_ref()
    }
}
