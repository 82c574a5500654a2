//! Sync client state machine.

use crate::config::SyncConfig;
use crate::confirm::ConfirmationPrompt;
use crate::error::{SyncError, SyncResult};
use crate::transport::PatchTransport;
use parking_lot::RwLock;
use recpatch_core::{ApplyReport, ErrorKind, Fingerprint, PatchEngine, PatchSetStatus, RecordStore};
use recpatch_sync_protocol::{PatchRequest, PatchResponse};
use std::sync::Arc;
use std::time::Instant;

/// Where the client is in a sync cycle.
///
/// `Idle -> Requesting -> {UpToDate, HashMismatch, ApplyReady} -> Applying
/// -> {Verified, RevertedOnMismatch, RevertedOnFailure} -> Idle`. Failures
/// outside an apply end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No cycle running.
    Idle,
    /// Waiting for the patch source.
    Requesting,
    /// The source had nothing newer.
    UpToDate,
    /// The source did not recognise the local fingerprint.
    HashMismatch,
    /// A non-empty patch set is waiting for confirmation.
    ApplyReady,
    /// The patch set is being applied.
    Applying,
    /// Applied and the new fingerprint matched.
    Verified,
    /// Every patch applied but the fingerprint did not match; reverted.
    RevertedOnMismatch,
    /// A patch failed; reverted.
    RevertedOnFailure,
    /// The cycle ended with an error and nothing was reverted.
    Failed,
}

impl SyncState {
    /// Returns true while a cycle is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Requesting | SyncState::ApplyReady | SyncState::Applying
        )
    }

    /// Returns true for states that end a cycle.
    pub fn is_terminal(&self) -> bool {
        !self.is_active() && *self != SyncState::Idle
    }
}

/// Counters over the client's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles that found nothing to apply.
    pub up_to_date: u64,
    /// Cycles refused because the source did not recognise the local state.
    pub hash_mismatches: u64,
    /// Cycles that applied and verified a patch set.
    pub applied: u64,
    /// Patches written across all verified cycles.
    pub patches_applied: u64,
    /// Cycles whose apply was reverted.
    pub reverts: u64,
    /// Cycles declined at the confirmation gate.
    pub declined: u64,
    /// Request retries.
    pub retries: u64,
    /// Time the last cycle ended.
    pub last_sync_time: Option<Instant>,
    /// Error that ended the last cycle, if any.
    pub last_error: Option<String>,
}

/// Successful end of a sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to apply.
    UpToDate {
        /// Version reported by the source.
        target_version: String,
    },
    /// A patch set was applied and verified.
    Applied {
        /// Version the store now matches.
        target_version: String,
        /// Transaction report.
        report: ApplyReport,
    },
}

/// Fetches patch sets from a remote source and applies them.
///
/// The client holds no record state; the engine and the store are passed
/// to every cycle.
pub struct SyncClient<T: PatchTransport> {
    config: SyncConfig,
    transport: Arc<T>,
    state: RwLock<SyncState>,
    last_terminal: RwLock<Option<SyncState>>,
    stats: RwLock<SyncStats>,
}

impl<T: PatchTransport> SyncClient<T> {
    /// Creates a client.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// Creates a client over a transport shared with other owners.
    pub fn with_shared_transport(config: SyncConfig, transport: Arc<T>) -> Self {
        Self {
            config,
            transport,
            state: RwLock::new(SyncState::Idle),
            last_terminal: RwLock::new(None),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the state the last cycle ended in.
    pub fn last_terminal_state(&self) -> Option<SyncState> {
        *self.last_terminal.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: SyncState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        tracing::debug!(from = ?previous, to = ?state, "sync state");
    }

    /// Runs one sync cycle.
    ///
    /// Sends the store's fingerprint, and if the source answers `ok` with
    /// patches, asks `prompt` (unless confirmation is disabled) and applies
    /// them through `engine`, verifying the response's new fingerprint.
    /// Every error except [`SyncError::Apply`] is raised before any record
    /// is touched.
    pub fn start<S, P>(
        &self,
        engine: &mut PatchEngine,
        store: &mut S,
        prompt: &P,
    ) -> SyncResult<SyncOutcome>
    where
        S: RecordStore + ?Sized,
        P: ConfirmationPrompt + ?Sized,
    {
        self.stats.write().cycles += 1;
        let result = self.run_cycle(engine, store, prompt);
        self.finish(&result);
        result
    }

    fn run_cycle<S, P>(
        &self,
        engine: &mut PatchEngine,
        store: &mut S,
        prompt: &P,
    ) -> SyncResult<SyncOutcome>
    where
        S: RecordStore + ?Sized,
        P: ConfirmationPrompt + ?Sized,
    {
        let local = engine.fingerprint(store)?;
        self.set_state(SyncState::Requesting);

        let request = PatchRequest::new(self.config.client_version.clone(), &local);
        let response = self.request_with_retry(&request)?;
        tracing::info!(
            status = %response.status,
            target_version = %response.target_version,
            patches = response.patches.len(),
            "patch source answered"
        );

        match &response.status {
            PatchSetStatus::Ok => {}
            PatchSetStatus::UpToDate => {
                return Ok(SyncOutcome::UpToDate {
                    target_version: response.target_version,
                })
            }
            PatchSetStatus::HashMismatch => return Err(hash_mismatch(&local, None)),
            PatchSetStatus::Other(status) => return Err(SyncError::UnexpectedStatus(status.clone())),
        }

        self.apply_response(engine, store, prompt, &local, response)
    }

    fn apply_response<S, P>(
        &self,
        engine: &mut PatchEngine,
        store: &mut S,
        prompt: &P,
        local: &Fingerprint,
        response: PatchResponse,
    ) -> SyncResult<SyncOutcome>
    where
        S: RecordStore + ?Sized,
        P: ConfirmationPrompt + ?Sized,
    {
        let set = response.to_patch_set()?;
        let already_applied = set
            .new_fingerprint
            .as_ref()
            .is_some_and(|new| local.matches(new.as_str()));
        if already_applied {
            tracing::info!(target_version = %response.target_version, "store already at the new fingerprint");
            return Ok(SyncOutcome::UpToDate {
                target_version: response.target_version,
            });
        }
        if let Some(required) = &set.required_fingerprint {
            if !local.matches(required.as_str()) {
                return Err(hash_mismatch(local, Some(required)));
            }
        }
        if set.is_empty() {
            return Ok(SyncOutcome::UpToDate {
                target_version: response.target_version,
            });
        }

        self.set_state(SyncState::ApplyReady);
        if self.config.require_confirmation {
            let message = format!(
                "Apply {} patch(es) to update to version {}?",
                set.len(),
                response.target_version
            );
            if !prompt.confirm(&message) {
                tracing::info!(target_version = %response.target_version, "patch set declined");
                return Err(SyncError::UserDeclined);
            }
        }

        self.set_state(SyncState::Applying);
        let report = engine.apply_patch_set(store, &set)?;
        Ok(SyncOutcome::Applied {
            target_version: response.target_version,
            report,
        })
    }

    /// Sends the request, retrying transient failures.
    fn request_with_retry(&self, request: &PatchRequest) -> SyncResult<PatchResponse> {
        let retry = &self.config.retry;
        let attempts = retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                std::thread::sleep(retry.delay_for_attempt(attempt));
                self.stats.write().retries += 1;
            }

            match self
                .transport
                .request_patches(&self.config.endpoint, request, self.config.timeout)
            {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    tracing::warn!(attempt, error = %e, "patch request failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn finish(&self, result: &SyncResult<SyncOutcome>) {
        let terminal = terminal_state(result);
        self.set_state(terminal);
        {
            let mut stats = self.stats.write();
            match result {
                Ok(SyncOutcome::UpToDate { .. }) => stats.up_to_date += 1,
                Ok(SyncOutcome::Applied { report, .. }) => {
                    stats.applied += 1;
                    stats.patches_applied += report.applied as u64;
                }
                Err(SyncError::HashMismatch { .. }) => stats.hash_mismatches += 1,
                Err(SyncError::UserDeclined) => stats.declined += 1,
                Err(_) => {}
            }
            if matches!(
                terminal,
                SyncState::RevertedOnFailure | SyncState::RevertedOnMismatch
            ) {
                stats.reverts += 1;
            }
            stats.last_error = result.as_ref().err().map(ToString::to_string);
            stats.last_sync_time = Some(Instant::now());
        }
        *self.last_terminal.write() = Some(terminal);
        self.set_state(SyncState::Idle);
    }
}

fn hash_mismatch(local: &Fingerprint, required: Option<&Fingerprint>) -> SyncError {
    tracing::warn!(
        local = %local,
        required = required.map(Fingerprint::as_str).unwrap_or("-"),
        "patch source does not recognise the local state"
    );
    SyncError::HashMismatch {
        local: local.to_string(),
        required: required.map(ToString::to_string),
    }
}

fn terminal_state(result: &SyncResult<SyncOutcome>) -> SyncState {
    match result {
        Ok(SyncOutcome::UpToDate { .. }) => SyncState::UpToDate,
        Ok(SyncOutcome::Applied { .. }) => SyncState::Verified,
        Err(SyncError::HashMismatch { .. }) => SyncState::HashMismatch,
        Err(SyncError::Apply(err)) if err.reverted => {
            if err.position.is_none() && err.kind() == ErrorKind::Verification {
                SyncState::RevertedOnMismatch
            } else {
                SyncState::RevertedOnFailure
            }
        }
        Err(_) => SyncState::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::confirm::{AlwaysConfirm, AlwaysDecline};
    use crate::transport::MockTransport;
    use recpatch_core::{build_fingerprint, MemoryRecordStore, Patch, PatchSet, Record, TargetSpec};
    use std::cell::Cell;
    use std::time::Duration;

    fn store() -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        store.insert(Record::new("Health")).unwrap();
        store.insert(Record::new("Ammo")).unwrap();
        store
    }

    fn config() -> SyncConfig {
        SyncConfig::new("1.0").with_retry(RetryConfig::new(3).with_initial_delay(Duration::ZERO))
    }

    fn ok_response(store: &MemoryRecordStore, patches: Vec<Patch>, new_hash: Option<&str>) -> PatchResponse {
        let mut copy = store.clone();
        let set = PatchSet::new(patches).with_required(build_fingerprint(store).unwrap());
        let expected = match new_hash {
            Some(hash) => Fingerprint::new(hash),
            None => {
                PatchEngine::default().apply_patch_set(&mut copy, &set).unwrap();
                build_fingerprint(&copy).unwrap()
            }
        };
        PatchResponse::from_patch_set("2.0", &set.with_expected(expected))
    }

    #[test]
    fn state_predicates() {
        assert!(SyncState::Requesting.is_active());
        assert!(!SyncState::Idle.is_terminal());
        assert!(SyncState::Verified.is_terminal());
        assert!(SyncState::Failed.is_terminal());
    }

    #[test]
    fn up_to_date_is_a_no_op() {
        let mut store = store();
        let before = build_fingerprint(&store).unwrap();
        let client = SyncClient::new(config(), MockTransport::responding(PatchResponse::up_to_date("1.0")));

        let outcome = client.start(&mut PatchEngine::default(), &mut store, &AlwaysDecline).unwrap();
        assert_eq!(outcome, SyncOutcome::UpToDate { target_version: "1.0".into() });
        assert_eq!(build_fingerprint(&store).unwrap(), before);
        assert_eq!(client.state(), SyncState::Idle);
        assert_eq!(client.last_terminal_state(), Some(SyncState::UpToDate));

        let sent = client.transport().requests();
        assert_eq!(sent[0].0, "/patches");
        assert_eq!(sent[0].1.client_version, "1.0");
        assert_eq!(sent[0].1.fingerprint, before.to_string());
    }

    #[test]
    fn hash_mismatch_skips_the_prompt() {
        let mut store = store();
        let before = build_fingerprint(&store).unwrap();
        let client = SyncClient::new(config(), MockTransport::responding(PatchResponse::hash_mismatch("2.0")));
        let asked = Cell::new(false);
        let prompt = |_: &str| {
            asked.set(true);
            true
        };

        let err = client.start(&mut PatchEngine::default(), &mut store, &prompt).unwrap_err();
        assert!(matches!(err, SyncError::HashMismatch { required: None, .. }));
        assert!(!asked.get());
        assert_eq!(build_fingerprint(&store).unwrap(), before);
        assert_eq!(client.last_terminal_state(), Some(SyncState::HashMismatch));
        assert_eq!(client.stats().hash_mismatches, 1);
    }

    #[test]
    fn foreign_required_hash_is_a_mismatch() {
        let mut store = store();
        let mut response = ok_response(
            &store,
            vec![Patch::set("1", TargetSpec::by_index(0), "Active", true)],
            None,
        );
        response.required_hash = "00".repeat(32);
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, SyncError::HashMismatch { required: Some(_), .. }));
        assert!(!store.get_by_index(0).unwrap().active);
    }

    #[test]
    fn ok_applies_after_confirmation() {
        let mut store = store();
        let response = ok_response(
            &store,
            vec![Patch::set("1", TargetSpec::by_description("Ammo"), "Address", "game.exe+40")],
            None,
        );
        let client = SyncClient::new(config(), MockTransport::responding(response.clone()));
        let message = std::cell::RefCell::new(String::new());
        let prompt = |m: &str| {
            *message.borrow_mut() = m.to_string();
            true
        };

        let outcome = client.start(&mut PatchEngine::default(), &mut store, &prompt).unwrap();
        match outcome {
            SyncOutcome::Applied { target_version, report } => {
                assert_eq!(target_version, "2.0");
                assert_eq!(report.applied, 1);
                assert_eq!(report.fingerprint.as_str(), response.new_hash);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(message.borrow().contains("1 patch"));
        assert_eq!(store.get_by_index(1).unwrap().address, "game.exe+40");
        assert_eq!(client.last_terminal_state(), Some(SyncState::Verified));
        assert_eq!(client.stats().patches_applied, 1);
    }

    #[test]
    fn already_applied_set_is_up_to_date() {
        let mut store = store();
        let response = ok_response(
            &store,
            vec![Patch::set("1", TargetSpec::by_description("Ammo"), "Address", "game.exe+40")],
            None,
        );
        let client = SyncClient::new(config(), MockTransport::responding(response));
        let mut engine = PatchEngine::default();

        client.start(&mut engine, &mut store, &AlwaysConfirm).unwrap();
        let after = build_fingerprint(&store).unwrap();

        let outcome = client.start(&mut engine, &mut store, &AlwaysDecline).unwrap();
        assert_eq!(outcome, SyncOutcome::UpToDate { target_version: "2.0".into() });
        assert_eq!(build_fingerprint(&store).unwrap(), after);
        assert_eq!(client.last_terminal_state(), Some(SyncState::UpToDate));
        assert_eq!(client.stats().hash_mismatches, 0);
    }

    #[test]
    fn declined_prompt_mutates_nothing() {
        let mut store = store();
        let before = build_fingerprint(&store).unwrap();
        let response = ok_response(&store, vec![Patch::set("1", TargetSpec::by_index(0), "Color", 255)], None);
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysDecline).unwrap_err();
        assert!(matches!(err, SyncError::UserDeclined));
        assert!(err.is_pre_mutation());
        assert_eq!(build_fingerprint(&store).unwrap(), before);
        assert_eq!(client.stats().declined, 1);
    }

    #[test]
    fn confirmation_can_be_disabled() {
        let mut store = store();
        let response = ok_response(&store, vec![Patch::set("1", TargetSpec::by_index(0), "Color", 255)], None);
        let client = SyncClient::new(
            config().with_confirmation(false),
            MockTransport::responding(response),
        );

        client.start(&mut PatchEngine::default(), &mut store, &AlwaysDecline).unwrap();
        assert_eq!(store.get_by_index(0).unwrap().color, 255);
    }

    #[test]
    fn new_hash_mismatch_reverts() {
        let mut store = store();
        let before = build_fingerprint(&store).unwrap();
        let response = ok_response(
            &store,
            vec![Patch::set("1", TargetSpec::by_index(0), "Active", true)],
            Some("ffff"),
        );
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, SyncError::Apply(ref e) if e.reverted));
        assert_eq!(build_fingerprint(&store).unwrap(), before);
        assert_eq!(client.last_terminal_state(), Some(SyncState::RevertedOnMismatch));
        assert_eq!(client.stats().reverts, 1);
    }

    #[test]
    fn failing_patch_reverts() {
        let mut store = store();
        let before = build_fingerprint(&store).unwrap();
        let response = ok_response(
            &store,
            vec![
                Patch::set("1", TargetSpec::by_index(0), "Active", true),
                Patch::set("2", TargetSpec::by_index(9), "Active", true),
            ],
            Some("ffff"),
        );
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, SyncError::Apply(ref e) if e.position == Some(1)));
        assert_eq!(build_fingerprint(&store).unwrap(), before);
        assert_eq!(client.last_terminal_state(), Some(SyncState::RevertedOnFailure));
    }

    #[test]
    fn transient_failures_are_retried() {
        let mut store = store();
        let transport = MockTransport::responding(PatchResponse::up_to_date("1.0"));
        transport.fail_next(2);
        let client = SyncClient::new(config(), transport);

        client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap();
        assert_eq!(client.stats().retries, 2);
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[test]
    fn retries_give_up() {
        let mut store = store();
        let transport = MockTransport::responding(PatchResponse::up_to_date("1.0"));
        transport.fail_next(5);
        let client = SyncClient::new(config(), transport);

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
        assert_eq!(client.transport().requests().len(), 3);
        assert_eq!(client.last_terminal_state(), Some(SyncState::Failed));
        assert!(client.stats().last_error.is_some());
    }

    #[test]
    fn unknown_status_is_reported() {
        let mut store = store();
        let mut response = PatchResponse::up_to_date("1.0");
        response.status = PatchSetStatus::Other("maintenance".into());
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let err = client.start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, SyncError::UnexpectedStatus(ref s) if s == "maintenance"));
    }

    #[test]
    fn empty_ok_is_up_to_date() {
        let mut store = store();
        let response = ok_response(&store, Vec::new(), None);
        let client = SyncClient::new(config(), MockTransport::responding(response));

        let outcome = client.start(&mut PatchEngine::default(), &mut store, &AlwaysDecline).unwrap();
        assert!(matches!(outcome, SyncOutcome::UpToDate { .. }));
    }
}
