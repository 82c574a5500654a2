//! Client against the reference patch source.

use recpatch_core::{
    build_fingerprint, generate_patch_set, MemoryRecordStore, Patch, PatchEngine, PatchSet,
    Record, RecordStore, SnapshotOptions, Snapshot, TargetSpec,
};
use recpatch_sync_engine::{
    AlwaysConfirm, AlwaysDecline, HttpFailure, HttpTransport, LoopbackClient, LoopbackServer,
    PatchTransport, RetryConfig, SyncClient, SyncConfig, SyncError, SyncOutcome, SyncResult,
    SyncState,
};
use recpatch_sync_protocol::{PatchRequest, PatchResponse};
use recpatch_sync_server::{PatchServer, Release, ServerConfig};
use std::sync::Arc;
use std::time::Duration;

/// Hands requests straight to a shared server.
struct InMemoryTransport {
    server: Arc<PatchServer>,
}

impl PatchTransport for InMemoryTransport {
    fn request_patches(
        &self,
        _endpoint: &str,
        request: &PatchRequest,
        _timeout: Duration,
    ) -> SyncResult<PatchResponse> {
        Ok(self.server.handle_request(request))
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn close(&self) -> SyncResult<()> {
        Ok(())
    }
}

/// Routes loopback posts into the server, mapping errors to HTTP statuses.
struct ServerLoopback(Arc<PatchServer>);

impl LoopbackServer for ServerLoopback {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, HttpFailure> {
        self.0
            .handle_post(path, body)
            .map_err(|e| HttpFailure::Status(e.status_code()))
    }
}

fn base_store() -> MemoryRecordStore {
    let mut store = MemoryRecordStore::new();
    let group = store.insert(Record::new("Player")).unwrap();
    store
        .insert_child(group, Record::new("Health").with_address("game.exe+100"))
        .unwrap();
    store
        .insert_child(group, Record::new("Ammo").with_offsets(vec![0x10]))
        .unwrap();
    store
}

/// Authors a release by editing a copy of `store` and diffing.
fn author_release(
    version: &str,
    store: &MemoryRecordStore,
    edit: impl FnOnce(&mut MemoryRecordStore),
) -> (Release, MemoryRecordStore) {
    let snapshot = Snapshot::capture("base", store, SnapshotOptions::all()).unwrap();
    let mut edited = store.clone();
    edit(&mut edited);
    let set = generate_patch_set(&snapshot, &edited).unwrap();
    (Release::new(version, set).unwrap(), edited)
}

fn config() -> SyncConfig {
    SyncConfig::new("1.0").with_retry(RetryConfig::no_retry())
}

#[test]
fn client_walks_a_release_chain() {
    let mut store = base_store();
    let (first, v2) = author_release("2.0", &store, |s| {
        let id = s.get_by_description("Health", true).unwrap().id;
        s.record_mut(id).unwrap().address = "game.exe+180".into();
    });
    let (second, v3) = author_release("3.0", &v2, |s| {
        let id = s.get_by_description("Ammo", true).unwrap().id;
        s.record_mut(id).unwrap().offsets = vec![0x10, 0x4];
    });

    let server = Arc::new(PatchServer::new(ServerConfig::new("3.0")));
    server.publish(first).unwrap();
    server.publish(second).unwrap();

    let client = SyncClient::new(config(), InMemoryTransport { server: Arc::clone(&server) });
    let mut engine = PatchEngine::default();

    let outcome = client.start(&mut engine, &mut store, &AlwaysConfirm).unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied { ref target_version, .. } if target_version == "2.0"));
    assert_eq!(build_fingerprint(&store).unwrap(), build_fingerprint(&v2).unwrap());

    let outcome = client.start(&mut engine, &mut store, &AlwaysConfirm).unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied { ref target_version, .. } if target_version == "3.0"));
    assert_eq!(build_fingerprint(&store).unwrap(), build_fingerprint(&v3).unwrap());

    let outcome = client.start(&mut engine, &mut store, &AlwaysConfirm).unwrap();
    assert_eq!(outcome, SyncOutcome::UpToDate { target_version: "3.0".into() });

    assert_eq!(server.requests_served(), 3);
    assert_eq!(client.stats().applied, 2);
    assert_eq!(client.stats().up_to_date, 1);
}

#[test]
fn loopback_http_round_trip() {
    let mut store = base_store();
    let (release, patched) = author_release("2.0", &store, |s| {
        let id = s.get_by_description("Player", true).unwrap().id;
        s.record_mut(id).unwrap().active = true;
    });
    let server = Arc::new(PatchServer::new(ServerConfig::new("2.0")));
    server.publish(release).unwrap();

    let transport = HttpTransport::new(
        "loopback://patches.local",
        LoopbackClient::new(ServerLoopback(Arc::clone(&server))),
    );
    let client = SyncClient::new(config(), transport);

    client
        .start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm)
        .unwrap();
    assert_eq!(store.get_by_index(0), patched.get_by_index(0));
    assert_eq!(client.last_terminal_state(), Some(SyncState::Verified));
}

#[test]
fn wrong_endpoint_is_a_fatal_transport_error() {
    let mut store = base_store();
    let server = Arc::new(PatchServer::new(ServerConfig::new("2.0")));
    let transport = HttpTransport::new(
        "loopback://patches.local",
        LoopbackClient::new(ServerLoopback(server)),
    );
    let client = SyncClient::new(config().with_endpoint("/v9/other"), transport);

    let err = client
        .start(&mut PatchEngine::default(), &mut store, &AlwaysConfirm)
        .unwrap_err();
    assert!(matches!(err, SyncError::Transport { retryable: false, .. }));
    assert_eq!(client.transport().last_error().as_deref(), Some("transport error: server returned 404"));
}

#[test]
fn unknown_local_state_is_refused_without_prompting() {
    let mut store = base_store();
    let (release, _) = author_release("2.0", &store, |s| {
        let id = s.get_by_description("Ammo", true).unwrap().id;
        s.record_mut(id).unwrap().color = 0x00FF00;
    });
    let server = Arc::new(PatchServer::new(ServerConfig::new("2.0")));
    server.publish(release).unwrap();

    // Local drift the server has never seen.
    let id = store.get_by_description("Health", true).unwrap().id;
    store.record_mut(id).unwrap().description = "HP".into();
    let drifted = build_fingerprint(&store).unwrap();

    let client = SyncClient::new(config(), InMemoryTransport { server });
    let prompt = |_: &str| -> bool { panic!("prompt must not be shown") };
    let err = client
        .start(&mut PatchEngine::default(), &mut store, &prompt)
        .unwrap_err();

    assert!(matches!(err, SyncError::HashMismatch { .. }));
    assert_eq!(build_fingerprint(&store).unwrap(), drifted);
}

#[test]
fn declining_leaves_the_store_alone() {
    let mut store = base_store();
    let before = build_fingerprint(&store).unwrap();
    let (release, _) = author_release("2.0", &store, |s| {
        let id = s.get_by_description("Ammo", true).unwrap().id;
        s.record_mut(id).unwrap().show_as_hex = true;
    });
    let server = Arc::new(PatchServer::new(ServerConfig::new("2.0")));
    server.publish(release).unwrap();

    let client = SyncClient::new(config(), InMemoryTransport { server });
    let err = client
        .start(&mut PatchEngine::default(), &mut store, &AlwaysDecline)
        .unwrap_err();
    assert!(matches!(err, SyncError::UserDeclined));
    assert_eq!(build_fingerprint(&store).unwrap(), before);
}

#[test]
fn server_side_mistake_is_reverted() {
    let mut store = base_store();
    let before = build_fingerprint(&store).unwrap();
    let health = store.get_by_description("Health", true).unwrap().id;

    // Release whose promised fingerprint the patches cannot reach.
    let set = PatchSet::new(vec![
        Patch::set("1", TargetSpec::by_id(health), "Address", "game.exe+200"),
        Patch::set("2", TargetSpec::by_description("Ammo"), "Active", true),
    ])
    .with_required(before.clone())
    .with_expected(build_fingerprint(&MemoryRecordStore::new()).unwrap());
    let server = Arc::new(PatchServer::new(ServerConfig::new("2.0")));
    server.publish(Release::new("2.0", set).unwrap()).unwrap();

    let client = SyncClient::new(config(), InMemoryTransport { server });
    let mut engine = PatchEngine::default();
    let err = client.start(&mut engine, &mut store, &AlwaysConfirm).unwrap_err();

    assert!(matches!(err, SyncError::Apply(ref e) if e.reverted && e.position.is_none()));
    assert_eq!(client.last_terminal_state(), Some(SyncState::RevertedOnMismatch));
    assert_eq!(build_fingerprint(&store).unwrap(), before);
    assert!(engine.rollback_log().is_empty());
}
