//! Interleavings across suspension points. These pin down the documented
//! races rather than fix them.

mod common;

use common::{add, approve, create, delete, perms, Harness};
use entity_account::{AccountConfig, AccountEffects, UserAccountState};
use entity_core::{AccountSnapshot, CommandReply, DeleteUserRequest, EntityId, UndoDeleteRequest};
use entity_testkit::{
    settle, RecordingIndex, RecordingNotifier, ScriptedVerifier, TokioSpawner, VerifierScript,
    VirtualClock,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn delayed_verification_still_grants_after_a_delete_request() {
    let h = Harness::new("alice");
    let _handle = h.start(AccountSnapshot::default()).await;
    h.host.verifier().set_script(VerifierScript::Hold);

    h.host.deliver(create(&[])).await.unwrap();
    h.host.deliver(add("read_files")).await.unwrap();

    // The approve handler suspends inside the verifier call.
    let approving = {
        let host = h.host.clone();
        tokio::spawn(async move { host.deliver(approve("bob", "read_files")).await })
    };
    h.host.settle().await;
    assert_eq!(h.host.verifier().calls().len(), 1);

    // A delete completes during the suspension.
    h.host.deliver(delete()).await.unwrap();
    h.host.settle().await;
    assert!(h.details().deletion_requested);

    // The delayed verdict lands without re-checking pending-ness or the
    // deletion guard, so the grant goes through anyway.
    h.host.verifier().release(true);
    h.host.settle().await;
    assert_eq!(
        approving.await.unwrap().unwrap(),
        CommandReply::PermissionApproved
    );
    assert_eq!(h.granted(), perms(&["read_files"]));
}

#[tokio::test]
async fn parallel_approves_of_one_request_grant_twice() {
    let h = Harness::new("alice");
    let _handle = h.start(AccountSnapshot::default()).await;
    h.host.verifier().set_script(VerifierScript::Hold);

    h.host.deliver(create(&[])).await.unwrap();
    h.host.deliver(add("read_files")).await.unwrap();

    let first = {
        let host = h.host.clone();
        tokio::spawn(async move { host.deliver(approve("bob", "read_files")).await })
    };
    h.host.settle().await;

    // A second approve of the same request runs to completion while the
    // first is suspended.
    h.host.verifier().set_script(VerifierScript::Verified);
    h.host.deliver(approve("carol", "read_files")).await.unwrap();
    assert_eq!(h.granted(), perms(&["read_files"]));
    assert_eq!(h.awaiting(), perms(&[]));

    // The first approve resumes and grants a duplicate.
    h.host.verifier().release(true);
    h.host.settle().await;
    first.await.unwrap().unwrap();
    assert_eq!(h.granted(), perms(&["read_files", "read_files"]));
    assert_eq!(h.awaiting(), perms(&[]));
}

#[tokio::test]
async fn cancelled_watcher_leaves_the_window_open_without_deleting() {
    let clock = VirtualClock::at_epoch();
    let effects = AccountEffects {
        clock: Arc::new(clock.clone()),
        spawner: Arc::new(TokioSpawner),
        index: Arc::new(RecordingIndex::default()),
        verifier: Arc::new(ScriptedVerifier::verified()),
        notifier: Arc::new(RecordingNotifier::default()),
    };
    let state = UserAccountState::new(
        EntityId::from("alice"),
        AccountConfig::default(),
        effects,
        AccountSnapshot::default(),
    )
    .unwrap();

    state.request_deletion(DeleteUserRequest);
    settle(&clock).await;
    assert!(state.user_details().deletion_requested);

    // Host cancellation kills the wait; the watcher logs and exits.
    clock.cancel_waits();
    settle(&clock).await;

    // No watcher left: the window never closes on its own.
    clock.advance(Duration::from_secs(600));
    settle(&clock).await;
    assert!(!state.deleted());
    assert!(state.user_details().deletion_requested);

    // Undo still works; it just has nothing racing it any more.
    state.request_undo_deletion(UndoDeleteRequest).unwrap();
    assert!(!state.user_details().deletion_requested);
}
