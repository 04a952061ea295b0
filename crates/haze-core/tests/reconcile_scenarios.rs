//! End-to-end reconciliation behaviour against the in-memory remote,
//! including injected remote failures.

use futures::executor::block_on;
use haze_core::error::ErrorCode;
use haze_core::likes::{LikeReconciler, LikeSet, LocalLikeStore, RemoveOutcome, ToggleOutcome};
use haze_core::notify::{RecordingNotifier, messages};
use haze_core::quote::QuoteId;
use haze_core::remote::{MemoryRemote, RemoteCall};
use haze_core::storage::MemorySlot;
use haze_core::User;

type Reconciler = LikeReconciler<MemorySlot, MemoryRemote, RecordingNotifier>;

fn reconciler() -> Reconciler {
    LikeReconciler::new(
        LocalLikeStore::new(MemorySlot::new()),
        MemoryRemote::new(),
        RecordingNotifier::new(),
    )
}

fn ids(values: &[&str]) -> Vec<QuoteId> {
    values.iter().copied().map(QuoteId::from).collect()
}

fn alice() -> User {
    User::new("alice").with_display_name("Alice Liddell")
}

#[test]
fn remote_superset_needs_no_write_back() {
    let r = reconciler();
    r.remote().seed("alice", ["1", "2"]);
    r.local().set(&LikeSet::from_ids(["2"])).expect("seed");

    let report = block_on(r.on_sign_in(alice()));

    assert_eq!(report.likes.to_sorted_vec(), ids(&["1", "2"]));
    assert!(!report.written_back);
    assert!(r.remote().mutations().is_empty());
    assert_eq!(r.likes().to_sorted_vec(), ids(&["1", "2"]));
}

#[test]
fn local_contribution_is_written_back_sorted() {
    let r = reconciler();
    r.remote().seed("alice", ["1"]);
    r.local().set(&LikeSet::from_ids(["2"])).expect("seed");

    let report = block_on(r.on_sign_in(alice()));

    assert!(report.written_back);
    assert_eq!(
        r.remote().mutations(),
        [RemoteCall::MergeWrite {
            uid: "alice".to_string(),
            likes: ids(&["1", "2"]),
        }]
    );
}

#[test]
fn forced_refresh_always_writes() {
    let r = reconciler();
    r.remote().seed("alice", ["1", "2"]);
    r.local().set(&LikeSet::from_ids(["2"])).expect("seed");

    let report = block_on(r.sync_on_sign_in(&alice(), true));
    assert!(report.written_back);
    assert_eq!(r.remote().mutations().len(), 1);
}

#[test]
fn first_sign_in_creates_the_record() {
    let r = reconciler();
    r.local().set(&LikeSet::from_ids(["7", "3"])).expect("seed");

    block_on(r.on_sign_in(alice()));
    assert_eq!(r.remote().likes("alice"), Some(ids(&["3", "7"])));
}

#[test]
fn unreadable_remote_keeps_local_and_notifies_once() {
    let r = reconciler();
    r.remote().set_fail_reads(true);
    r.local().set(&LikeSet::from_ids(["4"])).expect("seed");

    let report = block_on(r.on_sign_in(alice()));

    assert_eq!(report.error, Some(ErrorCode::RemoteUnavailable));
    assert_eq!(report.likes.to_sorted_vec(), ids(&["4"]));
    assert_eq!(r.likes().to_sorted_vec(), ids(&["4"]));
    assert_eq!(r.notifier().messages(), [messages::SYNC_UNAVAILABLE]);
    assert!(r.session().is_signed_in());
}

#[test]
fn failed_write_back_still_stores_merge_locally() {
    let r = reconciler();
    r.remote().seed("alice", ["1"]);
    r.remote().set_fail_writes(true);
    r.local().set(&LikeSet::from_ids(["2"])).expect("seed");

    let report = block_on(r.on_sign_in(alice()));

    assert!(!report.written_back);
    assert_eq!(report.error, Some(ErrorCode::RemoteUnavailable));
    assert_eq!(r.likes().to_sorted_vec(), ids(&["1", "2"]));
    assert_eq!(r.remote().likes("alice"), Some(ids(&["1"])));
    assert_eq!(r.notifier().messages(), [messages::SYNC_UNAVAILABLE]);
}

#[test]
fn corrupt_local_slot_is_treated_as_empty() {
    let r = LikeReconciler::new(
        LocalLikeStore::new(MemorySlot::with_raw("{not json")),
        MemoryRemote::new(),
        RecordingNotifier::new(),
    );
    r.remote().seed("alice", ["9"]);

    let report = block_on(r.on_sign_in(alice()));
    assert_eq!(report.local_count, 0);
    assert_eq!(r.likes().to_sorted_vec(), ids(&["9"]));
    assert_eq!(r.local().slot().raw().as_deref(), Some(r#"["9"]"#));
    assert!(r.notifier().messages().is_empty());
}

#[test]
fn toggle_failure_keeps_optimistic_state() {
    let r = reconciler();
    block_on(r.on_sign_in(alice()));
    r.remote().set_fail_writes(true);

    let outcome = block_on(r.toggle(&QuoteId::from("5"), None));

    assert_eq!(outcome, ToggleOutcome::SyncFailed { liked: true });
    assert!(r.is_liked(&QuoteId::from("5")));
    assert_eq!(r.notifier().messages(), [messages::TOGGLE_SYNC_FAILED]);

    // The next sign-in sync repairs the divergence.
    r.remote().set_fail_writes(false);
    block_on(r.on_sign_in(alice()));
    assert_eq!(r.remote().likes("alice"), Some(ids(&["5"])));
}

#[test]
fn guest_toggle_never_touches_remote() {
    let r = reconciler();
    let outcome = block_on(r.toggle(&QuoteId::from("1"), None));
    assert_eq!(outcome, ToggleOutcome::LocalOnly { liked: true });
    assert!(outcome.wants_sign_in());
    assert!(r.remote().calls().is_empty());
}

#[test]
fn unlike_without_record_creates_empty_record() {
    let r = reconciler();
    r.local().add(&QuoteId::from("1")).expect("seed");
    r.session().begin(alice());

    let outcome = block_on(r.toggle(&QuoteId::from("1"), Some(false)));

    assert_eq!(outcome, ToggleOutcome::Synced { liked: false });
    assert_eq!(r.remote().likes("alice"), Some(Vec::new()));
    assert_eq!(
        r.remote().mutations(),
        [
            RemoteCall::RemoveValues {
                uid: "alice".to_string(),
                values: ids(&["1"]),
            },
            RemoteCall::MergeWrite {
                uid: "alice".to_string(),
                likes: Vec::new(),
            },
        ]
    );
}

#[test]
fn rapid_removals_apply_once() {
    let r = reconciler();
    r.remote().seed("alice", ["1", "2"]);
    r.local().set(&LikeSet::from_ids(["1", "2"])).expect("seed");
    r.session().begin(alice());
    r.remote().clear_calls();

    let first = r.remove_like(&QuoteId::from("1"));
    let second = r.remove_like(&QuoteId::from("2"));
    let (first, second) = block_on(async { futures::join!(first, second) });

    assert_eq!(first, RemoveOutcome::Removed);
    assert_eq!(second, RemoveOutcome::Dropped);
    assert_eq!(r.remote().mutations().len(), 1);
    assert_eq!(r.likes().to_sorted_vec(), ids(&["2"]));
    assert_eq!(r.remote().likes("alice"), Some(ids(&["2"])));
}

#[test]
fn sign_out_forgets_user_but_keeps_likes() {
    let r = reconciler();
    r.remote().seed("alice", ["1"]);
    block_on(r.on_sign_in(alice()));

    r.on_sign_out();

    assert!(!r.session().is_signed_in());
    assert_eq!(r.session().current(), None);
    assert_eq!(r.likes().to_sorted_vec(), ids(&["1"]));

    let outcome = block_on(r.toggle(&QuoteId::from("2"), None));
    assert_eq!(outcome, ToggleOutcome::LocalOnly { liked: true });
    assert_eq!(r.remote().likes("alice"), Some(ids(&["1"])));
}
