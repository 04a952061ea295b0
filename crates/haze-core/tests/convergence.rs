//! Several devices sharing one remote record.

use std::rc::Rc;

use futures::executor::block_on;
use haze_core::likes::{LikeReconciler, LocalLikeStore, RemoveOutcome};
use haze_core::notify::RecordingNotifier;
use haze_core::quote::QuoteId;
use haze_core::remote::{FileRemote, MemoryRemote};
use haze_core::storage::{FileSlot, MemorySlot};
use haze_core::User;
use tempfile::TempDir;

type Device = LikeReconciler<MemorySlot, Rc<MemoryRemote>, RecordingNotifier>;

fn device(remote: &Rc<MemoryRemote>) -> Device {
    LikeReconciler::new(
        LocalLikeStore::new(MemorySlot::new()),
        Rc::clone(remote),
        RecordingNotifier::new(),
    )
}

fn ids(values: &[&str]) -> Vec<QuoteId> {
    values.iter().copied().map(QuoteId::from).collect()
}

fn user() -> User {
    User::new("u-shared")
}

#[test]
fn offline_likes_from_every_device_converge() {
    let remote = Rc::new(MemoryRemote::new());
    let phone = device(&remote);
    let laptop = device(&remote);

    block_on(phone.toggle(&QuoteId::from("1"), None));
    block_on(laptop.toggle(&QuoteId::from("2"), None));
    block_on(laptop.toggle(&QuoteId::from("3"), None));

    block_on(phone.on_sign_in(user()));
    block_on(laptop.on_sign_in(user()));
    // The phone only sees the laptop's likes after its next sync.
    assert_eq!(phone.likes().to_sorted_vec(), ids(&["1"]));
    block_on(phone.sync_on_sign_in(&user(), false));

    let expected = ids(&["1", "2", "3"]);
    assert_eq!(phone.likes().to_sorted_vec(), expected);
    assert_eq!(laptop.likes().to_sorted_vec(), expected);
    assert_eq!(remote.likes("u-shared"), Some(expected));
}

#[test]
fn signed_in_toggles_reach_other_devices_on_sync() {
    let remote = Rc::new(MemoryRemote::new());
    let phone = device(&remote);
    let laptop = device(&remote);
    block_on(phone.on_sign_in(user()));
    block_on(laptop.on_sign_in(user()));

    block_on(phone.toggle(&QuoteId::from("8"), None));
    block_on(laptop.sync_on_sign_in(&user(), false));

    assert!(laptop.is_liked(&QuoteId::from("8")));
}

/// Union-only merge cannot tell "removed" from "never synced": a stale
/// device brings a removed like back.
#[test]
fn stale_device_resurrects_a_removed_like() {
    let remote = Rc::new(MemoryRemote::new());
    let phone = device(&remote);
    let tablet = device(&remote);

    block_on(phone.toggle(&QuoteId::from("4"), None));
    block_on(phone.on_sign_in(user()));
    block_on(tablet.on_sign_in(user()));
    assert!(tablet.is_liked(&QuoteId::from("4")));

    // Tablet goes offline; phone removes the like.
    tablet.on_sign_out();
    assert_eq!(block_on(phone.remove_like(&QuoteId::from("4"))), RemoveOutcome::Removed);
    assert_eq!(remote.likes("u-shared"), Some(Vec::new()));

    block_on(tablet.on_sign_in(user()));
    assert_eq!(remote.likes("u-shared"), Some(ids(&["4"])));
    block_on(phone.sync_on_sign_in(&user(), false));
    assert!(phone.is_liked(&QuoteId::from("4")));
}

#[test]
fn file_backed_devices_share_a_directory_remote() {
    let shared = TempDir::new().expect("remote dir");
    let phone_dir = TempDir::new().expect("phone dir");
    let laptop_dir = TempDir::new().expect("laptop dir");

    let open = |dir: &TempDir| {
        LikeReconciler::new(
            LocalLikeStore::new(FileSlot::new(dir.path(), "likedQuotes_v1")),
            FileRemote::new(shared.path(), "userLikes"),
            RecordingNotifier::new(),
        )
    };

    let phone = open(&phone_dir);
    block_on(phone.toggle(&QuoteId::from("10"), None));
    block_on(phone.on_sign_in(user()));

    let laptop = open(&laptop_dir);
    block_on(laptop.toggle(&QuoteId::from("11"), None));
    block_on(laptop.on_sign_in(user()));
    assert_eq!(laptop.likes().to_sorted_vec(), ids(&["10", "11"]));

    // A fresh process on the phone sees its own likes from disk.
    let phone_again = open(&phone_dir);
    assert_eq!(phone_again.likes().to_sorted_vec(), ids(&["10"]));
    block_on(phone_again.on_sign_in(user()));
    assert_eq!(phone_again.likes().to_sorted_vec(), ids(&["10", "11"]));
}
