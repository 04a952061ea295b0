//! End-to-end tests for likes, sign-in sync, and the account commands.
//!
//! The cloud store is the file-backed one under `.haze/userLikes/`, so a
//! second "device" is simulated by editing the user's document directly.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const CATALOG: &str = r#"[
  {"id": "1", "text": "Simplicity is prerequisite for reliability.", "author": "Edsger Dijkstra"},
  {"id": "2", "text": "Make it work, make it right, make it fast.", "author": "Kent Beck"},
  {"id": 3, "text": "Talk is cheap. Show me the code.", "author": "Linus Torvalds"}
]"#;

fn haze_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("haze"));
    cmd.current_dir(dir);
    cmd.env("HAZE_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env_remove("HAZE_DATA_DIR");
    cmd.env_remove("FORMAT");
    cmd
}

fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("data")).expect("data dir");
    fs::write(dir.path().join("data/quotes.json"), CATALOG).expect("catalog");
    dir
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = haze_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("haze should not crash");
    assert!(
        output.status.success(),
        "haze {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn liked_ids(dir: &Path) -> Vec<String> {
    run_json(dir, &["likes"])["quotes"]
        .as_array()
        .expect("quotes array")
        .iter()
        .map(|q| q["id"].as_str().expect("id").to_string())
        .collect()
}

fn cloud_doc(dir: &Path, uid: &str) -> Option<Value> {
    let path = dir.join(format!(".haze/userLikes/{uid}.json"));
    let raw = fs::read_to_string(path).ok()?;
    Some(serde_json::from_str(&raw).expect("cloud doc json"))
}

fn signin(dir: &Path, uid: &str) -> Value {
    run_json(dir, &["signin", "--uid", uid, "--name", "Ada Lovelace"])
}

// ---------------------------------------------------------------------------
// Guest likes
// ---------------------------------------------------------------------------

#[test]
fn like_by_id_as_guest_stays_local() {
    let dir = project();
    let liked = run_json(dir.path(), &["like", "2"]);
    assert_eq!(liked["id"], "2");
    assert_eq!(liked["liked"], true);
    assert_eq!(liked["outcome"], "local_only");

    assert_eq!(liked_ids(dir.path()), ["2"]);
    assert!(!dir.path().join(".haze/userLikes").exists());
}

#[test]
fn like_twice_is_unchanged() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    let again = run_json(dir.path(), &["like", "1"]);
    assert_eq!(again["outcome"], "unchanged");
    assert_eq!(again["liked"], true);
}

#[test]
fn unlike_removes_the_like() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    run_json(dir.path(), &["like", "3"]);
    let unliked = run_json(dir.path(), &["unlike", "1"]);
    assert_eq!(unliked["liked"], false);
    assert_eq!(liked_ids(dir.path()), ["3"]);
}

#[test]
fn like_current_quote_confirms_and_prompts_guest() {
    let dir = project();
    let shown = run_json(dir.path(), &["show"]);
    let id = shown["quote"]["id"].as_str().expect("id").to_string();

    let liked = run_json(dir.path(), &["like"]);
    assert_eq!(liked["id"], id.as_str());
    assert_eq!(
        liked["notifications"],
        json!([
            "<3 Saved to favorites!",
            "Sign in to sync your favorites in the cloud."
        ])
    );

    let reshown = run_json(dir.path(), &["prev"]);
    assert_eq!(reshown["quote"]["id"], id.as_str());
    assert_eq!(reshown["quote"]["liked"], true);
}

#[test]
fn like_unknown_id_fails() {
    let dir = project();
    haze_cmd(dir.path())
        .args(["like", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));
}

#[test]
fn likes_text_output_lists_rows() {
    let dir = project();
    run_json(dir.path(), &["like", "3"]);
    haze_cmd(dir.path())
        .arg("likes")
        .assert()
        .success()
        .stdout("3\tliked\tTalk is cheap. Show me the code.\tLinus Torvalds\n");
}

#[test]
fn corrupt_local_likes_read_as_empty() {
    let dir = project();
    fs::create_dir_all(dir.path().join(".haze")).expect("dir");
    fs::write(dir.path().join(".haze/likedQuotes_v1.json"), "{not json").expect("write");
    assert!(liked_ids(dir.path()).is_empty());
    run_json(dir.path(), &["like", "1"]);
    assert_eq!(liked_ids(dir.path()), ["1"]);
}

// ---------------------------------------------------------------------------
// Sign-in and sync
// ---------------------------------------------------------------------------

#[test]
fn first_sign_in_creates_the_cloud_record() {
    let dir = project();
    run_json(dir.path(), &["like", "2"]);

    let report = signin(dir.path(), "u1");
    assert_eq!(report["uid"], "u1");
    assert_eq!(report["greeting"], "Hello, Ada!");
    assert_eq!(report["likes"], 1);
    assert_eq!(report["written_back"], true);

    let doc = cloud_doc(dir.path(), "u1").expect("record created");
    assert_eq!(doc["likes"], json!(["2"]));
}

#[test]
fn sign_in_merges_both_sides() {
    let dir = project();
    fs::create_dir_all(dir.path().join(".haze/userLikes")).expect("dir");
    fs::write(
        dir.path().join(".haze/userLikes/u1.json"),
        r#"{"likes": ["3"], "theme": "dark"}"#,
    )
    .expect("seed cloud");
    run_json(dir.path(), &["like", "1"]);

    let report = signin(dir.path(), "u1");
    assert_eq!(report["likes"], 2);
    assert_eq!(report["written_back"], true);
    assert_eq!(liked_ids(dir.path()), ["1", "3"]);

    let doc = cloud_doc(dir.path(), "u1").expect("record");
    assert_eq!(doc["likes"], json!(["1", "3"]));
    assert_eq!(doc["theme"], "dark");
}

#[test]
fn signed_in_like_syncs() {
    let dir = project();
    signin(dir.path(), "u1");
    let liked = run_json(dir.path(), &["like", "3"]);
    assert_eq!(liked["outcome"], "synced");
    assert_eq!(cloud_doc(dir.path(), "u1").expect("record")["likes"], json!(["3"]));

    let unliked = run_json(dir.path(), &["unlike", "3"]);
    assert_eq!(unliked["outcome"], "synced");
    assert_eq!(cloud_doc(dir.path(), "u1").expect("record")["likes"], json!([]));
}

#[test]
fn sync_requires_sign_in() {
    let dir = project();
    haze_cmd(dir.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5003"));
}

#[test]
fn sync_picks_up_likes_from_another_device() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    signin(dir.path(), "u1");

    fs::write(
        dir.path().join(".haze/userLikes/u1.json"),
        r#"{"likes": ["1", "2"]}"#,
    )
    .expect("other device");

    let report = run_json(dir.path(), &["sync"]);
    assert_eq!(report["likes"], json!(["1", "2"]));
    assert_eq!(report["remote_count"], 2);
    assert_eq!(report["local_count"], 1);
    assert_eq!(report["written_back"], false);
    assert_eq!(liked_ids(dir.path()), ["1", "2"]);
}

#[test]
fn forced_sync_rewrites_an_up_to_date_record() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    signin(dir.path(), "u1");

    assert_eq!(run_json(dir.path(), &["sync"])["written_back"], false);
    assert_eq!(run_json(dir.path(), &["sync", "--force"])["written_back"], true);
}

#[test]
fn unreadable_cloud_record_keeps_local_likes() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    signin(dir.path(), "u1");
    fs::write(dir.path().join(".haze/userLikes/u1.json"), "[oops").expect("corrupt");

    let report = run_json(dir.path(), &["sync"]);
    assert!(report["error_code"].is_string());
    assert_eq!(report["likes"], json!(["1"]));
    assert_eq!(report["notifications"], json!(["Cloud sync is unavailable right now."]));
    assert_eq!(liked_ids(dir.path()), ["1"]);
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[test]
fn account_greets_and_lists_likes() {
    let dir = project();
    run_json(dir.path(), &["like", "2"]);
    let guest = run_json(dir.path(), &["account"]);
    assert_eq!(guest["greeting"], "Hello!");
    assert!(guest.get("uid").is_none());

    signin(dir.path(), "u1");
    let account = run_json(dir.path(), &["account"]);
    assert_eq!(account["greeting"], "Hello, Ada!");
    assert_eq!(account["uid"], "u1");
    assert_eq!(account["quotes"][0]["id"], "2");
}

#[test]
fn account_remove_updates_both_sides() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    run_json(dir.path(), &["like", "2"]);
    signin(dir.path(), "u1");

    let removed = run_json(dir.path(), &["account", "remove", "1"]);
    assert_eq!(removed["outcome"], "removed");
    assert_eq!(removed["notifications"], json!(["Quote removed from your likes."]));
    assert_eq!(liked_ids(dir.path()), ["2"]);
    assert_eq!(cloud_doc(dir.path(), "u1").expect("record")["likes"], json!(["2"]));
}

#[test]
fn account_remove_of_unliked_quote_is_a_no_op() {
    let dir = project();
    signin(dir.path(), "u1");
    let removed = run_json(dir.path(), &["account", "remove", "2"]);
    assert_eq!(removed["outcome"], "not_liked");
}

#[test]
fn account_remove_requires_sign_in() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    haze_cmd(dir.path())
        .args(["account", "remove", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5003"))
        .stderr(predicate::str::contains("Sign in to manage your favorites."));
    assert_eq!(liked_ids(dir.path()), ["1"]);
}

#[test]
fn sign_out_keeps_local_likes() {
    let dir = project();
    run_json(dir.path(), &["like", "1"]);
    signin(dir.path(), "u1");

    let out = run_json(dir.path(), &["signout"]);
    assert_eq!(out["signed_out"], true);
    assert_eq!(out["likes"], 1);
    assert_eq!(out["notifications"], json!(["You are signed out."]));

    assert_eq!(liked_ids(dir.path()), ["1"]);
    assert_eq!(run_json(dir.path(), &["account"])["greeting"], "Hello!");
    assert_eq!(run_json(dir.path(), &["like", "2"])["outcome"], "local_only");
}

#[test]
fn signin_rejects_blank_uid() {
    let dir = project();
    haze_cmd(dir.path())
        .args(["signin", "--uid", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5001"));
}
