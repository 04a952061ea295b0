//! `haze sync`: reconcile this device with the signed-in account.

use std::io::Write;

use clap::Args;
use futures::executor::block_on;
use haze_core::error::ErrorCode;
use haze_core::{SyncReport, User};
use serde::Serialize;

use super::fail;
use crate::app::App;
use crate::output::{CliError, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Write the merged set back even when the cloud record is already
    /// up to date.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct SyncResult {
    uid: String,
    likes: Vec<String>,
    remote_count: usize,
    local_count: usize,
    written_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

impl SyncResult {
    fn new(user: &User, report: &SyncReport, notifications: Vec<String>) -> Self {
        Self {
            uid: user.uid.clone(),
            likes: report.likes.iter().map(ToString::to_string).collect(),
            remote_count: report.remote_count,
            local_count: report.local_count,
            written_back: report.written_back,
            error_code: report.error.map(ErrorCode::code),
            notifications,
        }
    }
}

/// Execute `haze sync`.
///
/// A failed cloud read or write is reported in the result (and as a
/// notification) without failing the command: the device keeps its likes.
pub fn run_sync(app: &App, args: &SyncArgs) -> anyhow::Result<()> {
    let Some(user) = app.browser.likes().session().current() else {
        return fail(app.output, &CliError::from(ErrorCode::NotSignedIn));
    };

    let report = if args.force {
        match block_on(app.browser.account().refresh()) {
            Some(report) => report,
            None => {
                return fail(app.output, &CliError::new("another sync is in progress"));
            }
        }
    } else {
        block_on(app.browser.likes().sync_on_sign_in(&user, false))
    };

    let result = SyncResult::new(&user, &report, app.notifications());
    render_mode(
        app.output,
        &result,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                r.uid,
                r.likes.len(),
                if r.written_back { "written" } else { "-" },
                r.error_code.unwrap_or("ok")
            )
        },
        |r, w| {
            pretty_kv(w, "Account", &r.uid)?;
            pretty_kv(w, "Cloud", r.remote_count.to_string())?;
            pretty_kv(w, "Device", r.local_count.to_string())?;
            pretty_kv(w, "Merged", r.likes.len().to_string())?;
            match r.error_code {
                Some(code) => pretty_kv(w, "Status", format!("failed ({code})")),
                None if r.written_back => pretty_kv(w, "Status", "cloud updated"),
                None => pretty_kv(w, "Status", "up to date"),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use haze_core::LikeSet;

    #[test]
    fn result_lists_likes_in_order() {
        let report = SyncReport {
            likes: LikeSet::from_ids(["b", "a"]),
            remote_count: 1,
            local_count: 1,
            written_back: true,
            error: None,
        };
        let result = SyncResult::new(&User::new("u1"), &report, Vec::new());
        let value = serde_json::to_value(&result).expect("json");
        assert_eq!(value["likes"], serde_json::json!(["a", "b"]));
        assert!(value.get("error_code").is_none());
        assert!(value.get("notifications").is_none());
    }

    #[test]
    fn failures_carry_their_code() {
        let report = SyncReport {
            likes: LikeSet::default(),
            remote_count: 0,
            local_count: 0,
            written_back: false,
            error: Some(ErrorCode::RemoteUnavailable),
        };
        let result = SyncResult::new(&User::new("u1"), &report, vec!["x".to_string()]);
        assert_eq!(result.error_code, Some("E4001"));
    }
}
