//! `haze like` / `haze unlike`.

use std::io::Write;

use clap::Args;
use futures::executor::block_on;
use haze_core::error::ErrorCode;
use haze_core::{QuoteId, ToggleOutcome};
use serde::Serialize;

use super::{fail, nav::catalog_failure};
use crate::app::App;
use crate::output::{CliError, render_mode};

#[derive(Args, Debug)]
pub struct LikeArgs {
    /// Quote ID. Defaults to the quote last shown.
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
struct LikeResult {
    id: String,
    liked: bool,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

const fn outcome_name(outcome: ToggleOutcome) -> &'static str {
    match outcome {
        ToggleOutcome::Unchanged { .. } => "unchanged",
        ToggleOutcome::LocalOnly { .. } => "local_only",
        ToggleOutcome::Synced { .. } => "synced",
        ToggleOutcome::SyncFailed { .. } => "sync_failed",
        ToggleOutcome::LocalFailed => "local_failed",
    }
}

/// Execute `haze like` (`liked = true`) or `haze unlike`.
///
/// Without an ID this acts on the quote on screen, like a double tap: a new
/// like confirms with a notification and a guest is prompted to sign in.
pub fn run_like(app: &mut App, args: &LikeArgs, liked: bool) -> anyhow::Result<()> {
    let (id, outcome) = match &args.id {
        Some(raw) => {
            let id = QuoteId::from(raw.as_str());
            let known = app
                .browser
                .catalog()
                .get_or_load()
                .is_ok_and(|catalog| catalog.find(&id).is_some());
            if !known {
                return fail(
                    app.output,
                    &CliError::coded(ErrorCode::QuoteNotFound, format!("no quote with id {id}")),
                );
            }
            let outcome = block_on(app.browser.likes().toggle(&id, Some(liked)));
            (id, outcome)
        }
        None => {
            if !app.browser.resume() {
                return catalog_failure(app);
            }
            app.save_navigation()?;
            let Some(id) = app.browser.current_quote().map(|q| q.id.clone()) else {
                return fail(app.output, &CliError::from(ErrorCode::QuoteNotFound));
            };
            let Some(outcome) = block_on(app.browser.toggle_like(Some(liked), true)) else {
                return fail(app.output, &CliError::from(ErrorCode::QuoteNotFound));
            };
            (id, outcome)
        }
    };

    if outcome == ToggleOutcome::LocalFailed {
        return fail(app.output, &CliError::from(ErrorCode::StorageWriteFailed));
    }

    let result = LikeResult {
        id: id.to_string(),
        liked: outcome.liked().unwrap_or(liked),
        outcome: outcome_name(outcome),
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| writeln!(w, "{}\t{}\t{}", r.id, if r.liked { "liked" } else { "-" }, r.outcome),
        |r, w| {
            let verb = if r.liked { "Liked" } else { "Unliked" };
            match r.outcome {
                "unchanged" => writeln!(w, "Quote {} already {}", r.id, verb.to_lowercase()),
                "synced" => writeln!(w, "{verb} quote {} (synced)", r.id),
                "sync_failed" => writeln!(w, "{verb} quote {} on this device only", r.id),
                _ => writeln!(w, "{verb} quote {}", r.id),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names_are_stable() {
        assert_eq!(outcome_name(ToggleOutcome::Synced { liked: true }), "synced");
        assert_eq!(outcome_name(ToggleOutcome::LocalOnly { liked: false }), "local_only");
        assert_eq!(outcome_name(ToggleOutcome::LocalFailed), "local_failed");
    }
}
