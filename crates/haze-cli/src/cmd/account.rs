//! `haze account`: greeting, liked quotes, and removal.

use std::io::Write;

use clap::{Args, Subcommand};
use futures::executor::block_on;
use haze_core::error::ErrorCode;
use haze_core::{QuoteId, RemoveOutcome};
use serde::Serialize;

use super::likes::write_liked_pretty;
use super::{QuoteOutput, fail, write_quote_row};
use crate::app::App;
use crate::output::{CliError, render_mode};

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: Option<AccountCommand>,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Remove a quote from your likes, here and in the cloud.
    Remove {
        /// Quote ID.
        id: String,
    },
}

#[derive(Debug, Serialize)]
struct AccountResult {
    greeting: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    quotes: Vec<QuoteOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RemoveResult {
    id: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

/// Execute `haze account` and its subcommands.
pub fn run_account(app: &App, args: &AccountArgs) -> anyhow::Result<()> {
    match &args.command {
        None => show(app),
        Some(AccountCommand::Remove { id }) => remove(app, &QuoteId::from(id.as_str())),
    }
}

fn show(app: &App) -> anyhow::Result<()> {
    let account = app.browser.account();
    let result = AccountResult {
        greeting: account.greeting(),
        uid: account.user().map(|user| user.uid),
        quotes: account
            .liked_quotes()
            .iter()
            .map(|quote| QuoteOutput::new(quote, true))
            .collect(),
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| {
            writeln!(w, "{}", r.greeting)?;
            for quote in &r.quotes {
                write_quote_row(w, quote)?;
            }
            Ok(())
        },
        |r, w| {
            writeln!(w, "{}", r.greeting)?;
            if r.uid.is_none() {
                writeln!(w, "Sign in with `haze signin` to sync your likes.")?;
            }
            writeln!(w)?;
            write_liked_pretty(w, &r.quotes)
        },
    )
}

fn remove(app: &App, id: &QuoteId) -> anyhow::Result<()> {
    let outcome = block_on(app.browser.account().remove(id));
    let name = match outcome {
        RemoveOutcome::Removed => "removed",
        RemoveOutcome::RemoteFailed => "remote_failed",
        RemoveOutcome::NotLiked => "not_liked",
        RemoveOutcome::NotSignedIn => {
            return fail(app.output, &CliError::from(ErrorCode::NotSignedIn));
        }
        RemoveOutcome::Dropped => {
            return fail(app.output, &CliError::new("another removal is in progress"));
        }
        RemoveOutcome::LocalFailed => {
            return fail(app.output, &CliError::from(ErrorCode::StorageWriteFailed));
        }
    };

    let result = RemoveResult {
        id: id.to_string(),
        outcome: name,
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| writeln!(w, "{}\t{}", r.id, r.outcome),
        |r, w| match r.outcome {
            "removed" => writeln!(w, "Removed quote {}", r.id),
            "not_liked" => writeln!(w, "Quote {} was not liked", r.id),
            _ => writeln!(w, "Removed quote {} on this device; the cloud was not updated", r.id),
        },
    )
}
