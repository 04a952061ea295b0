//! `haze show`, `haze next`, `haze prev`: move through the quote history.

use std::io::Write;

use clap::Args;
use haze_core::NavOutcome;
use haze_core::error::ErrorCode;
use serde::Serialize;

use super::{QuoteOutput, fail, write_quote_pretty, write_quote_row};
use crate::app::App;
use crate::output::{CliError, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Seed for the random pick, for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct NavResult {
    quote: QuoteOutput,
    /// `false` when there was nowhere to move and the current quote stayed.
    moved: bool,
    history: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

/// Execute `haze show` / `haze next`: a forward step, replaying forward
/// history left by `prev` before picking a new quote.
pub fn run_next(app: &mut App) -> anyhow::Result<()> {
    if !app.browser.start() {
        return catalog_failure(app);
    }
    finish(app, true)
}

/// Execute `haze prev`. At the start of the history the current quote is
/// shown again.
pub fn run_prev(app: &mut App) -> anyhow::Result<()> {
    if !app.browser.resume() {
        return catalog_failure(app);
    }
    let moved = matches!(app.browser.show_previous_instant(), NavOutcome::Shown(_));
    finish(app, moved)
}

fn finish(app: &App, moved: bool) -> anyhow::Result<()> {
    app.save_navigation()?;
    let view = app.browser.view();
    let Some(quote) = view.quote else {
        return fail(
            app.output,
            &CliError::coded(ErrorCode::CatalogUnavailable, "quote catalog is empty"),
        );
    };

    let result = NavResult {
        quote: QuoteOutput::new(&quote, view.liked),
        moved,
        history: app.browser.history().len(),
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| write_quote_row(w, &r.quote),
        |r, w| {
            write_quote_pretty(w, &r.quote)?;
            if !r.moved {
                writeln!(w, "(already at the first quote)")?;
            }
            Ok(())
        },
    )
}

pub fn catalog_failure(app: &App) -> anyhow::Result<()> {
    fail(
        app.output,
        &CliError::coded(
            ErrorCode::CatalogUnavailable,
            format!(
                "unable to load quotes from {}",
                app.config.catalog_path.display()
            ),
        ),
    )
}
