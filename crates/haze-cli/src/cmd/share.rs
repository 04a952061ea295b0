//! `haze share`: print the current quote for copying.

use std::io::Write;

use haze_core::error::ErrorCode;
use serde::Serialize;

use super::fail;
use super::nav::catalog_failure;
use crate::app::App;
use crate::output::{CliError, render_mode};

#[derive(Debug, Serialize)]
struct ShareResult {
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

/// Execute `haze share`. Shows a quote first when none has been shown yet.
pub fn run_share(app: &mut App) -> anyhow::Result<()> {
    if !app.browser.resume() {
        return catalog_failure(app);
    }
    app.save_navigation()?;
    let Some(text) = app.browser.share() else {
        return fail(
            app.output,
            &CliError::coded(ErrorCode::CatalogUnavailable, "quote catalog is empty"),
        );
    };

    let result = ShareResult {
        text,
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| writeln!(w, "{}", r.text),
        |r, w| writeln!(w, "{}", r.text),
    )
}
