//! `haze likes`: list liked quotes.

use std::io::Write;

use serde::Serialize;

use super::{QuoteOutput, write_quote_pretty, write_quote_row};
use crate::app::App;
use crate::output::{pretty_section, render_mode};

#[derive(Debug, Serialize)]
struct LikesResult {
    count: usize,
    quotes: Vec<QuoteOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

/// Execute `haze likes`. Liked ids that are no longer in the catalog are
/// left out.
pub fn run_likes(app: &App) -> anyhow::Result<()> {
    let quotes: Vec<QuoteOutput> = app
        .browser
        .account()
        .liked_quotes()
        .iter()
        .map(|quote| QuoteOutput::new(quote, true))
        .collect();

    let result = LikesResult {
        count: quotes.len(),
        quotes,
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| {
            for quote in &r.quotes {
                write_quote_row(w, quote)?;
            }
            Ok(())
        },
        |r, w| write_liked_pretty(w, &r.quotes),
    )
}

/// Shared by `haze likes` and `haze account`.
pub fn write_liked_pretty(w: &mut dyn Write, quotes: &[QuoteOutput]) -> std::io::Result<()> {
    pretty_section(w, &format!("Liked quotes ({})", quotes.len()))?;
    if quotes.is_empty() {
        return writeln!(w, "No liked quotes yet.");
    }
    for (i, quote) in quotes.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        write_quote_pretty(w, quote)?;
    }
    Ok(())
}
