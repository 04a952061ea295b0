pub mod account;
pub mod browse;
pub mod like;
pub mod likes;
pub mod nav;
pub mod session;
pub mod share;
pub mod sync;

use std::io::{self, Write};

use haze_core::Quote;
use serde::Serialize;

use crate::output::{CliError, OutputMode, render_error};

/// A quote as printed by every command.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteOutput {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub liked: bool,
}

impl QuoteOutput {
    pub fn new(quote: &Quote, liked: bool) -> Self {
        Self {
            id: quote.id.to_string(),
            text: quote.text.clone(),
            author: quote.author.clone(),
            liked,
        }
    }
}

/// `id<TAB>liked<TAB>text<TAB>author`
pub fn write_quote_row(w: &mut dyn Write, quote: &QuoteOutput) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        quote.id,
        if quote.liked { "liked" } else { "-" },
        quote.text,
        quote.author.as_deref().unwrap_or("")
    )
}

pub fn write_quote_pretty(w: &mut dyn Write, quote: &QuoteOutput) -> io::Result<()> {
    writeln!(w, "\"{}\"", quote.text)?;
    if let Some(author) = quote.author.as_deref().filter(|a| !a.is_empty()) {
        writeln!(w, "    - {author}")?;
    }
    let mark = if quote.liked { "<3" } else { "  " };
    writeln!(w, "{mark} [{}]", quote.id)
}

/// Report `error` in the current mode and abort the command.
pub fn fail<T>(output: OutputMode, error: &CliError) -> anyhow::Result<T> {
    render_error(output, error)?;
    anyhow::bail!("{}", error.message)
}
