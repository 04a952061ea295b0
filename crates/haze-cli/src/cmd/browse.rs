//! `haze browse`: interactive quote browser on stdin.

use std::io::{self, BufRead, Write};

use futures::executor::block_on;
use tracing::debug;

use super::nav::catalog_failure;
use crate::app::App;

const HELP: &str = "keys: [n]ext  [p]revious  [l]ike  [s]hare  [q]uit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Next,
    Previous,
    Like,
    Share,
    Quit,
    Unknown,
}

impl Key {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" | "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Previous,
            "l" | "like" => Self::Like,
            "s" | "share" => Self::Share,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

/// Execute `haze browse`. Each line of input is one key; end of input
/// quits. Navigation is saved on exit.
pub fn run_browse(app: &mut App) -> anyhow::Result<()> {
    app.browser.presenter().set_live(true);
    if !app.browser.start() {
        return catalog_failure(app);
    }
    println!("{HELP}");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let key = Key::parse(&line?);
        debug!(?key, "browse key");
        match key {
            Key::Next => {
                app.browser.show_next_instant();
            }
            Key::Previous => {
                app.browser.show_previous_instant();
            }
            Key::Like => {
                block_on(app.browser.toggle_like(None, true));
            }
            Key::Share => {
                if let Some(text) = app.browser.share() {
                    let mut out = io::stdout().lock();
                    writeln!(out, "{text}")?;
                }
            }
            Key::Quit => break,
            Key::Unknown => println!("{HELP}"),
        }
    }

    app.browser.presenter().set_live(false);
    app.save_navigation()
}
