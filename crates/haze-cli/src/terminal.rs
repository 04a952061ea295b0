//! Terminal notification surface and presenter.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};

use haze_core::browser::{BrowserView, Presenter};
use haze_core::notify::{ButtonStyle, Notifier, NotifyOptions};
use tracing::debug;

use crate::output::OutputMode;

/// Prints notifications to stderr (except in JSON mode) and keeps them so
/// JSON output can carry them.
#[derive(Debug)]
pub struct TerminalNotifier {
    mode: OutputMode,
    seen: RefCell<Vec<String>>,
}

impl TerminalNotifier {
    pub const fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Every message shown so far.
    pub fn messages(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, options: NotifyOptions) {
        debug!(message, buttons = options.buttons.len(), "notify");
        self.seen.borrow_mut().push(message.to_string());
        if self.mode.is_json() {
            return;
        }
        let mut line = format!("note: {message}");
        for button in &options.buttons {
            match button.style {
                ButtonStyle::Primary => line.push_str(&format!(" [{}]", button.label)),
                ButtonStyle::Ghost => line.push_str(&format!(" ({})", button.label)),
            }
        }
        eprintln!("{line}");
    }
}

/// Prints every rendered frame while live; silent otherwise so one-shot
/// commands print only their final result.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    live: Cell<bool>,
}

impl TerminalPresenter {
    pub fn set_live(&self, live: bool) {
        self.live.set(live);
    }
}

impl Presenter for TerminalPresenter {
    fn render(&self, view: &BrowserView) {
        if !self.live.get() {
            return;
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        // A closed stdout ends the session on the next read anyway.
        let _ = write_frame(&mut out, view);
    }
}

/// One quote as shown by the interactive browser.
pub fn write_frame(w: &mut dyn Write, view: &BrowserView) -> io::Result<()> {
    let Some(quote) = &view.quote else {
        return writeln!(w, "(no quote)");
    };
    writeln!(w)?;
    writeln!(w, "  \"{}\"", quote.text)?;
    if let Some(attribution) = quote.attribution() {
        writeln!(w, "      {attribution}")?;
    }
    let heart = if view.liked { "<3 liked" } else { "   not liked" };
    match &view.user {
        Some(user) => writeln!(w, "  [{}]  {heart}  as {}", quote.id, user.uid),
        None => writeln!(w, "  [{}]  {heart}", quote.id),
    }
}
