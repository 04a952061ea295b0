//! Fire-and-forget user-visible messages.

use std::cell::RefCell;

use tracing::info;

/// Auto-dismiss delay applied when a notification carries no buttons.
pub const DEFAULT_DURATION_MS: u64 = 1500;

/// What pressing a notification button asks the front end to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    SignIn,
    Copy,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Ghost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub style: ButtonStyle,
    pub action: ButtonAction,
}

impl Button {
    #[must_use]
    pub fn primary(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            style: ButtonStyle::Primary,
            action,
        }
    }

    #[must_use]
    pub fn ghost(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            style: ButtonStyle::Ghost,
            action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    pub buttons: Vec<Button>,
    pub duration_ms: Option<u64>,
}

impl NotifyOptions {
    #[must_use]
    pub const fn timed(duration_ms: u64) -> Self {
        Self {
            buttons: Vec::new(),
            duration_ms: Some(duration_ms),
        }
    }

    #[must_use]
    pub const fn with_buttons(buttons: Vec<Button>) -> Self {
        Self {
            buttons,
            duration_ms: None,
        }
    }

    /// Effective auto-dismiss delay. Notifications with buttons stay until
    /// a button is pressed; a zero duration never auto-dismisses.
    #[must_use]
    pub fn auto_dismiss_ms(&self) -> Option<u64> {
        if !self.buttons.is_empty() {
            return None;
        }
        match self.duration_ms.unwrap_or(DEFAULT_DURATION_MS) {
            0 => None,
            ms => Some(ms),
        }
    }
}

/// User-visible message surface.
pub trait Notifier {
    fn notify(&self, message: &str, options: NotifyOptions);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, options: NotifyOptions) {
        (**self).notify(message, options);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn notify(&self, message: &str, options: NotifyOptions) {
        (**self).notify(message, options);
    }
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, options: NotifyOptions) {
        info!(
            message,
            buttons = options.buttons.len(),
            dismiss_ms = ?options.auto_dismiss_ms(),
            "notification"
        );
    }
}

/// Notifier that keeps every message, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: RefCell<Vec<(String, NotifyOptions)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<(String, NotifyOptions)> {
        self.seen.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, options: NotifyOptions) {
        self.seen.borrow_mut().push((message.to_string(), options));
    }
}

/// Messages raised by the core.
pub mod messages {
    pub const SYNC_UNAVAILABLE: &str = "Cloud sync is unavailable right now.";
    pub const TOGGLE_SYNC_FAILED: &str = "Could not sync with the server. Please try again later.";
    pub const LOCAL_SAVE_FAILED: &str = "Could not save your favorites on this device.";
    pub const GUEST_PROMPT: &str = "Sign in to sync your favorites in the cloud.";
    pub const LIKE_SAVED: &str = "<3 Saved to favorites!";
    pub const CATALOG_UNAVAILABLE: &str = "Unable to load quotes.";
    pub const SIGN_IN_FAILED: &str = "Sign-in failed. Please try again.";
    pub const SIGN_OUT_FAILED: &str = "Could not sign out. Please try again.";
    pub const SIGNED_OUT: &str = "You are signed out.";
    pub const REMOVED: &str = "Quote removed from your likes.";
    pub const REMOVE_FAILED: &str = "Removal is unavailable right now.";
    pub const REMOVE_NEEDS_SIGN_IN: &str = "Sign in to manage your favorites.";
    pub const REFRESH_FAILED: &str = "Could not load your likes.";
    pub const SHARE_PROMPT: &str = "Copy this quote to share it:";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_auto_dismiss() {
        assert_eq!(NotifyOptions::default().auto_dismiss_ms(), Some(DEFAULT_DURATION_MS));
        assert_eq!(NotifyOptions::timed(900).auto_dismiss_ms(), Some(900));
        assert_eq!(NotifyOptions::timed(0).auto_dismiss_ms(), None);
    }

    #[test]
    fn buttons_disable_auto_dismiss() {
        let options = NotifyOptions {
            buttons: vec![Button::primary("Sign in", ButtonAction::SignIn)],
            duration_ms: Some(500),
        };
        assert_eq!(options.auto_dismiss_ms(), None);
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("a", NotifyOptions::default());
        notifier.notify("b", NotifyOptions::timed(10));
        assert_eq!(notifier.messages(), ["a", "b"]);
        assert_eq!(notifier.last().map(|(_, o)| o.duration_ms), Some(Some(10)));
    }
}
