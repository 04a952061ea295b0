//! Fade gate for quote changes.
//!
//! A change fades the current quote out, swaps the content, and fades the
//! new one in. While a fade runs, further requests are not executed: they
//! land in a single pending slot where the latest request overwrites any
//! earlier one, and the survivor runs once the fade completes. Completion is
//! normally signalled by the front end; a fallback deadline of three fade
//! durations finishes the transition if that signal never arrives.

use tracing::{debug, trace};

/// Multiplier applied to the fade duration for the fallback deadline.
pub const FALLBACK_FACTOR: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FadeOut,
    FadeIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fade {
    phase: Phase,
    deadline_ms: u64,
}

/// What the caller must do after a fade event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStep {
    /// Fade-out finished: swap in the new content and fade it in.
    Swap,
    /// Transition over. `swap` is set when the content was never swapped
    /// (the fallback fired during fade-out); `next` is the queued request.
    Done { swap: bool, next: Option<NavAction> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGate {
    fade_ms: u64,
    active: Option<Fade>,
    pending: Option<NavAction>,
}

impl TransitionGate {
    #[must_use]
    pub const fn new(fade_ms: u64) -> Self {
        Self {
            fade_ms,
            active: None,
            pending: None,
        }
    }

    #[must_use]
    pub const fn fade_ms(&self) -> u64 {
        self.fade_ms
    }

    #[must_use]
    pub const fn fallback_ms(&self) -> u64 {
        self.fade_ms.saturating_mul(FALLBACK_FACTOR)
    }

    #[must_use]
    pub const fn is_fading(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<NavAction> {
        self.pending
    }

    /// Returns `true` if `action` may run now. Otherwise it replaces
    /// whatever was pending.
    pub fn admit(&mut self, action: NavAction) -> bool {
        if self.active.is_none() {
            return true;
        }
        if let Some(dropped) = self.pending.replace(action) {
            trace!(?dropped, ?action, "pending navigation overwritten");
        }
        false
    }

    /// Start fading out at `now_ms`.
    pub fn begin(&mut self, now_ms: u64) {
        self.active = Some(Fade {
            phase: Phase::FadeOut,
            deadline_ms: now_ms.saturating_add(self.fallback_ms()),
        });
    }

    /// Front-end signal that the running fade phase ended. `None` when no
    /// fade is running.
    pub fn on_transition_end(&mut self) -> Option<FadeStep> {
        let fade = self.active.as_mut()?;
        match fade.phase {
            Phase::FadeOut => {
                fade.phase = Phase::FadeIn;
                Some(FadeStep::Swap)
            }
            Phase::FadeIn => Some(self.finish(false)),
        }
    }

    /// Fire the fallback once its deadline has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<FadeStep> {
        let fade = self.active?;
        if now_ms < fade.deadline_ms {
            return None;
        }
        debug!(
            phase = ?fade.phase,
            overdue_ms = now_ms - fade.deadline_ms,
            "transition end never arrived, finishing"
        );
        Some(self.finish(fade.phase == Phase::FadeOut))
    }

    fn finish(&mut self, swap: bool) -> FadeStep {
        self.active = None;
        FadeStep::Done {
            swap,
            next: self.pending.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_gate_admits() {
        let mut gate = TransitionGate::new(250);
        assert!(gate.admit(NavAction::Next));
        assert_eq!(gate.pending(), None);
        assert_eq!(gate.on_transition_end(), None);
        assert_eq!(gate.tick(10_000), None);
    }

    #[test]
    fn full_fade_cycle() {
        let mut gate = TransitionGate::new(250);
        gate.begin(0);
        assert!(gate.is_fading());
        assert_eq!(gate.on_transition_end(), Some(FadeStep::Swap));
        assert_eq!(
            gate.on_transition_end(),
            Some(FadeStep::Done {
                swap: false,
                next: None
            })
        );
        assert!(!gate.is_fading());
    }

    #[test]
    fn latest_request_wins_the_pending_slot() {
        let mut gate = TransitionGate::new(250);
        gate.begin(0);
        assert!(!gate.admit(NavAction::Next));
        assert!(!gate.admit(NavAction::Previous));
        assert!(!gate.admit(NavAction::Next));
        assert_eq!(gate.pending(), Some(NavAction::Next));

        gate.on_transition_end();
        assert_eq!(
            gate.on_transition_end(),
            Some(FadeStep::Done {
                swap: false,
                next: Some(NavAction::Next)
            })
        );
        assert_eq!(gate.pending(), None);
    }

    #[test]
    fn fallback_fires_after_three_fades() {
        let mut gate = TransitionGate::new(250);
        gate.begin(1_000);
        gate.admit(NavAction::Previous);
        assert_eq!(gate.tick(1_749), None);
        assert_eq!(
            gate.tick(1_750),
            Some(FadeStep::Done {
                swap: true,
                next: Some(NavAction::Previous)
            })
        );
        assert!(!gate.is_fading());
        assert_eq!(gate.tick(5_000), None);
    }

    #[test]
    fn fallback_after_swap_does_not_swap_again() {
        let mut gate = TransitionGate::new(100);
        gate.begin(0);
        assert_eq!(gate.on_transition_end(), Some(FadeStep::Swap));
        assert_eq!(
            gate.tick(300),
            Some(FadeStep::Done {
                swap: false,
                next: None
            })
        );
    }

    #[test]
    fn late_transition_end_after_fallback_is_ignored() {
        let mut gate = TransitionGate::new(100);
        gate.begin(0);
        gate.tick(300);
        assert_eq!(gate.on_transition_end(), None);
    }
}
