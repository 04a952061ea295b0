use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default number of shown positions kept for backward navigation.
pub const MAX_HISTORY: usize = 5;

const fn default_max_history() -> usize {
    MAX_HISTORY
}

/// Bounded history of shown catalog positions with a cursor.
///
/// Invariants: `history.len() <= max_history`, and whenever the history is
/// non-empty the pointer addresses one of its entries (the quote on screen).
/// Loaded state is normalized so hand-edited files uphold both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct NavigationHistory {
    history: VecDeque<usize>,
    pointer: Option<usize>,
    max_history: usize,
}

/// On-disk shape, accepted as is and normalized on conversion.
#[derive(Deserialize)]
struct StoredHistory {
    #[serde(default)]
    history: VecDeque<usize>,
    #[serde(default)]
    pointer: Option<usize>,
    #[serde(default = "default_max_history")]
    max_history: usize,
}

impl From<StoredHistory> for NavigationHistory {
    fn from(stored: StoredHistory) -> Self {
        let mut nav = Self {
            history: stored.history,
            pointer: stored.pointer,
            max_history: 1,
        };
        nav.set_max_history(stored.max_history);
        nav
    }
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl NavigationHistory {
    /// Empty history. A bound of zero is raised to one.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            history: VecDeque::new(),
            pointer: None,
            max_history: max_history.max(1),
        }
    }

    #[must_use]
    pub const fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the bound, evicting the oldest entries when it shrinks. The
    /// pointer follows its entry, or lands on the oldest kept one.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history.max(1);
        self.evict_overflow();
        self.clamp_pointer();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[must_use]
    pub const fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.history.iter().copied()
    }

    /// Position currently displayed.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.pointer.and_then(|p| self.history.get(p).copied())
    }

    /// Move forward. Replays forward history left by [`previous`], otherwise
    /// picks a new position that avoids the recent ones.
    ///
    /// [`previous`]: Self::previous
    pub fn next<R: Rng + ?Sized>(&mut self, catalog_len: usize, rng: &mut R) -> Option<usize> {
        if catalog_len == 0 {
            return None;
        }

        if catalog_len == 1 {
            if self.history.is_empty() {
                self.history.push_back(0);
            }
            self.pointer = Some(self.history.len() - 1);
            return Some(0);
        }

        if let Some(pointer) = self.pointer
            && pointer + 1 < self.history.len()
        {
            self.pointer = Some(pointer + 1);
            return self.current();
        }

        let position = self.pick(catalog_len, rng);
        self.push(position);
        Some(position)
    }

    /// Step back one entry. No wraparound: at the start this is a no-op.
    pub fn previous(&mut self) -> Option<usize> {
        match self.pointer {
            Some(pointer) if pointer > 0 => {
                self.pointer = Some(pointer - 1);
                self.current()
            }
            _ => None,
        }
    }

    /// Drop positions that no longer exist in a catalog of `catalog_len`
    /// quotes, keeping the pointer on a valid entry.
    pub fn retain_within(&mut self, catalog_len: usize) {
        let current = self.current();
        self.history.retain(|&position| position < catalog_len);
        self.pointer = if self.history.is_empty() {
            None
        } else {
            let fallback = self.history.len() - 1;
            Some(
                current
                    .and_then(|c| self.history.iter().position(|&p| p == c))
                    .unwrap_or(fallback),
            )
        };
        self.evict_overflow();
    }

    fn evict_overflow(&mut self) {
        while self.history.len() > self.max_history {
            self.history.pop_front();
            self.pointer = self.pointer.map(|p| p.saturating_sub(1));
        }
    }

    fn clamp_pointer(&mut self) {
        let last = self.history.len().checked_sub(1);
        self.pointer = last.map(|last| self.pointer.map_or(last, |p| p.min(last)));
    }

    /// Uniform pick, resampled up to `2 × catalog_len` times while it lands
    /// on a position still in the history; if it keeps colliding, the
    /// position after the last shown one.
    fn pick<R: Rng + ?Sized>(&self, catalog_len: usize, rng: &mut R) -> usize {
        let mut candidate = rng.gen_range(0..catalog_len);
        let mut attempts = 0;
        while self.history.contains(&candidate) && attempts < catalog_len * 2 {
            candidate = rng.gen_range(0..catalog_len);
            attempts += 1;
        }

        if self.history.contains(&candidate)
            && let Some(&last) = self.history.back()
        {
            trace!(last, "random pick kept colliding, stepping forward");
            return (last + 1) % catalog_len;
        }
        candidate
    }

    fn push(&mut self, position: usize) {
        self.history.push_back(position);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }
        self.pointer = Some(self.history.len() - 1);
    }
}
