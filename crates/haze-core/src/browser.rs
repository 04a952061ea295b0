//! The browsing context: catalog, navigation, fade gate, and likes behind
//! one owner.
//!
//! Auth transitions enter through [`QuoteBrowser::on_auth_change`] only. A
//! sign-in is rendered after the reconciler has stored the merged set
//! locally, so the presenter never shows a half-synced like state.

use std::future::Future;

use futures::{FutureExt, StreamExt};
use rand::RngCore;
use tracing::{debug, error, warn};

use crate::account::AccountView;
use crate::config::ProjectConfig;
use crate::identity::{AuthEvents, IdentityProvider, User};
use crate::likes::{LikeReconciler, SyncReport, ToggleOutcome};
use crate::nav::{FadeStep, NavAction, NavigationHistory, TransitionGate};
use crate::notify::{Button, ButtonAction, NotifyOptions, Notifier, messages};
use crate::quote::{CatalogCache, Quote, QuoteCatalog};
use crate::remote::RemoteLikeStore;
use crate::storage::KeyValueSlot;

/// Tunables for a [`QuoteBrowser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseSettings {
    pub max_history: usize,
    pub fade_ms: u64,
    pub like_saved_ms: u64,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for BrowseSettings {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            max_history: config.browse.max_history,
            fade_ms: config.browse.fade_duration_ms,
            like_saved_ms: config.notify.like_saved_duration_ms,
        }
    }
}

/// Snapshot handed to presenters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserView {
    pub quote: Option<Quote>,
    pub liked: bool,
    pub user: Option<User>,
}

/// Rendering surface.
pub trait Presenter {
    fn render(&self, view: &BrowserView);
}

impl<P: Presenter + ?Sized> Presenter for &P {
    fn render(&self, view: &BrowserView) {
        (**self).render(view);
    }
}

/// Presenter that renders nothing. Callers read [`QuoteBrowser::view`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn render(&self, _view: &BrowserView) {}
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Rendered immediately.
    Shown(usize),
    /// Fade started towards this position; it renders on the swap.
    Fading(usize),
    /// A fade is running; the request waits in the pending slot.
    Queued,
    /// Nothing to move to.
    Stayed,
}

pub struct QuoteBrowser<S, R, N, P, G> {
    catalog: CatalogCache,
    nav: NavigationHistory,
    gate: TransitionGate,
    likes: LikeReconciler<S, R, N>,
    presenter: P,
    rng: G,
    settings: BrowseSettings,
    shown: Option<usize>,
    target: Option<usize>,
}

impl<S, R, N, P, G> QuoteBrowser<S, R, N, P, G>
where
    S: KeyValueSlot,
    R: RemoteLikeStore,
    N: Notifier,
    P: Presenter,
    G: RngCore,
{
    pub fn new(
        catalog: CatalogCache,
        likes: LikeReconciler<S, R, N>,
        presenter: P,
        rng: G,
        settings: BrowseSettings,
    ) -> Self {
        Self {
            catalog,
            nav: NavigationHistory::new(settings.max_history),
            gate: TransitionGate::new(settings.fade_ms),
            likes,
            presenter,
            rng,
            settings,
            shown: None,
            target: None,
        }
    }

    /// Continue from a persisted history, bounded by the configured
    /// `max_history` rather than the one it was saved with.
    #[must_use]
    pub fn with_history(mut self, mut nav: NavigationHistory) -> Self {
        nav.set_max_history(self.settings.max_history);
        self.nav = nav;
        self
    }

    pub const fn history(&self) -> &NavigationHistory {
        &self.nav
    }

    pub const fn likes(&self) -> &LikeReconciler<S, R, N> {
        &self.likes
    }

    pub const fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    pub const fn settings(&self) -> BrowseSettings {
        self.settings
    }

    pub const fn is_fading(&self) -> bool {
        self.gate.is_fading()
    }

    /// Load the catalog and show a fresh quote without fading.
    ///
    /// Returns `false` when the catalog could not be loaded; the user has
    /// been notified and nothing is shown.
    pub fn start(&mut self) -> bool {
        if !self.load_catalog() {
            return false;
        }
        self.show_next_instant();
        true
    }

    /// Load the catalog and show the quote the history points at, or a
    /// fresh one when the history is empty.
    pub fn resume(&mut self) -> bool {
        if !self.load_catalog() {
            return false;
        }
        match self.nav.current() {
            Some(position) => self.show_position(position),
            None => {
                self.show_next_instant();
            }
        }
        true
    }

    pub fn show_next(&mut self, now_ms: u64) -> NavOutcome {
        self.navigate(NavAction::Next, Some(now_ms))
    }

    pub fn show_previous(&mut self, now_ms: u64) -> NavOutcome {
        self.navigate(NavAction::Previous, Some(now_ms))
    }

    pub fn show_next_instant(&mut self) -> NavOutcome {
        self.navigate(NavAction::Next, None)
    }

    pub fn show_previous_instant(&mut self) -> NavOutcome {
        self.navigate(NavAction::Previous, None)
    }

    /// The front end finished a fade phase.
    pub fn transition_end(&mut self, now_ms: u64) -> Option<NavOutcome> {
        let step = self.gate.on_transition_end()?;
        self.apply_fade_step(step, now_ms)
    }

    /// Clock tick; finishes a fade whose end signal never arrived.
    pub fn tick(&mut self, now_ms: u64) -> Option<NavOutcome> {
        let step = self.gate.tick(now_ms)?;
        self.apply_fade_step(step, now_ms)
    }

    /// Quote on screen.
    pub fn current_quote(&self) -> Option<&Quote> {
        self.catalog.loaded()?.get(self.shown?)
    }

    pub fn view(&self) -> BrowserView {
        let quote = self.current_quote().cloned();
        let liked = quote
            .as_ref()
            .is_some_and(|quote| self.likes.is_liked(&quote.id));
        BrowserView {
            quote,
            liked,
            user: self.likes.session().current(),
        }
    }

    /// Toggle (or force) the like on the quote on screen.
    ///
    /// The local change and the re-render happen before this returns. A
    /// forced like of a quote that was not liked yet confirms with a short
    /// notification; a guest toggle optionally prompts for sign-in.
    pub fn toggle_like(
        &self,
        force: Option<bool>,
        prompt_guest: bool,
    ) -> impl Future<Output = Option<ToggleOutcome>> + '_ {
        let pending = self.current_quote().map(|quote| {
            let was_liked = self.likes.is_liked(&quote.id);
            let pending = self.likes.toggle(&quote.id, force);
            if force == Some(true) && !was_liked && self.likes.is_liked(&quote.id) {
                self.likes.notifier().notify(
                    messages::LIKE_SAVED,
                    NotifyOptions::timed(self.settings.like_saved_ms),
                );
            }
            pending
        });
        if pending.is_some() {
            self.refresh_view();
        }

        async move {
            let outcome = pending?.await;
            if prompt_guest && outcome.liked() == Some(true) && outcome.wants_sign_in() {
                self.likes.notifier().notify(
                    messages::GUEST_PROMPT,
                    NotifyOptions::with_buttons(vec![
                        Button::primary("Sign in", ButtonAction::SignIn),
                        Button::ghost("Later", ButtonAction::Dismiss),
                    ]),
                );
            }
            Some(outcome)
        }
    }

    /// Single dispatch point for auth transitions.
    pub async fn on_auth_change(&self, user: Option<User>) -> Option<SyncReport> {
        let report = match user {
            Some(user) => Some(self.likes.on_sign_in(user).await),
            None => {
                self.likes.on_sign_out();
                None
            }
        };
        self.refresh_view();
        report
    }

    /// Handle every auth transition already queued on `events`, in order,
    /// finishing each before starting the next. One entry per transition.
    pub async fn drain_auth_events(&self, events: &mut AuthEvents) -> Vec<Option<SyncReport>> {
        let mut handled = Vec::new();
        while let Some(Some(event)) = events.next().now_or_never() {
            handled.push(self.on_auth_change(event).await);
        }
        handled
    }

    /// Ask the identity provider to sign in. The resulting transition still
    /// arrives through [`on_auth_change`](Self::on_auth_change).
    pub async fn sign_in<I: IdentityProvider>(&self, identity: &I) -> Option<User> {
        match identity.sign_in().await {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.likes
                    .notifier()
                    .notify(messages::SIGN_IN_FAILED, NotifyOptions::default());
                None
            }
        }
    }

    pub fn share_text(&self) -> Option<String> {
        self.current_quote().map(Quote::share_text)
    }

    /// Offer the quote on screen for copying.
    pub fn share(&self) -> Option<String> {
        let text = self.share_text()?;
        self.likes.notifier().notify(
            messages::SHARE_PROMPT,
            NotifyOptions::with_buttons(vec![
                Button::primary("Copy", ButtonAction::Copy),
                Button::ghost("Close", ButtonAction::Dismiss),
            ]),
        );
        Some(text)
    }

    pub fn account(&self) -> AccountView<'_, S, R, N> {
        AccountView::new(&self.likes, &self.catalog)
    }

    fn load_catalog(&mut self) -> bool {
        match self.catalog.get_or_load() {
            Ok(catalog) => {
                let len = catalog.len();
                self.nav.retain_within(len);
                true
            }
            Err(err) => {
                error!(path = %self.catalog.path().display(), error = %err, "failed to load quotes");
                self.likes
                    .notifier()
                    .notify(messages::CATALOG_UNAVAILABLE, NotifyOptions::default());
                false
            }
        }
    }

    fn catalog_len(&self) -> usize {
        self.catalog.loaded().map_or(0, QuoteCatalog::len)
    }

    /// `now_ms` of `None` skips the fade.
    fn navigate(&mut self, action: NavAction, now_ms: Option<u64>) -> NavOutcome {
        if now_ms.is_some() && !self.gate.admit(action) {
            debug!(?action, "navigation queued behind running fade");
            return NavOutcome::Queued;
        }

        let position = match action {
            NavAction::Next => {
                let len = self.catalog_len();
                self.nav.next(len, &mut self.rng)
            }
            NavAction::Previous => self.nav.previous(),
        };
        let Some(position) = position else {
            return NavOutcome::Stayed;
        };

        match now_ms {
            Some(now_ms) => {
                self.gate.begin(now_ms);
                self.target = Some(position);
                NavOutcome::Fading(position)
            }
            None => {
                self.show_position(position);
                NavOutcome::Shown(position)
            }
        }
    }

    fn apply_fade_step(&mut self, step: FadeStep, now_ms: u64) -> Option<NavOutcome> {
        match step {
            FadeStep::Swap => {
                self.swap_in_target();
                None
            }
            FadeStep::Done { swap, next } => {
                if swap {
                    self.swap_in_target();
                }
                next.map(|action| self.navigate(action, Some(now_ms)))
            }
        }
    }

    fn swap_in_target(&mut self) {
        if let Some(position) = self.target.take() {
            self.show_position(position);
        }
    }

    fn show_position(&mut self, position: usize) {
        self.shown = Some(position);
        self.refresh_view();
    }

    fn refresh_view(&self) {
        self.presenter.render(&self.view());
    }
}
