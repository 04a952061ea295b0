//! haze-core library.
//!
//! Quote browsing with device-local likes that reconcile against a per-user
//! remote record on sign-in. See [`likes::reconcile`] for the merge rules.

pub mod account;
pub mod browser;
pub mod config;
pub mod error;
pub mod identity;
pub mod likes;
pub mod lock;
pub mod nav;
pub mod notify;
pub mod quote;
pub mod remote;
pub mod storage;

pub use account::AccountView;
pub use browser::{BrowseSettings, BrowserView, NavOutcome, NoopPresenter, Presenter, QuoteBrowser};
pub use identity::{IdentityProvider, LocalIdentity, User};
pub use likes::{LikeReconciler, LikeSet, LocalLikeStore, RemoveOutcome, SyncReport, ToggleOutcome};
pub use quote::{CatalogCache, Quote, QuoteCatalog, QuoteId};

/// # Conventions
///
/// - **Errors**: typed `thiserror` enums per seam, each mapping to an
///   [`error::ErrorCode`]; `anyhow::Result` at the configuration layer.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
/// - **Async**: single-threaded; futures are `?Send` and driven by the caller's executor.
pub fn init() {
    tracing::info!("haze-core initialized");
}
