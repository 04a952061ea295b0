//! Account screen: greeting, liked quotes, refresh, and removal.

use std::future::Future;

use tracing::warn;

use crate::identity::{IdentityProvider, User};
use crate::likes::{LikeReconciler, RemoveOutcome, SyncReport};
use crate::notify::{NotifyOptions, Notifier, messages};
use crate::quote::{CatalogCache, Quote, QuoteId};
use crate::remote::RemoteLikeStore;
use crate::storage::KeyValueSlot;

/// Greeting line for `user`.
#[must_use]
pub fn greeting(user: Option<&User>) -> String {
    match user {
        None => "Hello!".to_string(),
        Some(user) => match user.first_name() {
            Some(first) => format!("Hello, {first}!"),
            None => "Hello, you!".to_string(),
        },
    }
}

pub struct AccountView<'a, S, R, N> {
    likes: &'a LikeReconciler<S, R, N>,
    catalog: &'a CatalogCache,
}

impl<'a, S, R, N> AccountView<'a, S, R, N>
where
    S: KeyValueSlot,
    R: RemoteLikeStore,
    N: Notifier,
{
    pub const fn new(likes: &'a LikeReconciler<S, R, N>, catalog: &'a CatalogCache) -> Self {
        Self { likes, catalog }
    }

    pub fn user(&self) -> Option<User> {
        self.likes.session().current()
    }

    pub fn greeting(&self) -> String {
        greeting(self.user().as_ref())
    }

    /// Catalog quotes for the local like set, ordered by id. Ids missing
    /// from the catalog are skipped.
    pub fn liked_quotes(&self) -> Vec<Quote> {
        let catalog = match self.catalog.get_or_load() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "account view cannot resolve liked quotes");
                self.likes
                    .notifier()
                    .notify(messages::REFRESH_FAILED, NotifyOptions::default());
                return Vec::new();
            }
        };
        self.likes
            .likes()
            .iter()
            .filter_map(|id| catalog.find(id).cloned())
            .collect()
    }

    /// Forced sync for the signed-in user. `None` when signed out or when
    /// another removal or refresh holds the single-flight guard.
    pub fn refresh(&self) -> impl Future<Output = Option<SyncReport>> + use<'a, S, R, N> {
        let likes = self.likes;
        let pending = self.user().map(|user| likes.refresh(user));
        async move { pending?.await }
    }

    /// Remove `id` from the likes, locally and on the remote record.
    pub fn remove(&self, id: &QuoteId) -> impl Future<Output = RemoveOutcome> + use<'a, S, R, N> {
        self.likes.remove_like(id)
    }

    /// Sign out through the identity provider. Local likes stay.
    pub async fn sign_out<I: IdentityProvider>(&self, identity: &I) -> bool {
        match identity.sign_out().await {
            Ok(()) => {
                self.likes.on_sign_out();
                self.likes
                    .notifier()
                    .notify(messages::SIGNED_OUT, NotifyOptions::default());
                true
            }
            Err(err) => {
                warn!(error = %err, "sign-out failed");
                self.likes
                    .notifier()
                    .notify(messages::SIGN_OUT_FAILED, NotifyOptions::default());
                false
            }
        }
    }
}
