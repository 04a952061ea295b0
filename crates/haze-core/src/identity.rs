//! Identity provider seam and the session it drives.

use std::cell::RefCell;

use async_trait::async_trait;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ErrorCode;

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        rename = "photoURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// First whitespace-separated word of the display name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in was cancelled")]
    Cancelled,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Cancelled | Self::Unavailable(_) => ErrorCode::SignInFailed,
        }
    }
}

/// Stream of auth transitions: `Some(user)` on sign-in, `None` on sign-out.
pub type AuthEvents = UnboundedReceiver<Option<User>>;

/// External identity provider.
#[async_trait(?Send)]
pub trait IdentityProvider {
    fn current_user(&self) -> Option<User>;

    async fn sign_in(&self) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to transitions. Subscribers receive events in the order
    /// they subscribed.
    fn subscribe(&self) -> AuthEvents;
}

/// In-process identity provider.
///
/// `sign_in` yields the configured profile; with no profile configured it
/// fails with [`AuthError::Unavailable`].
#[derive(Debug, Default)]
pub struct LocalIdentity {
    profile: RefCell<Option<User>>,
    current: RefCell<Option<User>>,
    subscribers: RefCell<Vec<UnboundedSender<Option<User>>>>,
}

impl LocalIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that signs in as `profile`.
    #[must_use]
    pub fn with_profile(profile: User) -> Self {
        let identity = Self::default();
        identity.set_profile(Some(profile));
        identity
    }

    /// Provider restored with an existing session, without emitting events.
    #[must_use]
    pub fn restored(user: User) -> Self {
        let identity = Self::with_profile(user.clone());
        *identity.current.borrow_mut() = Some(user);
        identity
    }

    pub fn set_profile(&self, profile: Option<User>) {
        *self.profile.borrow_mut() = profile;
    }

    fn emit(&self, event: &Option<User>) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

#[async_trait(?Send)]
impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    async fn sign_in(&self) -> Result<User, AuthError> {
        let user = self
            .profile
            .borrow()
            .clone()
            .ok_or_else(|| AuthError::Unavailable("no profile configured".to_string()))?;
        *self.current.borrow_mut() = Some(user.clone());
        info!(uid = %user.uid, "signed in");
        self.emit(&Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.current.borrow_mut().take();
        if let Some(user) = previous {
            info!(uid = %user.uid, "signed out");
        }
        self.emit(&None);
        Ok(())
    }

    fn subscribe(&self) -> AuthEvents {
        let (tx, rx) = unbounded();
        self.subscribers.borrow_mut().push(tx);
        debug!(subscribers = self.subscribers.borrow().len(), "auth subscriber added");
        rx
    }
}

/// The core's view of who is signed in. Only reacts to transitions.
#[derive(Debug, Default)]
pub struct Session {
    user: RefCell<Option<User>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    pub fn begin(&self, user: User) {
        *self.user.borrow_mut() = Some(user);
    }

    /// Drop every reference to the signed-in identity.
    pub fn end(&self) {
        self.user.borrow_mut().take();
    }
}
