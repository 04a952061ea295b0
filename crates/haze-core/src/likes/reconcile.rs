//! Local/remote like reconciliation.
//!
//! Local storage is the source of truth for the current device: every
//! mutation lands there first and is never rolled back because the remote
//! failed. The remote record is brought up to date best-effort, and fully
//! reconciled by [`LikeReconciler::sync_on_sign_in`], which merges both sides
//! by set union and writes the result back only when it changed something.
//!
//! # Ordering
//!
//! Single-threaded and cooperative. Toggles that reach the remote may race;
//! that is harmless because their remote effects are per-id unions and
//! removals. Account removals and forced refreshes share a single-flight
//! guard: a request made while another one is outstanding is dropped.

use std::cell::Cell;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::identity::{Session, User};
use crate::likes::local::LocalLikeStore;
use crate::likes::set::{LikeSet, needs_write_back};
use crate::notify::{NotifyOptions, Notifier, messages};
use crate::quote::QuoteId;
use crate::remote::{LIKES_FIELD, RemoteError, RemoteLikeStore};
use crate::storage::KeyValueSlot;

/// Summary of a sign-in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Set to render: the merge result, or the untouched local set when the
    /// remote could not be read.
    pub likes: LikeSet,
    /// Number of ids the remote record held before the merge.
    pub remote_count: usize,
    /// Number of ids the device held before the merge.
    pub local_count: usize,
    /// Whether the merged set was written back to the remote record.
    pub written_back: bool,
    /// Failure surfaced to the user, if any.
    pub error: Option<ErrorCode>,
}

impl SyncReport {
    /// Returns `true` if neither side gained anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.written_back && self.error.is_none() && self.likes.len() == self.local_count
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Target state equals the current state; nothing happened.
    Unchanged { liked: bool },
    /// Applied locally; nobody is signed in so the remote was not touched.
    LocalOnly { liked: bool },
    /// Applied locally and on the remote record.
    Synced { liked: bool },
    /// Applied locally; the remote update failed and was reported.
    SyncFailed { liked: bool },
    /// The local store could not be written; nothing changed.
    LocalFailed,
}

impl ToggleOutcome {
    /// Like state after the toggle, `None` when the local write failed.
    #[must_use]
    pub const fn liked(self) -> Option<bool> {
        match self {
            Self::Unchanged { liked }
            | Self::LocalOnly { liked }
            | Self::Synced { liked }
            | Self::SyncFailed { liked } => Some(liked),
            Self::LocalFailed => None,
        }
    }

    /// Whether the caller may want to prompt the user to sign in.
    #[must_use]
    pub const fn wants_sign_in(self) -> bool {
        matches!(self, Self::LocalOnly { .. })
    }
}

/// Result of an account-view removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    RemoteFailed,
    NotLiked,
    NotSignedIn,
    /// Another removal or refresh was in flight; the request was dropped.
    Dropped,
    LocalFailed,
}

/// Boolean single-flight flag.
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: Cell<bool>,
}

impl SingleFlight {
    /// Claim the flag, `None` if it is already held.
    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(FlightGuard { flight: self })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

/// Releases the flag on drop.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.busy.set(false);
    }
}

enum TogglePlan {
    Done(ToggleOutcome),
    Push { uid: String, liked: bool },
}

/// Keeps the local like store, the remote record, and the session consistent.
#[derive(Debug)]
pub struct LikeReconciler<S, R, N> {
    local: LocalLikeStore<S>,
    remote: R,
    notifier: N,
    session: Session,
    flight: SingleFlight,
}

impl<S, R, N> LikeReconciler<S, R, N>
where
    S: KeyValueSlot,
    R: RemoteLikeStore,
    N: Notifier,
{
    pub fn new(local: LocalLikeStore<S>, remote: R, notifier: N) -> Self {
        Self {
            local,
            remote,
            notifier,
            session: Session::new(),
            flight: SingleFlight::default(),
        }
    }

    pub const fn local(&self) -> &LocalLikeStore<S> {
        &self.local
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Whether a removal or forced refresh is outstanding.
    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Current device view of the like set.
    pub fn likes(&self) -> LikeSet {
        self.local.get()
    }

    pub fn is_liked(&self, id: &QuoteId) -> bool {
        self.local.is_liked(id)
    }

    /// Sign-in transition: remember the user, then reconcile.
    ///
    /// The returned report is only produced after local storage holds the
    /// merged set, so a caller awaiting it can render straight away.
    pub async fn on_sign_in(&self, user: User) -> SyncReport {
        self.session.begin(user.clone());
        self.sync_on_sign_in(&user, false).await
    }

    /// Sign-out transition: forget the user. Local likes stay untouched.
    pub fn on_sign_out(&self) {
        if let Some(user) = self.session.current() {
            debug!(uid = %user.uid, "session ended, local likes kept");
        }
        self.session.end();
    }

    /// Merge the remote record with local likes.
    ///
    /// 1. Read the remote record (absent ⇒ empty) alongside the local set.
    /// 2. Union both sides.
    /// 3. Persist the union locally, unconditionally.
    /// 4. Write the sorted union back when forced or when it differs from
    ///    the sorted remote sequence.
    ///
    /// Never fails: remote errors are logged and surfaced once through the
    /// notifier, and the local merge computed before the failure is kept.
    pub async fn sync_on_sign_in(&self, user: &User, force_refresh: bool) -> SyncReport {
        let (remote, local) =
            futures::join!(self.remote.read(&user.uid), async { self.local.get() });
        let local_count = local.len();

        let remote_likes = match remote {
            Ok(record) => record.map(|r| r.likes).unwrap_or_default(),
            Err(err) => {
                warn!(uid = %user.uid, error = %err, "failed to read cloud likes");
                self.notifier
                    .notify(messages::SYNC_UNAVAILABLE, NotifyOptions::default());
                return SyncReport {
                    likes: local,
                    remote_count: 0,
                    local_count,
                    written_back: false,
                    error: Some(err.code()),
                };
            }
        };

        let merged = LikeSet::from_ids(remote_likes.iter()).union(&local);
        if let Err(err) = self.local.set(&merged) {
            warn!(uid = %user.uid, error = %err, "failed to persist merged likes locally");
            self.notifier
                .notify(messages::LOCAL_SAVE_FAILED, NotifyOptions::default());
        }

        let mut report = SyncReport {
            likes: merged,
            remote_count: remote_likes.len(),
            local_count,
            written_back: false,
            error: None,
        };

        if needs_write_back(&remote_likes, &report.likes, force_refresh) {
            match self
                .remote
                .merge_write(&user.uid, &report.likes.to_sorted_vec())
                .await
            {
                Ok(()) => report.written_back = true,
                Err(err) => {
                    warn!(uid = %user.uid, error = %err, "failed to write merged likes");
                    self.notifier
                        .notify(messages::SYNC_UNAVAILABLE, NotifyOptions::default());
                    report.error = Some(err.code());
                }
            }
        }

        info!(
            uid = %user.uid,
            remote = report.remote_count,
            local = report.local_count,
            merged = report.likes.len(),
            written_back = report.written_back,
            forced = force_refresh,
            "likes synced"
        );
        report
    }

    /// Forced sync guarded by the single-flight flag. `None` when dropped.
    pub fn refresh(&self, user: User) -> impl Future<Output = Option<SyncReport>> + '_ {
        let guard = self.flight.try_begin();
        async move {
            let Some(_guard) = guard else {
                debug!(uid = %user.uid, "refresh dropped, another request is in flight");
                return None;
            };
            Some(self.sync_on_sign_in(&user, true).await)
        }
    }

    /// Toggle the like on `id`, or force it to `force`.
    ///
    /// The local store is updated before this returns; the returned future
    /// only carries the remote update. Dropping it skips the remote update
    /// and leaves the local change in place.
    pub fn toggle<'a>(
        &'a self,
        id: &QuoteId,
        force: Option<bool>,
    ) -> impl Future<Output = ToggleOutcome> + use<'a, S, R, N> {
        let id = id.clone();
        let plan = self.apply_locally(&id, force);
        async move {
            match plan {
                TogglePlan::Done(outcome) => outcome,
                TogglePlan::Push { uid, liked } => match self.push_delta(&uid, &id, liked).await {
                    Ok(()) => ToggleOutcome::Synced { liked },
                    Err(err) => {
                        warn!(uid = %uid, quote_id = %id, liked, error = %err, "failed to sync like");
                        self.notifier
                            .notify(messages::TOGGLE_SYNC_FAILED, NotifyOptions::default());
                        ToggleOutcome::SyncFailed { liked }
                    }
                },
            }
        }
    }

    /// Account-view removal: a forced unlike guarded by the single-flight
    /// flag. The flag is claimed before this returns.
    pub fn remove_like<'a>(
        &'a self,
        id: &QuoteId,
    ) -> impl Future<Output = RemoveOutcome> + use<'a, S, R, N> {
        let id = id.clone();
        let user = self.session.current();
        let guard = user.as_ref().and_then(|_| self.flight.try_begin());

        let plan = match (&user, &guard) {
            (None, _) => {
                self.notifier
                    .notify(messages::REMOVE_NEEDS_SIGN_IN, NotifyOptions::default());
                Err(RemoveOutcome::NotSignedIn)
            }
            (Some(_), None) => {
                debug!(quote_id = %id, "removal dropped, another request is in flight");
                Err(RemoveOutcome::Dropped)
            }
            (Some(_), Some(_)) if !self.local.is_liked(&id) => Err(RemoveOutcome::NotLiked),
            (Some(user), Some(_)) => match self.apply_locally(&id, Some(false)) {
                TogglePlan::Push { uid, .. } => Ok(uid),
                TogglePlan::Done(ToggleOutcome::LocalFailed) => Err(RemoveOutcome::LocalFailed),
                TogglePlan::Done(_) => Ok(user.uid.clone()),
            },
        };

        async move {
            let _guard = guard;
            let uid = match plan {
                Ok(uid) => uid,
                Err(outcome) => return outcome,
            };
            match self.push_delta(&uid, &id, false).await {
                Ok(()) => {
                    self.notifier.notify(messages::REMOVED, NotifyOptions::default());
                    RemoveOutcome::Removed
                }
                Err(err) => {
                    warn!(uid = %uid, quote_id = %id, error = %err, "failed to remove like remotely");
                    self.notifier
                        .notify(messages::REMOVE_FAILED, NotifyOptions::default());
                    RemoveOutcome::RemoteFailed
                }
            }
        }
    }

    fn apply_locally(&self, id: &QuoteId, force: Option<bool>) -> TogglePlan {
        let current = self.local.is_liked(id);
        let liked = force.unwrap_or(!current);
        if liked == current {
            return TogglePlan::Done(ToggleOutcome::Unchanged { liked });
        }

        let written = if liked {
            self.local.add(id)
        } else {
            self.local.remove(id)
        };
        if let Err(err) = written {
            warn!(quote_id = %id, liked, error = %err, "failed to save like locally");
            self.notifier
                .notify(messages::LOCAL_SAVE_FAILED, NotifyOptions::default());
            return TogglePlan::Done(ToggleOutcome::LocalFailed);
        }
        debug!(quote_id = %id, liked, "like applied locally");

        match self.session.current() {
            Some(user) => TogglePlan::Push {
                uid: user.uid,
                liked,
            },
            None => TogglePlan::Done(ToggleOutcome::LocalOnly { liked }),
        }
    }

    /// Apply one like/unlike to the remote record. A removal against a
    /// missing record creates an empty record instead of failing.
    async fn push_delta(&self, uid: &str, id: &QuoteId, liked: bool) -> Result<(), RemoteError> {
        let values = std::slice::from_ref(id);
        if liked {
            return self.remote.union_append(uid, LIKES_FIELD, values).await;
        }
        match self.remote.remove_values(uid, LIKES_FIELD, values).await {
            Err(err) if err.is_not_found() => {
                debug!(uid, "no cloud record yet, creating an empty one");
                self.remote.merge_write(uid, &[]).await
            }
            other => other,
        }
    }
}
