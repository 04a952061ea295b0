//! Per-invocation wiring: configuration, file-backed stores, persisted
//! session and navigation state.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use haze_core::browser::{BrowseSettings, QuoteBrowser};
use haze_core::config::{EffectiveConfig, resolve_config};
use haze_core::identity::IdentityProvider;
use haze_core::likes::{LikeReconciler, LocalLikeStore};
use haze_core::nav::NavigationHistory;
use haze_core::quote::CatalogCache;
use haze_core::remote::FileRemote;
use haze_core::storage::{FileSlot, KeyValueSlot};
use haze_core::{LocalIdentity, User};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::output::OutputMode;
use crate::terminal::{TerminalNotifier, TerminalPresenter};

pub type CliBrowser =
    QuoteBrowser<FileSlot, FileRemote, TerminalNotifier, TerminalPresenter, StdRng>;

const SESSION_SLOT: &str = "session";
const NAVIGATION_SLOT: &str = "navigation";

pub struct App {
    pub config: EffectiveConfig,
    pub output: OutputMode,
    pub browser: CliBrowser,
    pub identity: LocalIdentity,
    session_slot: FileSlot,
    navigation_slot: FileSlot,
}

impl App {
    /// Open the project at `root`. `seed` makes quote picks reproducible.
    pub fn open(root: &Path, cli_json: bool, seed: Option<u64>) -> Result<Self> {
        let config = resolve_config(root, cli_json)?;
        let output = OutputMode::from_resolved(&config.resolved_output);
        let data_dir = config.data_dir.clone();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let session_slot = FileSlot::new(&data_dir, SESSION_SLOT);
        let navigation_slot = FileSlot::new(&data_dir, NAVIGATION_SLOT);
        let settings = BrowseSettings::from(&config.project);

        let likes = LikeReconciler::new(
            LocalLikeStore::new(FileSlot::new(&data_dir, &config.project.storage.likes_key)),
            FileRemote::new(&data_dir, &config.project.remote.collection),
            TerminalNotifier::new(output),
        );
        let user = load_session(&session_slot)?;
        if let Some(user) = &user {
            debug!(uid = %user.uid, "restored session");
            likes.session().begin(user.clone());
        }
        let identity = user.map_or_else(LocalIdentity::new, LocalIdentity::restored);

        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let history = load_navigation(&navigation_slot, settings.max_history);
        let browser = QuoteBrowser::new(
            CatalogCache::new(config.catalog_path.clone()),
            likes,
            TerminalPresenter::default(),
            rng,
            settings,
        )
        .with_history(history);

        Ok(Self {
            config,
            output,
            browser,
            identity,
            session_slot,
            navigation_slot,
        })
    }

    pub fn notifier(&self) -> &TerminalNotifier {
        self.browser.likes().notifier()
    }

    /// Notifications raised so far, for JSON output.
    pub fn notifications(&self) -> Vec<String> {
        self.notifier().messages()
    }

    pub fn save_navigation(&self) -> Result<()> {
        let encoded = serde_json::to_string(self.browser.history())?;
        self.navigation_slot
            .write(&encoded)
            .context("Failed to save navigation state")
    }

    /// Persist whoever the identity provider reports as signed in.
    pub fn save_session(&self) -> Result<()> {
        let encoded = serde_json::to_string(&self.identity.current_user())?;
        self.session_slot
            .write(&encoded)
            .context("Failed to save session")
    }
}

fn load_session(slot: &FileSlot) -> Result<Option<User>> {
    let Some(raw) = slot.read().context("Failed to read session")? else {
        return Ok(None);
    };
    match serde_json::from_str::<Option<User>>(&raw) {
        Ok(user) => Ok(user),
        Err(err) => {
            warn!(path = %slot.path().display(), error = %err, "ignoring unreadable session");
            Ok(None)
        }
    }
}

fn load_navigation(slot: &FileSlot, max_history: usize) -> NavigationHistory {
    let raw = match slot.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return NavigationHistory::new(max_history),
        Err(err) => {
            warn!(error = %err, "failed to read navigation state");
            return NavigationHistory::new(max_history);
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(path = %slot.path().display(), error = %err, "ignoring unreadable navigation state");
        NavigationHistory::new(max_history)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_state_files_start_fresh() {
        let dir = TempDir::new().expect("temp dir");
        let session = FileSlot::new(dir.path(), SESSION_SLOT);
        let navigation = FileSlot::new(dir.path(), NAVIGATION_SLOT);

        assert_eq!(load_session(&session).expect("load"), None);
        assert!(load_navigation(&navigation, 3).is_empty());
    }

    #[test]
    fn corrupt_state_files_are_ignored() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("session.json"), "{oops").expect("write");
        fs::write(dir.path().join("navigation.json"), "[1, 2").expect("write");

        let session = FileSlot::new(dir.path(), SESSION_SLOT);
        let navigation = FileSlot::new(dir.path(), NAVIGATION_SLOT);
        assert_eq!(load_session(&session).expect("load"), None);
        assert!(load_navigation(&navigation, 5).is_empty());
    }

    #[test]
    fn session_round_trips_through_slot() {
        let dir = TempDir::new().expect("temp dir");
        let slot = FileSlot::new(dir.path(), SESSION_SLOT);
        slot.write(r#"{"uid": "u1", "displayName": "Ada Lovelace"}"#)
            .expect("write");

        let user = load_session(&slot).expect("load").expect("signed in");
        assert_eq!(user.first_name(), Some("Ada"));

        slot.write("null").expect("write");
        assert_eq!(load_session(&slot).expect("load"), None);
    }
}
