use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::nav::MAX_HISTORY;
use crate::notify::DEFAULT_DURATION_MS;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HAZE_DATA_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Quote catalog, relative to the project root unless absolute.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_likes_key")]
    pub likes_key: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            likes_key: default_likes_key(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_fade_duration_ms")]
    pub fade_duration_ms: u64,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            fade_duration_ms: default_fade_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_duration_ms")]
    pub default_duration_ms: u64,
    #[serde(default = "default_like_saved_duration_ms")]
    pub like_saved_duration_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_notify_duration_ms(),
            like_saved_duration_ms: default_like_saved_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
    pub catalog_path: PathBuf,
    pub data_dir: PathBuf,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".haze/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("haze/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    let env_data_dir = env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let data_dir = resolve_data_dir(project_root, &project, &user, env_data_dir);
    let catalog_path = anchor(project_root, &project.catalog.path);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
        catalog_path,
        data_dir,
    })
}

/// `HAZE_DATA_DIR` > project `storage.data_dir` > user `data_dir` >
/// `<root>/.haze`. Relative paths are anchored at the project root.
fn resolve_data_dir(
    project_root: &Path,
    project: &ProjectConfig,
    user: &UserConfig,
    env_data_dir: Option<PathBuf>,
) -> PathBuf {
    env_data_dir
        .or_else(|| project.storage.data_dir.clone())
        .or_else(|| user.data_dir.clone())
        .map_or_else(|| project_root.join(".haze"), |dir| anchor(project_root, &dir))
}

fn anchor(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/quotes.json")
}

fn default_likes_key() -> String {
    "likedQuotes_v1".to_string()
}

const fn default_max_history() -> usize {
    MAX_HISTORY
}

const fn default_fade_duration_ms() -> u64 {
    250
}

const fn default_notify_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}

const fn default_like_saved_duration_ms() -> u64 {
    900
}

fn default_collection() -> String {
    "userLikes".to_string()
}
