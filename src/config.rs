//! Runtime configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Paths not set explicitly resolve to
//! platform-specific locations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};

/// Application name used for platform directories and the config file name.
pub const APP_NAME: &str = "playlist-bridge";

/// Config file name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "playlist-bridge.toml";

/// Upper bound for `transfer.retry_delay_ms`.
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Where playlists are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Playlist links transferred by `transfer --all` and shown by `list`.
    pub playlist_links: Vec<String>,

    /// Base URL of the embeddable playlist page; the playlist id is appended.
    pub embed_base_url: String,

    /// Base URL of the full playlist page (used for markup dumps).
    pub page_base_url: String,

    /// User-Agent sent with page requests.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            playlist_links: Vec::new(),
            embed_base_url: "https://open.spotify.com/embed/playlist".to_string(),
            page_base_url: "https://open.spotify.com/playlist".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Video platform access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// OAuth client credentials JSON. If None, uses the platform config directory.
    pub credentials_file: Option<PathBuf>,

    /// Saved OAuth token. If None, uses the platform data directory.
    pub token_file: Option<PathBuf>,

    /// Data API base URL.
    pub api_base_url: String,

    /// Search results requested per track (1-50).
    pub max_results: u32,

    /// Privacy status for created playlists.
    pub privacy_status: String,

    /// Local port receiving the OAuth redirect.
    pub redirect_port: u16,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            credentials_file: None,
            token_file: None,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            max_results: 5,
            privacy_status: "private".to_string(),
            redirect_port: 8081,
        }
    }
}

/// Transfer behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Transport retries for throttled or failed API calls.
    pub max_retries: u32,

    /// Base delay between transport retries, in milliseconds.
    pub retry_delay_ms: u64,

    /// Pause after each matched track, in milliseconds.
    pub track_delay_ms: u64,

    /// Reuse a destination playlist with the same title instead of creating one.
    pub skip_existing: bool,

    /// Perform reads and matching only; skip every mutation.
    pub dry_run: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            track_delay_ms: 100,
            skip_existing: true,
            dry_run: false,
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,

    /// Forces debug level.
    pub verbose: bool,

    /// Also append logs to a file in the platform data directory.
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
            log_to_file: false,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Creates a new BridgeConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file and environment.
    ///
    /// `explicit_path` must exist if given. Without it, the platform config
    /// file is read when present and silently skipped otherwise.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_file().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Reads a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::with_source(
                crate::error::ErrorCode::Configuration,
                format!("Failed to read config file {}", path.display()),
                e,
            )
        })?;
        Self::from_toml_str(&text).map_err(|e| {
            BridgeError::configuration(format!("Invalid config file {}: {}", path.display(), e.message))
        })
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, BridgeError> {
        toml::from_str(text).map_err(|e| BridgeError::configuration(e.to_string()))
    }

    /// Applies environment variable overrides.
    ///
    /// Reads the following environment variables:
    /// - `BRIDGE_PLAYLIST_LINKS` - Comma-separated playlist links
    /// - `BRIDGE_CREDENTIALS_FILE` - OAuth client credentials JSON
    /// - `BRIDGE_TOKEN_FILE` - Saved OAuth token location
    /// - `BRIDGE_DRY_RUN` - `true` enables dry-run
    /// - `BRIDGE_SKIP_EXISTING` - `false` always creates new playlists
    /// - `BRIDGE_VERBOSE` - `true` enables debug logging
    /// - `BRIDGE_TRACK_DELAY_MS` - Pause after each matched track
    ///
    /// Unset or unparseable variables leave the current value in place.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(links) = var("BRIDGE_PLAYLIST_LINKS") {
            self.source.playlist_links = split_links(&links);
        }

        if let Some(path) = var("BRIDGE_CREDENTIALS_FILE") {
            self.destination.credentials_file = Some(PathBuf::from(path));
        }

        if let Some(path) = var("BRIDGE_TOKEN_FILE") {
            self.destination.token_file = Some(PathBuf::from(path));
        }

        if var("BRIDGE_DRY_RUN").as_deref() == Some("true") {
            self.transfer.dry_run = true;
        }

        if var("BRIDGE_SKIP_EXISTING").as_deref() == Some("false") {
            self.transfer.skip_existing = false;
        }

        if var("BRIDGE_VERBOSE").as_deref() == Some("true") {
            self.logging.verbose = true;
            self.logging.level = "debug".to_string();
        }

        if let Some(delay) = var("BRIDGE_TRACK_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
            self.transfer.track_delay_ms = delay;
        }
    }

    /// Returns the effective credentials path, using platform defaults if not specified.
    pub fn effective_credentials_path(&self) -> PathBuf {
        if let Some(ref path) = self.destination.credentials_file {
            path.clone()
        } else {
            default_credentials_path()
        }
    }

    /// Returns the effective token path, using platform defaults if not specified.
    pub fn effective_token_path(&self) -> PathBuf {
        if let Some(ref path) = self.destination.token_file {
            path.clone()
        } else {
            default_token_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if !(1..=50).contains(&self.destination.max_results) {
            return Some(format!(
                "destination.max_results must be between 1 and 50, got {}",
                self.destination.max_results
            ));
        }

        if self.transfer.max_retries > 10 {
            return Some(format!(
                "transfer.max_retries too high: {} (max 10)",
                self.transfer.max_retries
            ));
        }

        if self.transfer.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Some(format!(
                "transfer.retry_delay_ms too high: {} (max {})",
                self.transfer.retry_delay_ms, MAX_RETRY_DELAY_MS
            ));
        }

        if !["private", "unlisted", "public"].contains(&self.destination.privacy_status.as_str()) {
            return Some(format!(
                "destination.privacy_status must be private, unlisted or public, got '{}'",
                self.destination.privacy_status
            ));
        }

        None
    }

    /// Validates the parts needed to talk to the video platform.
    ///
    /// Only commands that touch the destination call this.
    pub fn validate_destination(&self) -> Result<()> {
        if let Some(message) = self.validate() {
            return Err(BridgeError::configuration(message));
        }
        let credentials = self.effective_credentials_path();
        if !credentials.exists() {
            return Err(BridgeError::configuration(format!(
                "Credentials file not found: {}",
                credentials.display()
            )));
        }
        Ok(())
    }
}

/// Splits a comma-separated link list, dropping blanks.
pub fn split_links(links: &str) -> Vec<String> {
    links
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Returns the platform-specific config file path.
///
/// - macOS: ~/Library/Application Support/playlist-bridge/playlist-bridge.toml
/// - Linux: ~/.config/playlist-bridge/playlist-bridge.toml
/// - Windows: C:\Users\<user>\AppData\Roaming\playlist-bridge\config\playlist-bridge.toml
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Returns the platform-specific default credentials path.
fn default_credentials_path() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.config_dir().join("client_secret.json")
    } else {
        // Fallback to current directory
        PathBuf::from("./client_secret.json")
    }
}

/// Returns the platform-specific default token path.
fn default_token_path() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.data_dir().join("token.json")
    } else {
        PathBuf::from("./token.json")
    }
}

/// Returns the platform-specific log directory.
pub fn default_log_dir() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.data_dir().join("logs")
    } else {
        PathBuf::from("./logs")
    }
}
