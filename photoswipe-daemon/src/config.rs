//! Daemon configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use photoswipe_core::{
    album::DEFAULT_PAGE_SIZE, client::GOOGLE_PHOTOS_API, dispatch::DEFAULT_TRASH_ALBUM_TITLE,
    ProviderConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Path to the Unix socket.
    pub socket_path: PathBuf,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory for storing key bindings.
    pub data_dir: PathBuf,

    /// Logging level.
    pub log_level: String,

    /// Refresh access tokens this many seconds before they expire.
    pub expiry_buffer_secs: i64,

    /// Identity provider used for the refresh grant.
    pub provider: ProviderSection,

    /// Photo library API settings.
    pub library: LibrarySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Base URL of the library API, including its version segment.
    pub api_base: String,

    /// Albums requested per listing page (1-50).
    pub album_page_size: u32,

    /// Title of the album `trash` actions move items into.
    pub trash_album_title: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let google = ProviderConfig::google();
        Self {
            auth_url: google.auth_url,
            token_url: google.token_url,
            scopes: google.default_scopes,
        }
    }
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            api_base: GOOGLE_PHOTOS_API.to_string(),
            album_page_size: DEFAULT_PAGE_SIZE,
            trash_album_title: DEFAULT_TRASH_ALBUM_TITLE.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let dirs = project_dirs();
        let data_dir = dirs
            .as_ref()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".photoswipe"));

        let socket_path = dirs
            .as_ref()
            .map(|d| d.runtime_dir().unwrap_or(d.data_dir()).join("photoswipe.sock"))
            .unwrap_or_else(|| PathBuf::from("/tmp/photoswipe.sock"));

        Self {
            socket_path,
            config_path: PathBuf::new(),
            data_dir,
            log_level: "info".to_string(),
            expiry_buffer_secs: 300,
            provider: ProviderSection::default(),
            library: LibrarySection::default(),
        }
    }
}

impl DaemonConfig {
    /// The identity provider described by the `[provider]` section.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::google()
            .with_auth_url(&self.provider.auth_url)
            .with_token_url(&self.provider.token_url)
            .with_scopes(self.provider.scopes.clone())
    }

    /// How long before expiry a bundle is refreshed.
    pub fn expiry_buffer(&self) -> Result<chrono::Duration> {
        if self.expiry_buffer_secs < 0 {
            anyhow::bail!(
                "expiry_buffer_secs must not be negative (got {})",
                self.expiry_buffer_secs
            );
        }
        chrono::Duration::try_seconds(self.expiry_buffer_secs).with_context(|| {
            format!(
                "expiry_buffer_secs is out of range (got {})",
                self.expiry_buffer_secs
            )
        })
    }

    /// Where key bindings are persisted.
    pub fn bindings_path(&self) -> PathBuf {
        self.data_dir.join("bindings.json")
    }
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DaemonConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => project_dirs()
            .as_ref()
            .map(|d| d.config_dir().join("daemon.toml"))
            .unwrap_or_else(|| PathBuf::from("photoswipe-daemon.toml")),
    };

    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        DaemonConfig::default()
    };

    config.config_path = config_path;
    config
        .expiry_buffer()
        .with_context(|| format!("Invalid config in {:?}", config.config_path))?;

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "photoswipe", "photoswipe")
}
