//! Runtime configuration resolved from CLI flags and the environment

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::cache::{FileStorage, KvStorage, MemoryStorage, ResponseCache};
use crate::cli::Cli;
use crate::data::tmdb::TMDB_BASE_URL;

/// Placeholder key shipped in sample configurations
const PLACEHOLDER_API_KEY: &str = "YOUR_TMDB_API_KEY";

/// Errors in the resolved configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TMDB API key missing. Pass --api-key or set TMDB_API_KEY.")]
    MissingApiKey,

    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolved settings for one run of the explorer
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub cache_ttl: Duration,
    pub cache_enabled: bool,
    /// Where cached responses live; `None` keeps them in memory
    pub cache_dir: Option<PathBuf>,
    /// Where favorites live; `None` keeps them in memory
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Builds the configuration from parsed CLI arguments
    ///
    /// Directories not given on the command line default to the XDG cache and
    /// data directories (`~/.cache/moviex/`, `~/.local/share/moviex/` on Linux).
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let raw_url = cli.base_url.as_deref().unwrap_or(TMDB_BASE_URL);
        let base_url = Url::parse(raw_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw_url.to_string(),
            source,
        })?;

        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
            .map(str::to_string);

        let project_dirs = ProjectDirs::from("", "", "moviex");
        let cache_dir = cli
            .cache_dir
            .clone()
            .or_else(|| project_dirs.as_ref().map(|d| d.cache_dir().to_path_buf()));
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| project_dirs.as_ref().map(|d| d.data_dir().to_path_buf()));

        Ok(Self {
            api_key,
            base_url,
            cache_ttl: Duration::from_secs(cli.cache_ttl_mins.saturating_mul(60)),
            cache_enabled: !cli.no_cache,
            cache_dir,
            data_dir,
        })
    }

    /// Returns the API key, or an error when none is configured
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// Storage backing the response cache
    ///
    /// A disabled cache uses storage that rejects every operation, which the
    /// cache already treats as a permanent miss.
    pub fn cache_storage(&self) -> Box<dyn KvStorage> {
        if !self.cache_enabled {
            return Box::new(MemoryStorage::disabled());
        }
        match &self.cache_dir {
            Some(dir) => Box::new(FileStorage::new(dir.clone())),
            None => Box::new(MemoryStorage::new()),
        }
    }

    /// The response cache for this run
    pub fn response_cache(&self) -> ResponseCache {
        ResponseCache::new(self.cache_storage(), self.cache_ttl)
    }

    /// Storage backing the favorites list
    pub fn favorites_storage(&self) -> Box<dyn KvStorage> {
        match &self.data_dir {
            Some(dir) => Box::new(FileStorage::new(dir.clone())),
            None => {
                warn!("no data directory available, favorites will not be saved");
                Box::new(MemoryStorage::new())
            }
        }
    }
}
