/// Configuration for the scraper and its web server
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public contact details page of the INSPIRE awards portal.
pub const DEFAULT_BASE_URL: &str =
    "https://www.inspireawards-dst.gov.in/UserP/Contact-detailsAtPublicDomain.aspx";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Process-wide scraper settings. Fixed once the server starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Portal page every request is sent to
    pub base_url: String,
    /// Per-request timeout, in seconds
    pub request_timeout_secs: u64,
    /// Extra attempts for a request that failed transiently
    pub max_retries: u32,
    /// Minimum gap between two outbound requests, in milliseconds
    pub rate_limit_delay_ms: u64,
    /// Root of the CSV output tree and the log file
    pub output_dir: PathBuf,
    pub user_agent: String,
    /// Optional JSON file of `{state_id: [{id, name}, ...]}` district lists
    pub catalog_file: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            rate_limit_delay_ms: 500,
            output_dir: PathBuf::from("output"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            catalog_file: None,
        }
    }
}

impl ScraperConfig {
    /// Loads a config from a JSON file. Missing keys fall back to the defaults.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON config file
    ///
    /// # Returns
    /// * `Ok(ScraperConfig)` - The validated configuration
    /// * `Err(ConfigError)` - If the file can't be read, parsed or validated
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ScraperConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that the base URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    /// Where the log file lives.
    pub fn log_file(&self) -> PathBuf {
        self.output_dir.join("scraper.log")
    }
}
