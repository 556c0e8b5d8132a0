use std::env;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::services::rate_limit::RateLimitStrategy;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const MAX_PER_PAGE: u32 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("per_page must be between 1 and 100, got {0}")]
    InvalidPerPage(u32),
    #[error("api_base_url must not be empty")]
    MissingBaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub per_page: u32,
    pub rate_limit: RateLimitStrategy,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: 50,
            rate_limit: RateLimitStrategy::default(),
        }
    }
}

impl GitHubConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config file when one is given, otherwise the defaults.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(self.per_page));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthData {
    pub token: Option<String>,
}

impl AuthData {
    /// Reads `GITHUB_TOKEN`; requests go out unauthenticated when it is unset.
    pub fn from_env() -> Self {
        let token = env::var("GITHUB_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self { token }
    }
}
