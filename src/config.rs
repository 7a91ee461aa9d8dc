use reqwest::Url;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8082";

const API_URL_VAR: &str = "OSAGENDA_API_URL";
const HOME_VAR: &str = "OSAGENDA_HOME";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    /// Base address of the backend, without a trailing slash
    pub(crate) api_url: String,
    /// Directory holding the saved session
    pub(crate) state_dir: PathBuf,
}

impl Config {
    /// Resolves the configuration from the `--server` option, the
    /// environment, and the platform's configuration directory, in that order
    pub(crate) fn resolve(server: Option<String>) -> Result<Config, ConfigError> {
        Config::from_sources(
            server,
            env::var(API_URL_VAR).ok(),
            env::var_os(HOME_VAR).map(PathBuf::from),
            dirs::config_dir(),
        )
    }

    fn from_sources(
        server: Option<String>,
        env_url: Option<String>,
        env_home: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Result<Config, ConfigError> {
        let raw = server
            .or(env_url)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_API_URL));
        let api_url = normalize_url(&raw)?;
        let state_dir = env_home
            .or_else(|| config_dir.map(|d| d.join(env!("CARGO_PKG_NAME"))))
            .ok_or(ConfigError::NoStateDir)?;
        Ok(Config { api_url, state_dir })
    }
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        reason: reason.to_owned(),
    };
    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(trimmed.to_owned())
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not determine a directory for saving the session; set OSAGENDA_HOME")]
    NoStateDir,
}
