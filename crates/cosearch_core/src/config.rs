//! Process configuration read once from the environment.
//!
//! # Invariants
//! - Settings are built once at startup and passed explicitly; nothing
//!   reads the environment after boot.
//! - Unknown environments and malformed URLs fail startup.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use url::Url;

pub const DB_PATH_VAR: &str = "COSEARCH_DB_PATH";
pub const BIND_ADDR_VAR: &str = "COSEARCH_BIND_ADDR";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";
pub const DISCORD_WEBHOOK_URL_VAR: &str = "DISCORD_WEBHOOK_URL";
pub const PUBLIC_URL_VAR: &str = "COSEARCH_PUBLIC_URL";
pub const LOG_LEVEL_VAR: &str = "COSEARCH_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "COSEARCH_LOG_DIR";

const DEFAULT_DB_PATH: &str = "cosearch.sqlite3";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownEnvironment(String),
    InvalidUrl { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEnvironment(value) => write!(
                f,
                "{ENVIRONMENT_VAR} must be one of local, staging, production; got `{value}`"
            ),
            Self::InvalidUrl { var, value } => write!(f, "{var} is not a valid URL: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub environment: Environment,
    pub discord_webhook_url: Option<Url>,
    /// Base URL of the public site, used for links in notifications.
    pub public_url: String,
    /// `None` keeps the build-mode default.
    pub log_level: Option<String>,
    /// `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            environment: Environment::Local,
            discord_webhook_url: None,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl Settings {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let environment = match get(ENVIRONMENT_VAR) {
            Some(value) => Environment::parse(value.trim())
                .ok_or(ConfigError::UnknownEnvironment(value))?,
            None => defaults.environment,
        };
        let discord_webhook_url = get(DISCORD_WEBHOOK_URL_VAR)
            .map(|value| parse_url(DISCORD_WEBHOOK_URL_VAR, value))
            .transpose()?;
        let public_url = match get(PUBLIC_URL_VAR) {
            Some(value) => {
                parse_url(PUBLIC_URL_VAR, value.clone())?;
                value.trim_end_matches('/').to_string()
            }
            None => defaults.public_url,
        };

        Ok(Self {
            db_path: get(DB_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_addr: get(BIND_ADDR_VAR).unwrap_or(defaults.bind_addr),
            environment,
            discord_webhook_url,
            public_url,
            log_level: get(LOG_LEVEL_VAR),
            log_dir: get(LOG_DIR_VAR).map(PathBuf::from),
        })
    }

    /// Whether creation events should reach the chat webhook.
    pub fn notifications_enabled(&self) -> bool {
        self.discord_webhook_url.is_some() && self.environment != Environment::Local
    }
}

fn parse_url(var: &'static str, value: String) -> Result<Url, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ConfigError::InvalidUrl { var, value }),
    }
}
