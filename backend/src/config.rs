use std::time::Duration;

use engine::{ThresholdError, Thresholds};
use thiserror::Error;

pub const DEFAULT_IOL_BASE_URL: &str = "https://api.invertironline.com";
pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),
}

/// Quotes account used to log into the brokerage API.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub base_url: String,
    pub token: String,
    pub chat_id: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct QuotesConfig {
    pub base_url: String,
    pub credentials: Credentials,

    /// Applied to both the token request and the quotes request.
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct StoreConfig {
    /// Database URL of the state store.
    pub name: String,

    /// Optional `user:password` merged into `name` when it has no userinfo.
    pub credentials: Option<String>,
}

impl StoreConfig {
    /// Connection URL with the credentials spliced in.
    pub fn connection_url(&self) -> String {
        let Some(creds) = self.credentials.as_deref().filter(|c| !c.is_empty()) else {
            return self.name.clone();
        };

        let Some((scheme, rest)) = self.name.split_once("://") else {
            return self.name.clone();
        };

        let authority = rest.split(['/', '?']).next().unwrap_or_default();
        if authority.contains('@') {
            return self.name.clone();
        }

        format!("{scheme}://{creds}@{rest}")
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("name", &self.name)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub quotes: QuotesConfig,
    pub telegram: TelegramConfig,

    /// `None` runs the tick without persistence and without history.
    pub store: Option<StoreConfig>,

    pub thresholds: Thresholds,

    /// Structured JSON logs instead of the pretty development format.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let quotes = QuotesConfig {
            base_url: get("IOL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IOL_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            credentials: Credentials {
                username: require("IOL_USER")?,
                password: require("IOL_PASS")?,
            },
            timeout: parse_timeout(get("QUOTE_TIMEOUT_SECS"), "QUOTE_TIMEOUT_SECS", 10)?,
        };

        let telegram = TelegramConfig {
            base_url: get("TG_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: require("TG_TOKEN")?,
            chat_id: require("TG_CHAT_ID")?,
            timeout: parse_timeout(get("NOTIFY_TIMEOUT_SECS"), "NOTIFY_TIMEOUT_SECS", 5)?,
        };

        let store = get("STORE_NAME").map(|name| StoreConfig {
            name,
            credentials: get("STORE_CREDENTIALS"),
        });

        let defaults = Thresholds::default();
        let thresholds = Thresholds::new(
            parse_or(
                get("ACTIVATION_THRESHOLD"),
                "ACTIVATION_THRESHOLD",
                defaults.activation(),
            )?,
            parse_or(
                get("PULLBACK_MARGIN"),
                "PULLBACK_MARGIN",
                defaults.pullback_margin(),
            )?,
        )?;

        let json_logs = get("APP_ENV").is_some_and(|v| v == "production");

        Ok(Self {
            quotes,
            telegram,
            store,
            thresholds,
            json_logs,
        })
    }
}

/// Whole seconds; zero would make every request time out immediately.
fn parse_timeout(
    raw: Option<String>,
    key: &'static str,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    match parse_or(raw, key, default_secs)? {
        0 => Err(ConfigError::Invalid {
            key,
            reason: "timeout must be at least 1 second".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
