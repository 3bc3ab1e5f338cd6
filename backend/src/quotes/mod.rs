pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;

use crate::config::Credentials;

pub use client::IolClient;
pub use errors::QuoteError;

/// Bearer token returned by a successful login.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Where the tick gets its one rate reading from.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, QuoteError>;

    async fn fetch_rate(&self, token: &AccessToken) -> Result<f64, QuoteError>;
}
