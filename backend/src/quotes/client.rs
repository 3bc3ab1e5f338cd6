use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::config::{Credentials, QuotesConfig};
use crate::logger::warn_if_slow;
use crate::quotes::errors::QuoteError;
use crate::quotes::types::{QuoteBoard, TokenResponse};
use crate::quotes::{AccessToken, QuoteSource};

const TOKEN_PATH: &str = "/token";
const CAUCIONES_PATH: &str = "/api/v2/Cotizaciones/cauciones/argentina/todos";

/// InvertirOnline REST client for the caución board.
#[derive(Clone)]
pub struct IolClient {
    http: Client,
    url: String,
}

impl IolClient {
    pub fn new(cfg: &QuotesConfig) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .connect_timeout(cfg.timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            http,
            url: cfg.base_url.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for IolClient {
    #[instrument(skip_all, fields(username = %credentials.username), level = "debug")]
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, QuoteError> {
        let url = format!("{}{}", self.url, TOKEN_PATH);

        let resp = warn_if_slow("iol_token", Duration::from_secs(3), async {
            self.http
                .post(&url)
                .form(&[
                    ("username", credentials.username.as_str()),
                    ("password", credentials.password.as_str()),
                    ("grant_type", "password"),
                ])
                .send()
                .await
        })
        .await?;

        match resp.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(QuoteError::Auth(format!("status {}", resp.status())));
            }
            _ => {}
        }

        let body: TokenResponse = resp.error_for_status()?.json().await?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| QuoteError::Auth("response carried no access_token".to_string()))?;

        debug!("iol access token acquired");

        Ok(AccessToken::new(token))
    }

    #[instrument(skip_all, level = "debug")]
    async fn fetch_rate(&self, token: &AccessToken) -> Result<f64, QuoteError> {
        let url = format!("{}{}", self.url, CAUCIONES_PATH);

        let board: QuoteBoard = warn_if_slow("iol_cauciones", Duration::from_secs(3), async {
            self.http
                .get(&url)
                .bearer_auth(token.as_str())
                .send()
                .await?
                .error_for_status()?
                .json::<QuoteBoard>()
                .await
        })
        .await?;

        let rate = board.current_rate()?;

        debug!(
            instruments = board.titulos.len(),
            symbol = board
                .titulos
                .first()
                .and_then(|e| e.simbolo.as_deref())
                .unwrap_or("?"),
            rate,
            "caución board fetched"
        );

        Ok(rate)
    }
}
