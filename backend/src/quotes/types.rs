use serde::Deserialize;
use serde_json::Value;

use crate::quotes::errors::QuoteError;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteBoard {
    #[serde(default)]
    pub titulos: Vec<BoardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BoardEntry {
    #[serde(default)]
    pub simbolo: Option<String>,

    /// Kept raw: the API sends this as a number, but nulls and strings show
    /// up on thin sessions.
    #[serde(rename = "ultimoPrecio", default)]
    pub ultimo_precio: Value,
}

impl QuoteBoard {
    /// Latest traded rate of the first instrument on the board.
    pub fn current_rate(&self) -> Result<f64, QuoteError> {
        let entry = self.titulos.first().ok_or(QuoteError::EmptyMarket)?;
        entry.rate()
    }
}

impl BoardEntry {
    pub fn rate(&self) -> Result<f64, QuoteError> {
        let rate = match &self.ultimo_precio {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        };

        rate.filter(|r| r.is_finite())
            .ok_or_else(|| QuoteError::InvalidRate(self.ultimo_precio.to_string()))
    }
}
