use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login rejected: {0}")]
    Auth(String),

    #[error("no instruments on the caución board (market closed?)")]
    EmptyMarket,

    #[error("invalid rate in quote: {0}")]
    InvalidRate(String),
}
