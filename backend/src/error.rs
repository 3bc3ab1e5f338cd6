use thiserror::Error;

use crate::quotes::QuoteError;

/// Reasons a tick stops before the engine runs.
///
/// Store and delivery failures never show up here; they are logged where
/// they happen and the tick carries on.
#[derive(Error, Debug)]
pub enum TickError {
    #[error("authentication against the quotes API failed: {0}")]
    Auth(#[source] QuoteError),

    #[error("quote feed unavailable: {0}")]
    Feed(#[source] QuoteError),
}
