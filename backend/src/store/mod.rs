pub mod disabled;
pub mod repository_sqlx;

use async_trait::async_trait;
use engine::TrackingState;
use thiserror::Error;

pub use disabled::DisabledStateStore;
pub use repository_sqlx::SqlxStateStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed state row: {0}")]
    InvalidRow(String),
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub recorded_at: String,
    pub rate: f64,
}

/// Durable memory shared between ticks.
///
/// `load_state` returns `Ok(None)` when nothing has been stored yet; falling
/// back to the idle state is the caller's decision.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load_state(&self) -> Result<Option<TrackingState>, StoreError>;

    async fn save_state(&self, state: &TrackingState) -> Result<(), StoreError>;

    async fn append_history(&self, record: &HistoryRecord) -> Result<(), StoreError>;
}
