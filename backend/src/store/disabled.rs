use async_trait::async_trait;
use engine::TrackingState;
use tracing::debug;

use crate::store::{HistoryRecord, StateStore, StoreError};

/// Stand-in used when no store is configured: remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStateStore;

#[async_trait]
impl StateStore for DisabledStateStore {
    async fn load_state(&self) -> Result<Option<TrackingState>, StoreError> {
        Ok(None)
    }

    async fn save_state(&self, state: &TrackingState) -> Result<(), StoreError> {
        debug!(
            tracking = state.tracking,
            peak = state.peak,
            "persistence disabled; state dropped"
        );
        Ok(())
    }

    async fn append_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        debug!(rate = record.rate, "persistence disabled; history dropped");
        Ok(())
    }
}
