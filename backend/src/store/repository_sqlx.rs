use std::time::Duration;

use async_trait::async_trait;
use engine::TrackingState;
use sqlx::{AnyPool, Row};
use tracing::{debug, instrument};

use crate::logger::warn_if_slow;
use crate::store::{HistoryRecord, StateStore, StoreError};
use crate::time::history_timestamp;

/// SQLx-backed implementation of StateStore.
/// Responsible only for persistence and row mapping.
pub struct SqlxStateStore {
    pool: AnyPool,
}

impl SqlxStateStore {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for SqlxStateStore {
    #[instrument(skip(self), target = "store")]
    async fn load_state(&self) -> Result<Option<TrackingState>, StoreError> {
        let row = warn_if_slow("db_load_state", Duration::from_millis(200), async {
            sqlx::query(
                r#"
SELECT tracking, peak
FROM tracking_state
WHERE id = 1;
"#,
            )
            .fetch_optional(&self.pool)
            .await
        })
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_state(&r)?)),
            None => {
                debug!("no stored tracking state");
                Ok(None)
            }
        }
    }

    #[instrument(
        skip(self),
        target = "store",
        fields(tracking = state.tracking, peak = state.peak)
    )]
    async fn save_state(&self, state: &TrackingState) -> Result<(), StoreError> {
        warn_if_slow("db_save_state", Duration::from_millis(200), async {
            sqlx::query(
                r#"
INSERT INTO tracking_state (id, tracking, peak, updated_at)
VALUES (1, $1, $2, $3)
ON CONFLICT (id) DO UPDATE
SET tracking = excluded.tracking, peak = excluded.peak, updated_at = excluded.updated_at;
"#,
            )
            .bind(i64::from(state.tracking))
            .bind(state.peak)
            .bind(history_timestamp())
            .execute(&self.pool)
            .await
        })
        .await?;

        Ok(())
    }

    #[instrument(skip(self), target = "store", fields(rate = record.rate))]
    async fn append_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        warn_if_slow("db_append_history", Duration::from_millis(200), async {
            sqlx::query(r#"INSERT INTO rate_history (recorded_at, rate) VALUES ($1, $2);"#)
                .bind(record.recorded_at.clone())
                .bind(record.rate)
                .execute(&self.pool)
                .await
        })
        .await?;

        Ok(())
    }
}

/* =========================
Row mapping
========================= */

fn row_to_state(r: &sqlx::any::AnyRow) -> Result<TrackingState, StoreError> {
    let tracking_i64: i64 = r.try_get("tracking")?;
    let peak: f64 = r.try_get("peak")?;

    let tracking = match tracking_i64 {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidRow(format!(
                "tracking flag out of range: {other}"
            )));
        }
    };

    TrackingState { tracking, peak }
        .normalized()
        .ok_or_else(|| StoreError::InvalidRow(format!("unusable peak: {peak}")))
}
