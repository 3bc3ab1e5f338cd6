use sqlx::AnyPool;

// DDL and statements stay within what both SQLite and Postgres accept:
// `$n` placeholders, BIGINT flags and DOUBLE PRECISION rates.

pub async fn migrate(pool: &AnyPool) -> Result<(), sqlx::Error> {
    // Single-row engine memory
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS tracking_state (
  id BIGINT PRIMARY KEY CHECK (id = 1),
  tracking BIGINT NOT NULL CHECK (tracking IN (0,1)),
  peak DOUBLE PRECISION NOT NULL,
  updated_at TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
INSERT INTO tracking_state (id, tracking, peak, updated_at)
VALUES (1, 0, 0.0, '')
ON CONFLICT (id) DO NOTHING;
"#,
    )
    .execute(pool)
    .await?;

    // Append-only rate log
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS rate_history (
  recorded_at TEXT NOT NULL,
  rate DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_rate_history_recorded ON rate_history(recorded_at);"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
