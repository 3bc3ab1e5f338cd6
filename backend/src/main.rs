use std::process::ExitCode;
use std::sync::Arc;

use backend::{
    config::{AppConfig, StoreConfig},
    db::Db,
    logger::init_tracing,
    notify::TelegramNotifier,
    quotes::IolClient,
    store::{DisabledStateStore, SqlxStateStore, StateStore},
    tick::{TickOrchestrator, TickOutcome},
};
use engine::TrailingPeakEngine;

/// Opens the configured store, or the disabled one when persistence is off
/// or unreachable.
async fn init_store(cfg: Option<&StoreConfig>) -> Arc<dyn StateStore> {
    let Some(cfg) = cfg else {
        tracing::warn!("STORE_NAME not set; running without persistence or history");
        return Arc::new(DisabledStateStore);
    };

    match open_store(cfg).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(
                error = ?e,
                store = %cfg.name,
                "state store unavailable; running without persistence"
            );
            Arc::new(DisabledStateStore)
        }
    }
}

async fn open_store(cfg: &StoreConfig) -> anyhow::Result<SqlxStateStore> {
    let db = Db::connect(&cfg.connection_url()).await?;
    db.migrate().await?;
    Ok(SqlxStateStore::new(db.pool))
}

fn build_orchestrator(
    cfg: &AppConfig,
    store: Arc<dyn StateStore>,
) -> anyhow::Result<TickOrchestrator> {
    let quotes = IolClient::new(&cfg.quotes)?;
    let notifier = TelegramNotifier::new(&cfg.telegram)?;

    Ok(TickOrchestrator::new(
        Arc::new(quotes),
        store,
        Arc::new(notifier),
        TrailingPeakEngine::new(cfg.thresholds),
        cfg.quotes.credentials.clone(),
    ))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    init_tracing(cfg.json_logs);

    tracing::info!(
        activation = cfg.thresholds.activation(),
        pullback_margin = cfg.thresholds.pullback_margin(),
        persistence = cfg.store.is_some(),
        "starting caución tick"
    );

    let store = init_store(cfg.store.as_ref()).await;

    let orchestrator = match build_orchestrator(&cfg, store) {
        Ok(o) => o,
        Err(e) => {
            tracing::error!(error = ?e, "failed to build http clients");
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.run_once().await {
        Ok(TickOutcome::Completed(report)) => {
            tracing::info!(
                rate = report.rate,
                tracking = report.next.tracking,
                peak = report.next.peak,
                alert = report.alert.is_some(),
                "tick complete"
            );
            ExitCode::SUCCESS
        }
        Ok(TickOutcome::MarketClosed) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tick aborted");
            ExitCode::FAILURE
        }
    }
}
