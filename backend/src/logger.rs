//! Tracing setup for the tick binary.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Span;
use tracing::field::Empty;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Used when `RUST_LOG` is unset. sqlx logs every statement at info.
const DEFAULT_FILTER: &str = "info,sqlx=warn,reqwest=warn,hyper_util=warn";

/// Correlation id attached to every log line of one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Installs the global subscriber, JSON lines when `json` is set.
///
/// Returns `false` when a subscriber was already installed; the existing one
/// is left in place.
pub fn init_tracing(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json().with_current_span(true).with_span_list(false))
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(json, version = env!("CARGO_PKG_VERSION"), "logger initialized");
    }
    installed
}

/// Span around one tick. `rate` and `transition` are recorded once known.
pub fn tick_span(trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "tick",
        trace_id = %trace_id,
        rate = Empty,
        transition = Empty,
    )
}

/// Awaits `fut`, warning when it takes longer than `budget`.
pub async fn warn_if_slow<F, T>(call: &'static str, budget: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > budget {
        tracing::warn!(
            call,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "upstream call over budget"
        );
    }
    out
}
