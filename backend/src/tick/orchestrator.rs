//! One polling cycle.
//!
//! Data flow:
//! QuoteSource → history log → StateStore (load) → engine → StateStore (save) → Notifier

use std::sync::Arc;

use engine::{Alert, TrackingState, TrailingPeakEngine, Transition};
use tracing::{Instrument, Span, error, info, warn};

use crate::config::Credentials;
use crate::error::TickError;
use crate::logger::{TraceId, tick_span};
use crate::notify::Notifier;
use crate::quotes::{QuoteError, QuoteSource};
use crate::store::{HistoryRecord, StateStore};
use crate::tick::{TickOutcome, TickReport};
use crate::time::history_timestamp;

pub struct TickOrchestrator {
    quotes: Arc<dyn QuoteSource>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    engine: TrailingPeakEngine,
    credentials: Credentials,
}

impl TickOrchestrator {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        engine: TrailingPeakEngine,
        credentials: Credentials,
    ) -> Self {
        Self {
            quotes,
            store,
            notifier,
            engine,
            credentials,
        }
    }

    /// Runs a single tick inside its own `tick` span.
    pub async fn run_once(&self) -> Result<TickOutcome, TickError> {
        let trace_id = TraceId::generate();
        self.tick().instrument(tick_span(&trace_id)).await
    }

    async fn tick(&self) -> Result<TickOutcome, TickError> {
        let token = self
            .quotes
            .authenticate(&self.credentials)
            .await
            .map_err(TickError::Auth)?;

        let rate = match self.quotes.fetch_rate(&token).await {
            Ok(rate) => rate,
            Err(QuoteError::EmptyMarket) => {
                info!("market closed or no data; tick skipped");
                return Ok(TickOutcome::MarketClosed);
            }
            Err(e) => return Err(TickError::Feed(e)),
        };

        Span::current().record("rate", rate);
        info!(rate, "current caución rate");

        let record = HistoryRecord {
            recorded_at: history_timestamp(),
            rate,
        };
        if let Err(e) = self.store.append_history(&record).await {
            warn!(error = %e, "failed to append rate history");
        }

        let prior = self.load_prior().await;

        let step = self.engine.step(rate, prior);
        Span::current().record("transition", tracing::field::debug(&step.transition));
        log_transition(rate, &prior, &step.transition);

        if let Err(e) = self.store.save_state(&step.next).await {
            error!(
                error = %e,
                tracking = step.next.tracking,
                peak = step.next.peak,
                "failed to persist tracking state"
            );
        } else {
            info!(
                tracking = step.next.tracking,
                peak = step.next.peak,
                "tracking state saved"
            );
        }

        let delivered = match &step.alert {
            Some(alert) => Some(self.dispatch(alert).await),
            None => None,
        };

        Ok(TickOutcome::Completed(TickReport {
            rate,
            prior,
            next: step.next,
            transition: step.transition,
            alert: step.alert,
            delivered,
        }))
    }

    async fn load_prior(&self) -> TrackingState {
        match self.store.load_state().await {
            Ok(Some(state)) => state,
            Ok(None) => TrackingState::idle(),
            Err(e) => {
                warn!(error = %e, "failed to load tracking state; starting idle");
                TrackingState::idle()
            }
        }
    }

    async fn dispatch(&self, alert: &Alert) -> bool {
        match self.notifier.send(&alert.message()).await {
            Ok(()) => {
                info!(peak = alert.peak, rate = alert.rate, "buy alert delivered");
                true
            }
            Err(e) => {
                error!(
                    error = %e,
                    peak = alert.peak,
                    rate = alert.rate,
                    "buy alert delivery failed; alert dropped"
                );
                false
            }
        }
    }
}

fn log_transition(rate: f64, prior: &TrackingState, transition: &Transition) {
    match transition {
        Transition::Reset { was_tracking: true } => {
            info!(rate, peak = prior.peak, "rate fell below activation; tracking reset")
        }
        Transition::Reset { was_tracking: false } => info!(rate, "rate below activation"),
        Transition::Arm => info!(rate, "activation crossed; tracking peak"),
        Transition::Raise { previous_peak } => {
            info!(rate, previous_peak = *previous_peak, "new peak")
        }
        Transition::Confirm => info!(rate, peak = prior.peak, "reversal confirmed"),
        Transition::Hold => info!(rate, peak = prior.peak, "holding below peak"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use crate::notify::DeliveryError;
    use crate::quotes::AccessToken;
    use crate::store::StoreError;

    enum Feed {
        Rate(f64),
        Empty,
        Broken,
    }

    struct MockQuotes {
        login_ok: bool,
        feed: Feed,
    }

    #[async_trait]
    impl QuoteSource for MockQuotes {
        async fn authenticate(&self, _: &Credentials) -> Result<AccessToken, QuoteError> {
            if self.login_ok {
                Ok(AccessToken::new("tok"))
            } else {
                Err(QuoteError::Auth("status 401 Unauthorized".to_string()))
            }
        }

        async fn fetch_rate(&self, token: &AccessToken) -> Result<f64, QuoteError> {
            assert_eq!(token.as_str(), "tok");
            match self.feed {
                Feed::Rate(r) => Ok(r),
                Feed::Empty => Err(QuoteError::EmptyMarket),
                Feed::Broken => Err(QuoteError::InvalidRate("null".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct MockStore {
        state: Mutex<Option<TrackingState>>,
        history: Mutex<Vec<f64>>,
        saves: Mutex<usize>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MockStore {
        fn with_state(state: TrackingState) -> Self {
            Self {
                state: Mutex::new(Some(state)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl StateStore for MockStore {
        async fn load_state(&self) -> Result<Option<TrackingState>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::InvalidRow("boom".to_string()));
            }
            Ok(*self.state.lock())
        }

        async fn save_state(&self, state: &TrackingState) -> Result<(), StoreError> {
            *self.saves.lock() += 1;
            if self.fail_writes {
                return Err(StoreError::InvalidRow("read-only".to_string()));
            }
            *self.state.lock() = Some(*state);
            Ok(())
        }

        async fn append_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::InvalidRow("read-only".to_string()));
            }
            self.history.lock().push(record.rate);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().push(text.to_string());
            if self.fail {
                return Err(DeliveryError::Rejected("chat not found".to_string()));
            }
            Ok(())
        }
    }

    fn creds() -> Credentials {
        Credentials {
            username: "trader".to_string(),
            password: "pw".to_string(),
        }
    }

    fn orchestrator(
        quotes: MockQuotes,
        store: Arc<MockStore>,
        notifier: Arc<MockNotifier>,
    ) -> TickOrchestrator {
        TickOrchestrator::new(
            Arc::new(quotes),
            store,
            notifier,
            TrailingPeakEngine::default(),
            creds(),
        )
    }

    fn quotes(rate: f64) -> MockQuotes {
        MockQuotes {
            login_ok: true,
            feed: Feed::Rate(rate),
        }
    }

    fn completed(outcome: TickOutcome) -> TickReport {
        match outcome {
            TickOutcome::Completed(report) => report,
            other => panic!("expected completed tick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reversal_saves_reset_state_and_notifies() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier::default());

        let report = completed(
            orchestrator(quotes(33.0), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.transition, Transition::Confirm);
        assert_eq!(report.delivered, Some(true));
        assert_eq!(*store.state.lock(), Some(TrackingState::idle()));
        assert_eq!(*store.history.lock(), vec![33.0]);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("El pico fue: 35.0%"));
        assert!(sent[0].contains("Tasa actual: 33.0%"));
    }

    #[tokio::test]
    #[traced_test]
    async fn tick_span_records_rate_and_transition() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier::default());

        orchestrator(quotes(33.0), store, notifier)
            .run_once()
            .await
            .unwrap();

        assert!(logs_contain("trace_id="));
        assert!(logs_contain("rate=33.0"));
        assert!(logs_contain("transition=Confirm"));
    }

    #[tokio::test]
    async fn unchanged_state_is_still_saved() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier::default());

        let report = completed(
            orchestrator(quotes(34.5), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.transition, Transition::Hold);
        assert_eq!(report.delivered, None);
        assert_eq!(*store.saves.lock(), 1);
        assert_eq!(*store.state.lock(), Some(TrackingState::armed(35.0)));
        assert!(notifier.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn auth_failure_touches_nothing() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier::default());
        let quotes = MockQuotes {
            login_ok: false,
            feed: Feed::Rate(20.0),
        };

        let err = orchestrator(quotes, store.clone(), notifier.clone())
            .run_once()
            .await
            .unwrap_err();

        assert!(matches!(err, TickError::Auth(QuoteError::Auth(_))));
        assert_eq!(*store.saves.lock(), 0);
        assert!(store.history.lock().is_empty());
        assert!(notifier.sent.lock().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_market_skips_tick() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier::default());
        let quotes = MockQuotes {
            login_ok: true,
            feed: Feed::Empty,
        };

        let outcome = orchestrator(quotes, store.clone(), notifier.clone())
            .run_once()
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::MarketClosed);
        assert_eq!(*store.saves.lock(), 0);
        assert!(store.history.lock().is_empty());
        assert!(logs_contain("market closed or no data"));
    }

    #[tokio::test]
    async fn invalid_feed_aborts_before_state() {
        let store = Arc::new(MockStore::default());
        let notifier = Arc::new(MockNotifier::default());
        let quotes = MockQuotes {
            login_ok: true,
            feed: Feed::Broken,
        };

        let err = orchestrator(quotes, store.clone(), notifier)
            .run_once()
            .await
            .unwrap_err();

        assert!(matches!(err, TickError::Feed(QuoteError::InvalidRate(_))));
        assert_eq!(*store.saves.lock(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn unreadable_state_defaults_to_idle() {
        let store = Arc::new(MockStore {
            state: Mutex::new(Some(TrackingState::armed(40.0))),
            fail_reads: true,
            ..Default::default()
        });
        let notifier = Arc::new(MockNotifier::default());

        // Against the stored peak of 40 this would confirm; idle arms instead.
        let report = completed(
            orchestrator(quotes(37.0), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.prior, TrackingState::idle());
        assert_eq!(report.transition, Transition::Arm);
        assert_eq!(*store.state.lock(), Some(TrackingState::armed(37.0)));
        assert!(notifier.sent.lock().is_empty());
        assert!(logs_contain("failed to load tracking state"));
    }

    #[tokio::test]
    async fn missing_state_defaults_to_idle() {
        let store = Arc::new(MockStore::default());
        let notifier = Arc::new(MockNotifier::default());

        let report = completed(
            orchestrator(quotes(25.0), store.clone(), notifier)
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.prior, TrackingState::idle());
        assert_eq!(
            report.transition,
            Transition::Reset {
                was_tracking: false
            }
        );
        assert_eq!(*store.state.lock(), Some(TrackingState::idle()));
    }

    #[tokio::test]
    #[traced_test]
    async fn store_write_failures_do_not_block_alert() {
        let store = Arc::new(MockStore {
            state: Mutex::new(Some(TrackingState::armed(36.0))),
            fail_writes: true,
            ..Default::default()
        });
        let notifier = Arc::new(MockNotifier::default());

        let report = completed(
            orchestrator(quotes(34.0), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.transition, Transition::Confirm);
        assert_eq!(report.delivered, Some(true));
        assert_eq!(*store.saves.lock(), 1);
        assert_eq!(notifier.sent.lock().len(), 1);
        assert!(logs_contain("failed to append rate history"));
        assert!(logs_contain("failed to persist tracking state"));
    }

    #[tokio::test]
    #[traced_test]
    async fn delivery_failure_is_logged_and_state_still_reset() {
        let store = Arc::new(MockStore::with_state(TrackingState::armed(35.0)));
        let notifier = Arc::new(MockNotifier {
            fail: true,
            ..Default::default()
        });

        let report = completed(
            orchestrator(quotes(32.0), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap(),
        );

        assert_eq!(report.delivered, Some(false));
        assert_eq!(*store.state.lock(), Some(TrackingState::idle()));
        assert_eq!(notifier.sent.lock().len(), 1);
        assert!(logs_contain("buy alert delivery failed"));
    }

    #[tokio::test]
    async fn consecutive_ticks_share_memory_through_store() {
        let store = Arc::new(MockStore::default());
        let notifier = Arc::new(MockNotifier::default());

        for rate in [25.0, 32.0, 35.0, 34.5, 33.0, 33.0] {
            orchestrator(quotes(rate), store.clone(), notifier.clone())
                .run_once()
                .await
                .unwrap();
        }

        assert_eq!(*store.history.lock(), vec![25.0, 32.0, 35.0, 34.5, 33.0, 33.0]);
        assert_eq!(notifier.sent.lock().len(), 1);
        // The tick after the reversal re-arms at 33.
        assert_eq!(*store.state.lock(), Some(TrackingState::armed(33.0)));
    }
}
