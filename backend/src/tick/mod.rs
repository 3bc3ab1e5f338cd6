pub mod orchestrator;

use engine::{Alert, TrackingState, Transition};

pub use orchestrator::TickOrchestrator;

/// Summary of a tick that got a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub rate: f64,
    pub prior: TrackingState,
    pub next: TrackingState,
    pub transition: Transition,
    pub alert: Option<Alert>,

    /// `None` when there was nothing to send.
    pub delivered: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickReport),

    /// The board had no instruments; nothing was read or written.
    MarketClosed,
}
