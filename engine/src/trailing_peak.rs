//! Trailing-peak reversal detector.
//!
//! A cycle arms when the rate reaches the activation level, follows the
//! rate upwards while it makes new highs, and fires once the rate has
//! pulled back at least the configured margin from the recorded peak.
//! Falling below the activation level abandons the cycle without an alert.

use crate::alert::Alert;
use crate::state::TrackingState;
use crate::thresholds::Thresholds;

/// Slack for binary rounding of decimal quotes: 32.3 - 30.3 is
/// 1.9999999999999964 in f64, yet it is a drop of exactly 2.0.
pub const PULLBACK_TOLERANCE: f64 = 1e-9;

/// Which branch of the state machine a tick took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Rate under the activation level; any open cycle is dropped.
    Reset { was_tracking: bool },
    /// First tick at or above the activation level.
    Arm,
    /// New high while tracking.
    Raise { previous_peak: f64 },
    /// Pullback reached the margin; the cycle closes with an alert.
    Confirm,
    /// Rate inside the band between the trigger and the peak.
    Hold,
}

/// Result of feeding one rate into the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub next: TrackingState,
    pub transition: Transition,
    pub alert: Option<Alert>,
}

impl Step {
    fn quiet(next: TrackingState, transition: Transition) -> Self {
        Self {
            next,
            transition,
            alert: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingPeakEngine {
    thresholds: Thresholds,
}

impl TrailingPeakEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Computes the next state from the current rate and the prior state.
    ///
    /// `rate` must be finite; quotes that are not are rejected upstream.
    pub fn step(&self, rate: f64, prior: TrackingState) -> Step {
        debug_assert!(rate.is_finite(), "rate must be finite, got {rate}");

        if rate < self.thresholds.activation() {
            return Step::quiet(
                TrackingState::idle(),
                Transition::Reset {
                    was_tracking: prior.tracking,
                },
            );
        }

        if !prior.tracking {
            return Step::quiet(TrackingState::armed(rate), Transition::Arm);
        }

        let peak = prior.peak;

        if rate > peak {
            return Step::quiet(
                TrackingState::armed(rate),
                Transition::Raise {
                    previous_peak: peak,
                },
            );
        }

        if peak - rate >= self.thresholds.pullback_margin() - PULLBACK_TOLERANCE {
            return Step {
                next: TrackingState::idle(),
                transition: Transition::Confirm,
                alert: Some(Alert { peak, rate }),
            };
        }

        Step::quiet(prior, Transition::Hold)
    }
}
