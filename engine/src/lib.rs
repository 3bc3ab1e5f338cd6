//! Trailing-peak decision engine for the caución rate series.
//!
//! Everything in this crate is pure: no I/O, no clocks, no environment.
//! Callers feed one rate per tick together with the state recovered from
//! persistence and get back the next state plus, at most, one alert.

pub mod alert;
pub mod state;
pub mod thresholds;
pub mod trailing_peak;

pub use alert::Alert;
pub use state::TrackingState;
pub use thresholds::{ThresholdError, Thresholds};
pub use trailing_peak::{PULLBACK_TOLERANCE, Step, TrailingPeakEngine, Transition};
