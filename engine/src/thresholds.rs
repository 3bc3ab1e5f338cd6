use thiserror::Error;

pub const DEFAULT_ACTIVATION: f64 = 30.0;
pub const DEFAULT_PULLBACK_MARGIN: f64 = 2.0;

#[derive(Error, Debug, PartialEq)]
pub enum ThresholdError {
    #[error("activation threshold must be finite, got {0}")]
    Activation(f64),

    #[error("pullback margin must be finite and positive, got {0}")]
    PullbackMargin(f64),
}

/// Fixed levels the engine compares every rate against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Rate at or above which a tracking cycle is armed.
    activation: f64,
    /// Drop from the peak that confirms a reversal.
    pullback_margin: f64,
}

impl Thresholds {
    pub fn new(activation: f64, pullback_margin: f64) -> Result<Self, ThresholdError> {
        if !activation.is_finite() {
            return Err(ThresholdError::Activation(activation));
        }
        if !pullback_margin.is_finite() || pullback_margin <= 0.0 {
            return Err(ThresholdError::PullbackMargin(pullback_margin));
        }

        Ok(Self {
            activation,
            pullback_margin,
        })
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn pullback_margin(&self) -> f64 {
        self.pullback_margin
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            activation: DEFAULT_ACTIVATION,
            pullback_margin: DEFAULT_PULLBACK_MARGIN,
        }
    }
}
