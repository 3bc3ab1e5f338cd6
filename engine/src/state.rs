/// Persisted memory of the engine between ticks.
///
/// `peak` is only meaningful while `tracking` is set and must be `0.0`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingState {
    pub tracking: bool,
    pub peak: f64,
}

impl TrackingState {
    /// State used when there is no prior record.
    pub const fn idle() -> Self {
        Self {
            tracking: false,
            peak: 0.0,
        }
    }

    pub const fn armed(peak: f64) -> Self {
        Self {
            tracking: true,
            peak,
        }
    }

    /// Repairs a state read back from storage so the idle invariant holds.
    ///
    /// Returns `None` when the stored peak is not a usable number, which the
    /// caller treats the same as an unreadable record.
    pub fn normalized(self) -> Option<Self> {
        if !self.tracking {
            return Some(Self::idle());
        }
        if !self.peak.is_finite() {
            return None;
        }
        Some(self)
    }
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::idle()
    }
}
