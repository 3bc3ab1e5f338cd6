use std::fmt;

/// Buy signal raised when the rate pulls back far enough from its peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    pub peak: f64,
    pub rate: f64,
}

impl Alert {
    /// Text delivered to the notification channel. Rates always carry a
    /// decimal part (`35.0%`).
    pub fn message(&self) -> String {
        format!(
            "🚨 **OPORTUNIDAD DE COMPRA** 🚨\n\
             El pico fue: {:?}%\n\
             Tasa actual: {:?}%\n\
             Confirmamos reversión. ¡Entrá ahora!",
            self.peak, self.rate
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reversal from peak {}% to {}%", self.peak, self.rate)
    }
}
