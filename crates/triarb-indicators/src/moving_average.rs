//! Simple moving average.

use triarb_core::error::IndicatorError;
use triarb_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Create a new SMA, rejecting a zero period.
    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "Period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = data[..self.period].iter().sum();
        result.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Mean of the most recent `window` closes, or `None` when fewer are available.
///
/// Non-finite or non-positive closes make the whole window unavailable rather
/// than skewing the baseline.
pub fn moving_average(closes: &[f64], window: usize) -> Option<f64> {
    baseline(closes, window).ok()
}

/// Like [`moving_average`], but says why the value is unavailable.
pub fn baseline(closes: &[f64], window: usize) -> Result<f64, IndicatorError> {
    let sma = Sma::try_new(window)?;
    sma.validate_data(closes)?;

    let recent = &closes[closes.len() - window..];
    if let Some(bad) = recent.iter().find(|c| !c.is_finite() || **c <= 0.0) {
        return Err(IndicatorError::InvalidParameter(format!(
            "unusable close {} in window",
            bad
        )));
    }
    sma.latest(recent)
        .ok_or(IndicatorError::InsufficientData {
            required: window,
            available: recent.len(),
        })
}
