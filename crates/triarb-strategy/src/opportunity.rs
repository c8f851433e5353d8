//! Cheap-leg / rich-leg dislocation detector.

use serde::{Deserialize, Serialize};
use triarb_core::error::TriarbError;

/// Absorbs float rounding so that a price exactly on the threshold counts.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpportunityConfig {
    /// Fraction the cheap leg must sit below its average (0.03 = 3%).
    pub depression_threshold: f64,
    /// Fraction the rich leg must sit above its average.
    pub elevation_threshold: f64,
}

impl Default for OpportunityConfig {
    fn default() -> Self {
        Self {
            depression_threshold: 0.03,
            elevation_threshold: 0.03,
        }
    }
}

impl OpportunityConfig {
    /// Validate the thresholds.
    pub fn validate(&self) -> Result<(), TriarbError> {
        if !(0.0..1.0).contains(&self.depression_threshold) {
            return Err(TriarbError::Config(
                "Depression threshold must be in [0, 1)".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.elevation_threshold) {
            return Err(TriarbError::Config(
                "Elevation threshold must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Price and moving average of one baseline pair as of this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LegReading {
    pub price: Option<f64>,
    pub ma: Option<f64>,
}

impl LegReading {
    pub fn new(price: Option<f64>, ma: Option<f64>) -> Self {
        Self { price, ma }
    }

    /// Both values, when present and usable.
    fn usable(&self) -> Option<(f64, f64)> {
        match (self.price, self.ma) {
            (Some(p), Some(m)) if p.is_finite() && m.is_finite() && p > 0.0 && m > 0.0 => {
                Some((p, m))
            }
            _ => None,
        }
    }
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub detected: bool,
    pub rationale: String,
    /// Percent distance of the cheap leg from its average.
    pub cheap_deviation_pct: Option<f64>,
    /// Percent distance of the rich leg from its average.
    pub rich_deviation_pct: Option<f64>,
}

impl Opportunity {
    fn missing(what: &str) -> Self {
        Self {
            detected: false,
            rationale: format!("Insufficient data: {} unavailable", what),
            cheap_deviation_pct: None,
            rich_deviation_pct: None,
        }
    }
}

fn deviation_pct(price: f64, ma: f64) -> f64 {
    (price - ma) / ma * 100.0
}

/// Evaluate the signal. Pure: the same inputs always give the same answer,
/// and missing inputs give `detected == false` rather than an error.
pub fn detect(config: &OpportunityConfig, cheap: LegReading, rich: LegReading) -> Opportunity {
    let Some((cheap_price, cheap_ma)) = cheap.usable() else {
        return Opportunity::missing("cheap-leg price or average");
    };
    let Some((rich_price, rich_ma)) = rich.usable() else {
        return Opportunity::missing("rich-leg price or average");
    };

    let cheap_ratio = cheap_price / cheap_ma;
    let rich_ratio = rich_price / rich_ma;
    let cheap_is_low = cheap_ratio <= 1.0 - config.depression_threshold + BOUNDARY_EPSILON;
    let rich_is_high = rich_ratio >= 1.0 + config.elevation_threshold - BOUNDARY_EPSILON;

    let cheap_dev = deviation_pct(cheap_price, cheap_ma);
    let rich_dev = deviation_pct(rich_price, rich_ma);

    let rationale = format!(
        "cheap leg {:+.2}% vs MA (needs <= -{:.2}%): {}; rich leg {:+.2}% vs MA (needs >= +{:.2}%): {}",
        cheap_dev,
        config.depression_threshold * 100.0,
        if cheap_is_low { "met" } else { "not met" },
        rich_dev,
        config.elevation_threshold * 100.0,
        if rich_is_high { "met" } else { "not met" },
    );

    Opportunity {
        detected: cheap_is_low && rich_is_high,
        rationale,
        cheap_deviation_pct: Some(cheap_dev),
        rich_deviation_pct: Some(rich_dev),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(price: f64, ma: f64) -> LegReading {
        LegReading::new(Some(price), Some(ma))
    }

    #[test]
    fn test_config_validation() {
        let mut config = OpportunityConfig::default();
        assert!(config.validate().is_ok());

        config.depression_threshold = 1.0;
        assert!(config.validate().is_err());

        config.depression_threshold = 0.03;
        config.elevation_threshold = -0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let config = OpportunityConfig::default();
        let result = detect(&config, reading(0.485, 0.50), reading(61800.0, 60000.0));
        assert!(result.detected, "{}", result.rationale);
        assert!((result.cheap_deviation_pct.unwrap() + 3.0).abs() < 1e-9);
        assert!((result.rich_deviation_pct.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_requires_both_legs() {
        let config = OpportunityConfig::default();

        // cheap leg depressed, rich leg flat
        assert!(!detect(&config, reading(0.48, 0.50), reading(60000.0, 60000.0)).detected);
        // rich leg elevated, cheap leg flat
        assert!(!detect(&config, reading(0.50, 0.50), reading(62000.0, 60000.0)).detected);
        // just inside the boundary on the cheap leg
        assert!(!detect(&config, reading(0.4851, 0.50), reading(61800.0, 60000.0)).detected);
    }

    #[test]
    fn test_thresholds_move_boundary() {
        let tight = OpportunityConfig {
            depression_threshold: 0.05,
            elevation_threshold: 0.03,
        };
        assert!(!detect(&tight, reading(0.485, 0.50), reading(61800.0, 60000.0)).detected);
        assert!(detect(&tight, reading(0.475, 0.50), reading(61800.0, 60000.0)).detected);

        let loose = OpportunityConfig {
            depression_threshold: 0.01,
            elevation_threshold: 0.01,
        };
        assert!(detect(&loose, reading(0.495, 0.50), reading(60600.0, 60000.0)).detected);
    }

    #[test]
    fn test_missing_inputs_never_signal() {
        let config = OpportunityConfig::default();
        let cases = [
            (LegReading::new(None, Some(0.5)), reading(61800.0, 60000.0)),
            (LegReading::new(Some(0.4), None), reading(61800.0, 60000.0)),
            (reading(0.4, 0.5), LegReading::new(Some(70000.0), None)),
            (reading(0.4, 0.5), LegReading::default()),
            (reading(f64::NAN, 0.5), reading(61800.0, 60000.0)),
            (reading(0.4, 0.0), reading(61800.0, 60000.0)),
        ];
        for (cheap, rich) in cases {
            let result = detect(&config, cheap, rich);
            assert!(!result.detected);
            assert!(result.rationale.starts_with("Insufficient data"));
        }
    }

    #[test]
    fn test_pure() {
        let config = OpportunityConfig::default();
        let a = detect(&config, reading(0.47, 0.50), reading(63000.0, 60000.0));
        let b = detect(&config, reading(0.47, 0.50), reading(63000.0, 60000.0));
        assert_eq!(a, b);
        assert!(a.detected);
    }
}
