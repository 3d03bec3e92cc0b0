//! Risk level buckets and the probability → level mapping.
//!
//! Thresholds are configuration, not constants: the clinical team
//! recalibrates them without a model redeploy.

use serde::{Deserialize, Serialize};

use crate::error::{AdherixError, Result};

/// Ordered risk buckets. Derived from probability only, never set
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Lower bounds of the MEDIUM, HIGH, and CRITICAL buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.30,
            high: 0.60,
            critical: 0.85,
        }
    }
}

impl RiskThresholds {
    /// Thresholds must be strictly ascending within (0, 1].
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 < self.medium
            && self.medium < self.high
            && self.high < self.critical
            && self.critical <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(AdherixError::Config(format!(
                "risk thresholds must be strictly ascending in (0, 1]: \
                 medium={}, high={}, critical={}",
                self.medium, self.high, self.critical
            )))
        }
    }
}

/// Map a probability to a risk level. Monotonic by construction.
pub fn classify(probability: f64, thresholds: &RiskThresholds) -> RiskLevel {
    if probability >= thresholds.critical {
        RiskLevel::Critical
    } else if probability >= thresholds.high {
        RiskLevel::High
    } else if probability >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_buckets() {
        let t = RiskThresholds::default();
        assert_eq!(classify(0.0, &t), RiskLevel::Low);
        assert_eq!(classify(0.29, &t), RiskLevel::Low);
        assert_eq!(classify(0.30, &t), RiskLevel::Medium);
        assert_eq!(classify(0.59, &t), RiskLevel::Medium);
        assert_eq!(classify(0.60, &t), RiskLevel::High);
        assert_eq!(classify(0.75, &t), RiskLevel::High);
        assert_eq!(classify(0.85, &t), RiskLevel::Critical);
        assert_eq!(classify(1.0, &t), RiskLevel::Critical);
    }

    #[test]
    fn test_classify_monotonic() {
        let t = RiskThresholds::default();
        let mut prev = classify(0.0, &t);
        for i in 1..=100 {
            let level = classify(i as f64 / 100.0, &t);
            assert!(level >= prev, "classify must never decrease");
            prev = level;
        }
    }

    #[test]
    fn test_threshold_validation() {
        assert!(RiskThresholds::default().validate().is_ok());
        let bad = RiskThresholds {
            medium: 0.6,
            high: 0.3,
            critical: 0.85,
        };
        assert!(bad.validate().is_err());
        let out_of_range = RiskThresholds {
            medium: 0.3,
            high: 0.6,
            critical: 1.2,
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }
}
