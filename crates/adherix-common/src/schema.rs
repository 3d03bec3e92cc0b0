//! The fixed feature schema the model was trained against.
//!
//! The extractor, the cache, the model, and the explainer all agree on
//! this ordering. Schema drift between extraction and inference is a
//! bug and is caught by [`FeatureVector`] validation, not at scoring
//! time deep inside the tree walk.

use serde::{Deserialize, Serialize};

use crate::error::{AdherixError, Result};

/// One feature the model consumes.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Name as it appears in the trained artifact.
    pub name: &'static str,
    /// Imputation default applied when the raw fact is missing.
    pub default: f64,
    /// Human-readable description, used verbatim in explanations.
    pub description: &'static str,
}

/// The 13 features, in trained order. Order is load-bearing.
pub const FEATURE_SCHEMA: &[FeatureSpec] = &[
    FeatureSpec {
        name: "age",
        default: 35.0,
        description: "patient age in years",
    },
    FeatureSpec {
        name: "sex_code",
        default: 0.0,
        description: "sex (0 = female/unknown, 1 = male)",
    },
    FeatureSpec {
        name: "cd4_count",
        default: 500.0,
        description: "most recent CD4 count (cells/mm3)",
    },
    FeatureSpec {
        name: "viral_load_suppressed",
        default: 1.0,
        description: "most recent viral load suppressed (1 = yes)",
    },
    FeatureSpec {
        name: "months_on_art",
        default: 12.0,
        description: "months on antiretroviral treatment",
    },
    FeatureSpec {
        name: "days_since_last_visit",
        default: 30.0,
        description: "days since the last clinic visit",
    },
    FeatureSpec {
        name: "missed_appointments_6m",
        default: 0.0,
        description: "missed appointments in the last 6 months",
    },
    FeatureSpec {
        name: "pickup_adherence_pct",
        default: 100.0,
        description: "medication pickup adherence (%)",
    },
    FeatureSpec {
        name: "distance_to_facility_km",
        default: 5.0,
        description: "distance from home to facility (km)",
    },
    FeatureSpec {
        name: "has_phone",
        default: 1.0,
        description: "patient has a reachable phone (1 = yes)",
    },
    FeatureSpec {
        name: "has_support_system",
        default: 1.0,
        description: "patient has a disclosed support system (1 = yes)",
    },
    FeatureSpec {
        name: "regimen_code",
        default: 0.0,
        description: "current ART regimen (fixed integer code)",
    },
    FeatureSpec {
        name: "prior_interruptions",
        default: 0.0,
        description: "prior treatment interruption episodes",
    },
];

/// Number of features the model expects.
pub fn feature_count() -> usize {
    FEATURE_SCHEMA.len()
}

/// Index of a feature by name, if it exists in the schema.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|spec| spec.name == name)
}

/// Dense, fixed-order numeric representation of one patient.
///
/// Always complete: construction imputes defaults, and deserialization
/// rejects vectors whose length does not match the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// A vector with every feature at its imputation default.
    pub fn defaults() -> Self {
        Self {
            values: FEATURE_SCHEMA.iter().map(|spec| spec.default).collect(),
        }
    }

    /// Build from a complete, schema-ordered slice.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.len() != FEATURE_SCHEMA.len() {
            return Err(AdherixError::FeatureShape {
                expected: FEATURE_SCHEMA.len(),
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values[i])
    }

    /// Set a feature by name. Unknown names are a schema mismatch so
    /// that caller-supplied overrides cannot silently vanish.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let idx = feature_index(name).ok_or_else(|| {
            AdherixError::SchemaMismatch(format!("unknown feature '{name}'"))
        })?;
        self.values[idx] = value;
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        FeatureVector::from_values(values).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let v = FeatureVector::defaults();
        assert_eq!(v.len(), FEATURE_SCHEMA.len());
        for spec in FEATURE_SCHEMA {
            assert_eq!(v.get(spec.name), Some(spec.default));
        }
    }

    #[test]
    fn test_schema_names_unique() {
        for (i, a) in FEATURE_SCHEMA.iter().enumerate() {
            for b in &FEATURE_SCHEMA[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_set_unknown_feature_rejected() {
        let mut v = FeatureVector::defaults();
        assert!(v.set("not_a_feature", 1.0).is_err());
    }

    #[test]
    fn test_from_values_wrong_length() {
        let err = FeatureVector::from_values(vec![1.0, 2.0]).unwrap_err();
        match err {
            AdherixError::FeatureShape { expected, actual } => {
                assert_eq!(expected, FEATURE_SCHEMA.len());
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_serde_round_trip_validates_length() {
        let v = FeatureVector::defaults();
        let json = serde_json::to_string(&v).unwrap();
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);

        let short: std::result::Result<FeatureVector, _> =
            serde_json::from_str("[1.0, 2.0, 3.0]");
        assert!(short.is_err());
    }
}
