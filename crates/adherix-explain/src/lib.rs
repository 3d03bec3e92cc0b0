//! adherix-explain — Ranks model attributions into a human-readable explanation.
//!
//! The raw per-feature contributions come from the model's additive
//! path attribution; this crate selects the top-K in each direction,
//! attaches the schema's feature descriptions, and template-fills a
//! one-sentence summary from the strongest contributor. Attribution
//! failures never fail the prediction — they surface as
//! [`ExplanationOutcome::Unsupported`] upstream.

use tracing::debug;

use adherix_common::error::Result;
use adherix_common::prediction::{Explanation, FactorContribution};
use adherix_common::schema::{FeatureVector, FEATURE_SCHEMA};
use adherix_model::GbdtModel;

/// Contributions below this magnitude are noise, not factors.
const SIGNIFICANCE_FLOOR: f64 = 1e-6;

pub struct Explainer {
    top_k: usize,
}

impl Explainer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Compute and rank per-feature attributions for one scored
    /// vector. An empty factor list (all-default patient on a shallow
    /// model) is a valid explanation, distinct from a failed one.
    pub fn explain(&self, vector: &FeatureVector, model: &GbdtModel) -> Result<Explanation> {
        let (baseline, contributions) = model.feature_contributions(vector)?;

        let mut ranked: Vec<FactorContribution> = FEATURE_SCHEMA
            .iter()
            .zip(contributions.iter())
            .zip(vector.values().iter())
            .filter(|((_, &contribution), _)| contribution.abs() > SIGNIFICANCE_FLOOR)
            .map(|((spec, &contribution), &value)| FactorContribution {
                feature: spec.name.to_string(),
                contribution,
                value,
                description: spec.description.to_string(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top_positive: Vec<FactorContribution> = ranked
            .iter()
            .filter(|f| f.contribution > 0.0)
            .take(self.top_k)
            .cloned()
            .collect();
        let top_negative: Vec<FactorContribution> = ranked
            .iter()
            .filter(|f| f.contribution < 0.0)
            .take(self.top_k)
            .cloned()
            .collect();

        debug!(
            positive = top_positive.len(),
            negative = top_negative.len(),
            "explanation computed"
        );

        let summary = summarize(&top_positive, &top_negative);
        Ok(Explanation {
            baseline,
            top_positive,
            top_negative,
            summary,
        })
    }
}

/// One sentence built from the strongest factor overall.
fn summarize(positive: &[FactorContribution], negative: &[FactorContribution]) -> String {
    let strongest = match (positive.first(), negative.first()) {
        (Some(up), Some(down)) => {
            if up.contribution.abs() >= down.contribution.abs() {
                Some(up)
            } else {
                Some(down)
            }
        }
        (Some(up), None) => Some(up),
        (None, Some(down)) => Some(down),
        (None, None) => None,
    };

    match strongest {
        Some(factor) if factor.contribution > 0.0 => format!(
            "The strongest driver of this risk score is {} ({}).",
            factor.description,
            format_value(factor.value)
        ),
        Some(factor) => format!(
            "The strongest factor lowering this risk score is {} ({}).",
            factor.description,
            format_value(factor.value)
        ),
        None => "No single feature contributed significantly to this score.".to_string(),
    }
}

fn format_value(value: f64) -> String {
    if (value.fract()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
