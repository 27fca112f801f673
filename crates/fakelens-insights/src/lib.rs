#![warn(missing_docs)]
//! # fakelens-insights
//!
//! ## Purpose
//! Produces exactly four human-readable insights for one scored analysis,
//! either from a generative model or from a deterministic fallback.
//!
//! ## Responsibilities
//! - Build the metric-grounded prompt sent to the insight model.
//! - Strip Markdown code fences and validate the model's JSON array.
//! - Fall back to threshold-derived insights when the model path fails; the
//!   two sources are never mixed within one result.
//!
//! ## Data flow
//! Normalized metrics plus composite score -> [`generate_insights`] ->
//! four [`Insight`] values tagged with their [`InsightOrigin`].
//!
//! ## Ownership and lifetimes
//! Insights own their strings; nothing borrows from the model response
//! buffer.
//!
//! ## Error model
//! The model path failing is not an error for callers: the fallback always
//! produces a complete set. [`InsightError`] only covers impossible inputs.
//!
//! ## Security and privacy notes
//! Prompts contain metric names and numbers only, never media bytes or file
//! contents.

use fakelens_metrics::{CompositeScore, METRIC_COUNT, NormalizedMetric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Insights shown for every completed analysis.
pub const INSIGHT_COUNT: usize = 4;

/// Severity attached to one insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Metric value at or below 50.
    Low,
    /// Metric value above 50.
    Medium,
    /// Metric value above 70.
    High,
}

impl Severity {
    /// Deterministic severity for one normalized metric value.
    pub fn from_metric_value(value: f64) -> Self {
        if value > 70.0 {
            Self::High
        } else if value > 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One human-readable observation about the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Short headline, typically the metric name.
    pub title: String,
    /// One or two sentences grounded in the metric value.
    pub description: String,
    /// Severity of the observation.
    pub severity: Severity,
}

/// Which path produced the insight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightOrigin {
    /// The generative model returned a valid four-insight array.
    Generated,
    /// The deterministic fallback produced the set.
    Fallback,
}

/// Complete insight set for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSet {
    /// Exactly four insights.
    pub insights: Vec<Insight>,
    /// Source of the set; never mixed.
    pub origin: InsightOrigin,
}

/// Failure reported by an insight model implementation.
#[derive(Debug, Error)]
#[error("insight model failure: {0}")]
pub struct ModelFailure(pub String);

/// Generative model producing insight text from a prompt.
pub trait InsightModel: Send + Sync {
    /// Requests one completion for the prompt.
    ///
    /// # Errors
    /// Returns [`ModelFailure`] when the model cannot be reached or refuses.
    fn complete(&self, prompt: &str) -> Result<String, ModelFailure>;
}

/// Builds the prompt embedding every metric and the composite verdict.
pub fn build_prompt(metrics: &[NormalizedMetric], composite: &CompositeScore) -> String {
    let mut prompt = String::from(
        "You are a deepfake detection assistant. Given the analysis metrics \
         below, respond with a JSON array of exactly 4 objects, each with \
         \"title\", \"description\" and \"severity\" (low, medium or high) \
         fields. Respond with the JSON array only.\n\nMetrics:\n",
    );

    for metric in metrics {
        prompt.push_str(&format!(
            "- {}: {:.2} / 100 ({} risk)\n",
            metric.label,
            metric.value,
            metric.tier.label()
        ));
    }

    prompt.push_str(&format!(
        "\nComposite score: {} / 100\nVerdict: {}\n",
        composite.score,
        composite.verdict.label()
    ));

    prompt
}

/// Removes a surrounding Markdown code fence, with or without a language
/// tag, from a model response.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line if one follows the opening fence.
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_generated(raw: &str) -> Option<Vec<Insight>> {
    let body = strip_code_fences(raw);
    let insights: Vec<Insight> = serde_json::from_str(body).ok()?;

    if insights.len() != INSIGHT_COUNT {
        return None;
    }

    if insights
        .iter()
        .any(|insight| insight.title.trim().is_empty() || insight.description.trim().is_empty())
    {
        return None;
    }

    Some(insights)
}

/// Deterministic per-metric insights derived from severity thresholds.
pub fn fallback_insights(metrics: &[NormalizedMetric]) -> Vec<Insight> {
    metrics
        .iter()
        .map(|metric| {
            let severity = Severity::from_metric_value(metric.value);
            let description = match severity {
                Severity::High => format!(
                    "{} measured {:.2} out of 100, a strong indicator of manipulation.",
                    metric.label, metric.value
                ),
                Severity::Medium => format!(
                    "{} measured {:.2} out of 100, which warrants a closer look.",
                    metric.label, metric.value
                ),
                Severity::Low => format!(
                    "{} measured {:.2} out of 100, within the expected range for \
                     authentic media.",
                    metric.label, metric.value
                ),
            };

            Insight {
                title: metric.label.to_string(),
                description,
                severity,
            }
        })
        .collect()
}

/// Produces the insight set for one scored analysis.
///
/// The model path is attempted first; any failure there (transport, refusal,
/// malformed JSON, wrong count, blank fields) switches the entire set to the
/// deterministic fallback. When `model` is `None` the fallback is used
/// directly.
///
/// # Errors
/// Returns [`InsightError::WrongArity`] when the metric slice does not hold
/// exactly four entries.
pub fn generate_insights(
    model: Option<&dyn InsightModel>,
    metrics: &[NormalizedMetric],
    composite: &CompositeScore,
) -> Result<InsightSet, InsightError> {
    if metrics.len() != METRIC_COUNT {
        return Err(InsightError::WrongArity {
            expected: METRIC_COUNT,
            actual: metrics.len(),
        });
    }

    if let Some(model) = model {
        let prompt = build_prompt(metrics, composite);
        if let Ok(raw) = model.complete(&prompt) {
            if let Some(insights) = parse_generated(&raw) {
                return Ok(InsightSet {
                    insights,
                    origin: InsightOrigin::Generated,
                });
            }
        }
    }

    Ok(InsightSet {
        insights: fallback_insights(metrics),
        origin: InsightOrigin::Fallback,
    })
}

/// Insight generation error type.
#[derive(Debug, Error)]
pub enum InsightError {
    /// Input did not contain exactly four metrics.
    #[error("insight generation requires {expected} metrics, got {actual}")]
    WrongArity {
        /// Required metric count.
        expected: usize,
        /// Actual metric count.
        actual: usize,
    },
}
