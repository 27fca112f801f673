#![warn(missing_docs)]
//! # fakelens-metrics
//!
//! ## Purpose
//! Converts raw per-modality detector scores into comparable 0–100 metrics
//! and reduces them to one composite risk score.
//!
//! ## Responsibilities
//! - Apply the fixed per-field divisors of the normalization dispatch table.
//! - Clamp every normalized value into [0, 100] and round to two decimals.
//! - Assign deterministic risk tiers and compute the composite verdict.
//!
//! ## Data flow
//! [`fakelens_core::RawMetricSet`] -> [`normalize`] -> four
//! [`NormalizedMetric`] values -> [`aggregate`] -> [`CompositeScore`].
//!
//! ## Ownership and lifetimes
//! Normalized metrics are small copyable values; aggregation never mutates
//! its inputs.
//!
//! ## Error model
//! Aggregation over anything other than exactly four metrics fails with
//! [`MetricsError`]; normalization itself cannot fail.
//!
//! ## Security and privacy notes
//! Pure arithmetic; nothing here touches media bytes or network state.

use fakelens_core::RawMetricSet;
use thiserror::Error;

/// Metrics per modality feeding one composite score.
pub const METRIC_COUNT: usize = 4;

/// Raw scale ceiling for the image distortion score (model output, 0–1).
pub const DISTORTION_SCORE_SCALE: f64 = 1.0;
/// Raw scale ceiling for jaw symmetry.
pub const JAW_SYMMETRY_SCALE: f64 = 120.0;
/// Raw scale ceiling for eye symmetry.
pub const EYE_SYMMETRY_SCALE: f64 = 150.0;
/// Raw scale ceiling for the background-obstruction estimate.
pub const BACKGROUND_OBSTRUCTION_SCALE: f64 = 100.0;
/// Raw scale ceiling shared by all video axes.
pub const VIDEO_AXIS_SCALE: f64 = 100.0;

/// Qualitative tier attached to each normalized metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    /// Value below 50.
    Low,
    /// Value in [50, 75).
    Medium,
    /// Value of 75 or above.
    High,
}

impl RiskTier {
    /// Assigns the tier for one normalized value.
    pub fn from_value(value: f64) -> Self {
        if value >= 75.0 {
            Self::High
        } else if value >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lowercase label used in prompts and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One raw detector score rescaled onto the common 0–100 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMetric {
    /// Human-readable metric name.
    pub label: &'static str,
    /// Normalized value in [0, 100], two-decimal precision.
    pub value: f64,
    /// Deterministic tier for the value.
    pub tier: RiskTier,
}

impl NormalizedMetric {
    fn from_raw(label: &'static str, raw: f64, scale: f64) -> Self {
        let value = normalize_value(raw, scale);
        Self {
            label,
            value,
            tier: RiskTier::from_value(value),
        }
    }
}

/// Rescales one raw value onto [0, 100] with clamping and two-decimal
/// rounding. Values beyond the raw ceiling saturate at 100; negative raw
/// inputs floor at 0.
pub fn normalize_value(raw: f64, scale: f64) -> f64 {
    let scaled = (raw / scale * 100.0).clamp(0.0, 100.0);
    round_two(scaled)
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalizes one raw metric set through the per-modality dispatch table.
pub fn normalize(set: &RawMetricSet) -> [NormalizedMetric; METRIC_COUNT] {
    match set {
        RawMetricSet::Image(image) => [
            NormalizedMetric::from_raw(
                "Distortion Score",
                image.distortion_score,
                DISTORTION_SCORE_SCALE,
            ),
            NormalizedMetric::from_raw("Jaw Symmetry", image.jaw_symmetry, JAW_SYMMETRY_SCALE),
            NormalizedMetric::from_raw("Eye Symmetry", image.eye_symmetry, EYE_SYMMETRY_SCALE),
            NormalizedMetric::from_raw(
                "Background Obstruction",
                image.background_obstruction,
                BACKGROUND_OBSTRUCTION_SCALE,
            ),
        ],
        RawMetricSet::Video(video) => [
            NormalizedMetric::from_raw("Face Distortion", video.face_distortion, VIDEO_AXIS_SCALE),
            NormalizedMetric::from_raw(
                "Lip Sync Deviation",
                video.lip_sync_deviation,
                VIDEO_AXIS_SCALE,
            ),
            NormalizedMetric::from_raw(
                "Frame Consistency",
                video.frame_consistency,
                VIDEO_AXIS_SCALE,
            ),
            NormalizedMetric::from_raw(
                "Audio-Video Mismatch",
                video.audio_video_mismatch,
                VIDEO_AXIS_SCALE,
            ),
        ],
    }
}

/// Final verdict mapped from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Score below 50.
    LikelyAuthentic,
    /// Score in [50, 75].
    PotentiallyManipulated,
    /// Score above 75.
    LikelyDeepfake,
}

impl Verdict {
    /// User-visible status label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LikelyAuthentic => "Likely Authentic",
            Self::PotentiallyManipulated => "Potentially Manipulated",
            Self::LikelyDeepfake => "Likely Deepfake",
        }
    }
}

/// Composite risk score and verdict, always computed as one tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeScore {
    /// Rounded mean of the four normalized metrics, 0–100.
    pub score: u8,
    /// Verdict mapped from the score.
    pub verdict: Verdict,
}

/// Reduces exactly four normalized metrics into one composite score.
///
/// The score/verdict pair is built atomically; a stale score is never paired
/// with a fresh verdict.
///
/// # Errors
/// Returns [`MetricsError::WrongArity`] for any metric count other than four.
pub fn aggregate(metrics: &[NormalizedMetric]) -> Result<CompositeScore, MetricsError> {
    if metrics.len() != METRIC_COUNT {
        return Err(MetricsError::WrongArity {
            expected: METRIC_COUNT,
            actual: metrics.len(),
        });
    }

    let mean = metrics.iter().map(|metric| metric.value).sum::<f64>() / METRIC_COUNT as f64;
    let score = mean.round().clamp(0.0, 100.0) as u8;

    let verdict = if score < 50 {
        Verdict::LikelyAuthentic
    } else if score <= 75 {
        Verdict::PotentiallyManipulated
    } else {
        Verdict::LikelyDeepfake
    };

    Ok(CompositeScore { score, verdict })
}

/// Metric pipeline error type.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Aggregation input did not contain exactly four metrics.
    #[error("composite score requires {expected} metrics, got {actual}")]
    WrongArity {
        /// Required metric count.
        expected: usize,
        /// Actual metric count.
        actual: usize,
    },
}
