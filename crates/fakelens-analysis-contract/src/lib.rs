#![warn(missing_docs)]
//! # fakelens-analysis-contract
//!
//! ## Purpose
//! Defines the remote analysis endpoint response schemas and client-side
//! parsing helpers.
//!
//! ## Responsibilities
//! - Parse the `/predict` image response and the `/process_video` aggregated
//!   report.
//! - Parse the supplemental probe endpoints (`/analyze_sentiment`,
//!   `/analyze_audio`, `/analyze_frame`, `/analyze_distortions`).
//! - Tolerate absent optional fields so exports never fail on missing
//!   per-axis scores.
//!
//! ## Data flow
//! Raw JSON response -> `parse_*` helpers -> typed reports consumed by the
//! dispatcher and the report exporter.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON or missing mandatory fields return [`ContractError`].
//!
//! ## Security and privacy notes
//! This crate processes model outputs only; it never touches media bytes or
//! credentials.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Face-level raw scores from one detected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDistortionScores {
    /// Model distortion score, 0–1.
    pub distortion_score: f64,
    /// Jaw symmetry measure, 0–120.
    pub jaw_symmetry: f64,
    /// Eye symmetry measure, 0–150.
    pub eye_symmetry: f64,
}

/// Response shape of `POST /predict` (multipart field `image`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Per-face raw scores; the first entry drives the image metric set.
    #[serde(default)]
    pub face_distortion: Vec<FaceDistortionScores>,
    /// Winning classification label.
    pub best_label: String,
    /// Winning classification confidence, 0–1.
    pub best_score: f64,
}

/// Optional per-axis quality scores inside the video report.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedScores {
    /// Face quality score, 0–100.
    #[serde(default)]
    pub face_quality_score: Option<f64>,
    /// Frame quality score, 0–100.
    #[serde(default)]
    pub frame_quality_score: Option<f64>,
    /// Audio/visual sync score, 0–100.
    #[serde(default)]
    pub audio_visual_sync_score: Option<f64>,
}

/// Natural-language per-axis explanations inside the video report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreExplanation {
    /// Face analysis summary.
    #[serde(default)]
    pub face_analysis: Option<String>,
    /// Frame analysis summary.
    #[serde(default)]
    pub frame_analysis: Option<String>,
    /// Audio sync summary.
    #[serde(default)]
    pub audio_sync: Option<String>,
}

/// Fully pre-aggregated report returned by `POST /process_video`.
///
/// This path bypasses client-side normalization and aggregation; the remote
/// side already produced a final risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisReport {
    /// Final confidence score, 0–100.
    pub confidence_score: f64,
    /// Remote risk tier label.
    pub risk_level: String,
    /// Natural-language verdict summary.
    pub analysis_result: String,
    /// Optional per-axis quality scores.
    #[serde(default)]
    pub detailed_scores: DetailedScores,
    /// Faces flagged as distorted.
    #[serde(default)]
    pub distorted_faces: u64,
    /// Audio/visual mismatch score.
    #[serde(default)]
    pub mismatch_score: f64,
    /// Frames the remote side processed.
    #[serde(default)]
    pub total_frames_processed: u64,
    /// Frames flagged as abnormal.
    #[serde(default)]
    pub abnormal_frames_detected: u64,
    /// Optional per-axis explanations.
    #[serde(default)]
    pub score_explanation: ScoreExplanation,
    /// Server-side processing time in seconds.
    #[serde(default)]
    pub processing_time: f64,
}

/// Emotion counts from `POST /analyze_sentiment`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentCounts {
    /// Frames classified angry.
    pub angry: f64,
    /// Frames classified happy.
    pub happy: f64,
    /// Frames classified neutral.
    pub neutral: f64,
    /// Frames classified sad.
    pub sad: f64,
    /// Frames classified surprised.
    pub surprise: f64,
}

/// Similarity metrics inside the `/analyze_audio` tuple response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSyncMetrics {
    /// Cosine similarity between audio and lip embeddings.
    pub cosine_similarity: f64,
    /// Euclidean distance between audio and lip embeddings.
    pub euclidean_distance: f64,
    /// Combined mismatch score.
    pub mismatch_score: f64,
}

/// Parsed `/analyze_audio` response: `[ metrics, face_detection_rate ]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSyncProbe {
    /// Similarity metrics.
    pub metrics: AudioSyncMetrics,
    /// Fraction of frames with a detected face, 0–100.
    pub face_detection_rate: f64,
}

/// Parsed `/analyze_frame` response: `[ total_frames, abnormal_frames ]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProbe {
    /// Frames inspected.
    pub total_frames: u64,
    /// Frames flagged abnormal.
    pub abnormal_frames: u64,
}

/// Parsed `/analyze_distortions` response: `[ total_frames, distorted_faces ]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistortionProbe {
    /// Frames inspected.
    pub total_frames: u64,
    /// Faces flagged distorted.
    pub distorted_faces: u64,
}

/// Parses and validates a `/predict` response.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON and
/// [`ContractError::InvalidContract`] when no face-level scores are present
/// or the label is blank.
pub fn parse_predict_response(raw: &str) -> Result<PredictResponse, ContractError> {
    let parsed: PredictResponse = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if parsed.best_label.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "best_label is empty".to_string(),
        ));
    }

    if parsed.face_distortion.is_empty() {
        return Err(ContractError::InvalidContract(
            "response contains no face-level scores".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parses and validates a `/process_video` aggregated report.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON and
/// [`ContractError::InvalidContract`] for non-finite confidence or a blank
/// risk tier.
pub fn parse_video_report(raw: &str) -> Result<VideoAnalysisReport, ContractError> {
    let parsed: VideoAnalysisReport = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if !parsed.confidence_score.is_finite() {
        return Err(ContractError::InvalidContract(
            "confidence_score is not a finite number".to_string(),
        ));
    }

    if parsed.risk_level.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "risk_level is empty".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parses a `/analyze_sentiment` response.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
pub fn parse_sentiment_counts(raw: &str) -> Result<SentimentCounts, ContractError> {
    serde_json::from_str(raw).map_err(ContractError::Decode)
}

/// Parses the `/analyze_audio` 2-tuple response.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the payload is not a
/// `[metrics, rate]` pair.
pub fn parse_audio_probe(raw: &str) -> Result<AudioSyncProbe, ContractError> {
    let (metrics, face_detection_rate): (AudioSyncMetrics, f64) =
        serde_json::from_str(raw).map_err(ContractError::Decode)?;

    Ok(AudioSyncProbe {
        metrics,
        face_detection_rate,
    })
}

/// Parses the `/analyze_frame` 2-tuple response.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the payload is not a pair of
/// counts.
pub fn parse_frame_probe(raw: &str) -> Result<FrameProbe, ContractError> {
    let (total_frames, abnormal_frames): (u64, u64) =
        serde_json::from_str(raw).map_err(ContractError::Decode)?;

    Ok(FrameProbe {
        total_frames,
        abnormal_frames,
    })
}

/// Parses the `/analyze_distortions` 2-tuple response.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the payload is not a pair of
/// counts.
pub fn parse_distortion_probe(raw: &str) -> Result<DistortionProbe, ContractError> {
    let (total_frames, distorted_faces): (u64, u64) =
        serde_json::from_str(raw).map_err(ContractError::Decode)?;

    Ok(DistortionProbe {
        total_frames,
        distorted_faces,
    })
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}
