#![warn(missing_docs)]
//! # fakelens-core
//!
//! ## Purpose
//! Defines the shared media and metric data model used across the `fakelens`
//! workspace.
//!
//! ## Responsibilities
//! - Represent captured or uploaded media artifacts with a modality tag.
//! - Derive stable artifact fingerprints for in-flight deduplication.
//! - Model raw per-modality metric sets produced by remote analysis.
//! - Build deterministic timestamped file names for exports and recordings.
//!
//! ## Data flow
//! Capture or file selection produces a [`MediaArtifact`]. The dispatcher
//! keys in-flight requests on [`MediaArtifact::fingerprint`], and analysis
//! responses become a [`RawMetricSet`] consumed by metric normalization.
//!
//! ## Ownership and lifetimes
//! Artifacts and metric sets own their backing buffers (`Vec<u8>`, `String`)
//! to avoid hidden borrow coupling between pipeline stages.
//!
//! ## Error model
//! Validation failures (empty payloads, unsupported MIME types, malformed
//! name components) return [`CoreError`] variants with caller-actionable
//! categorization.
//!
//! ## Security and privacy notes
//! This crate never logs artifact bytes. Fingerprints are one-way digests and
//! safe to include in log lines.
//!
//! ## Example
//! ```rust
//! use fakelens_core::{MediaArtifact, Modality};
//!
//! let artifact = MediaArtifact::new("clip.webm", "video/webm", vec![1, 2, 3]).unwrap();
//! assert_eq!(artifact.modality, Modality::Video);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Media kind governing which metric set and endpoint apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Still image (`image/*` MIME family).
    Image,
    /// Video clip (`video/*` MIME family).
    Video,
    /// Audio-only media (`audio/*` MIME family); analysis is unsupported.
    Audio,
}

impl Modality {
    /// Derives the modality tag from a MIME type string.
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedMime`] for anything outside the
    /// `image/`, `video/`, and `audio/` families.
    pub fn from_mime(mime: &str) -> Result<Self, CoreError> {
        let normalized = mime.trim().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            Ok(Self::Image)
        } else if normalized.starts_with("video/") {
            Ok(Self::Video)
        } else if normalized.starts_with("audio/") {
            Ok(Self::Audio)
        } else {
            Err(CoreError::UnsupportedMime(mime.to_string()))
        }
    }

    /// Returns the multipart field name the remote endpoints expect for this
    /// modality.
    pub fn upload_field(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video | Self::Audio => "video",
        }
    }
}

/// One captured or user-selected media file awaiting analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    /// Display file name shown in the preview surface.
    pub file_name: String,
    /// MIME-derived modality tag.
    pub modality: Modality,
    /// Raw media bytes.
    pub bytes: Vec<u8>,
}

impl MediaArtifact {
    /// Constructs a validated artifact.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyArtifact`] when the payload is empty and
    /// [`CoreError::UnsupportedMime`] for unrecognized MIME families.
    pub fn new(
        file_name: impl Into<String>,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::EmptyArtifact);
        }

        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(CoreError::InvalidFileName(
                "artifact file name is empty".to_string(),
            ));
        }

        Ok(Self {
            file_name,
            modality: Modality::from_mime(mime)?,
            bytes,
        })
    }

    /// Returns the hex-encoded SHA-256 digest of the payload.
    ///
    /// Identical payloads always produce identical fingerprints, which the
    /// dispatcher uses to refuse duplicate in-flight submissions.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    /// Returns payload size in bytes for log-safe summaries.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the payload is empty.
    ///
    /// Constructed artifacts are never empty; this exists for slice-style API
    /// symmetry.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Raw face-level scores returned by the image analysis pathway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRawMetrics {
    /// Model distortion score on a 0–1 scale.
    pub distortion_score: f64,
    /// Jaw symmetry measure on a 0–120 scale.
    pub jaw_symmetry: f64,
    /// Eye symmetry measure on a 0–150 scale.
    pub eye_symmetry: f64,
    /// Background-manipulation likelihood on a 0–100 scale.
    pub background_obstruction: f64,
}

/// Raw per-axis scores for the video pathway, each on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoRawMetrics {
    /// Face distortion level.
    pub face_distortion: f64,
    /// Lip-sync deviation level.
    pub lip_sync_deviation: f64,
    /// Frame-to-frame consistency anomaly level.
    pub frame_consistency: f64,
    /// Audio/video mismatch level.
    pub audio_video_mismatch: f64,
}

/// Modality-keyed raw metric set; immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawMetricSet {
    /// Metrics from the image pathway.
    Image(ImageRawMetrics),
    /// Metrics from the video pathway.
    Video(VideoRawMetrics),
}

impl RawMetricSet {
    /// Returns the modality this metric set belongs to.
    pub fn modality(&self) -> Modality {
        match self {
            Self::Image(_) => Modality::Image,
            Self::Video(_) => Modality::Video,
        }
    }
}

/// Builds a `<purpose>_<ISO-date>.<ext>` file name.
///
/// # Errors
/// Returns [`CoreError::InvalidFileName`] when any component is blank or the
/// purpose contains path separators.
pub fn stamped_file_name(purpose: &str, iso_date: &str, ext: &str) -> Result<String, CoreError> {
    if purpose.trim().is_empty() || iso_date.trim().is_empty() || ext.trim().is_empty() {
        return Err(CoreError::InvalidFileName(
            "file name components must be non-empty".to_string(),
        ));
    }

    if purpose.contains('/') || purpose.contains('\\') {
        return Err(CoreError::InvalidFileName(
            "file name purpose must not contain path separators".to_string(),
        ));
    }

    Ok(format!("{purpose}_{iso_date}.{ext}"))
}

/// Error type for core domain validation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Artifact payload is empty.
    #[error("media artifact payload is empty")]
    EmptyArtifact,
    /// MIME type is outside the supported image/video/audio families.
    #[error("unsupported media type: {0}")]
    UnsupportedMime(String),
    /// File name or name component is invalid.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    /// JSON encoding/decoding error.
    #[error("payload codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
