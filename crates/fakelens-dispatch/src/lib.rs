#![warn(missing_docs)]
//! # fakelens-dispatch
//!
//! ## Purpose
//! Routes one media artifact to exactly one remote analysis pathway and
//! classifies every failure for user-visible reporting.
//!
//! ## Responsibilities
//! - Select the endpoint by modality: image -> `/predict` plus an auxiliary
//!   vision-model estimate, video -> `/process_video`, audio -> unsupported.
//! - Enforce one in-flight request per artifact; duplicates are rejected,
//!   never queued.
//! - Distinguish server errors (status received), connectivity errors (no
//!   response), and local request-construction errors.
//! - Expose the supplemental per-axis probe endpoints for video artifacts.
//!
//! ## Data flow
//! [`fakelens_core::MediaArtifact`] -> [`AnalysisDispatcher::start`] ->
//! remote call through [`AnalysisTransport`] -> [`AnalysisOutcome`] consumed
//! by metric normalization or handed directly to the exporter.
//!
//! ## Ownership and lifetimes
//! Multipart request parts borrow artifact bytes; responses become owned
//! contract types before any state is updated.
//!
//! ## Error model
//! All failures surface as [`DispatchError`]; `resolve` clears the in-flight
//! marker on every path so the analyzing indicator never sticks. No retries.
//!
//! ## Security and privacy notes
//! Artifact bytes flow only into the configured endpoints; log-safe
//! identifiers are fingerprints, never payloads.

use std::sync::Arc;

use fakelens_analysis_contract::{
    AudioSyncProbe, ContractError, DistortionProbe, FrameProbe, SentimentCounts,
    VideoAnalysisReport, parse_audio_probe, parse_distortion_probe, parse_frame_probe,
    parse_predict_response, parse_sentiment_counts, parse_video_report,
};
use fakelens_core::{ImageRawMetrics, MediaArtifact, Modality, RawMetricSet};
use thiserror::Error;
use url::Url;

/// One file part of a multipart POST.
#[derive(Debug, Clone, Copy)]
pub struct MultipartFile<'a> {
    /// Form field name (`image` or `video`).
    pub field: &'static str,
    /// Original file name forwarded to the service.
    pub file_name: &'a str,
    /// Raw media bytes.
    pub bytes: &'a [u8],
}

/// Remote call failure as observed by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportFailure {
    /// A response arrived carrying a failure status.
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message or body excerpt.
        message: String,
    },
    /// No response reached the client.
    #[error("{0}")]
    NoResponse(String),
}

/// Abstract transport executing multipart POSTs against analysis endpoints.
pub trait AnalysisTransport: Send + Sync {
    /// Sends one multipart POST and returns the raw response body.
    ///
    /// # Errors
    /// Returns [`TransportFailure`] for server and connectivity failures.
    fn post_multipart(
        &self,
        endpoint: &Url,
        file: &MultipartFile<'_>,
    ) -> Result<String, TransportFailure>;
}

/// Generative vision model estimating background manipulation likelihood.
///
/// The returned text is expected to contain one number on a 0–100 scale;
/// the dispatcher parses and clamps it.
pub trait VisionModel: Send + Sync {
    /// Requests a background-manipulation estimate for one image.
    ///
    /// # Errors
    /// Returns [`TransportFailure`] when the model call fails.
    fn estimate_background_obstruction(&self, image: &[u8]) -> Result<String, TransportFailure>;
}

/// Result of one completed dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Raw metrics for client-side normalization and aggregation (image
    /// pathway).
    Metrics(RawMetricSet),
    /// Fully pre-aggregated remote report (video pathway); bypasses the
    /// normalizer and aggregator.
    PreAggregated(Box<VideoAnalysisReport>),
    /// No analysis pathway exists for this modality (audio). The UI must
    /// show "no analysis available" rather than fabricated zeros.
    Unavailable,
}

/// Ticket representing one outstanding analysis request.
///
/// Consumed by [`AnalysisDispatcher::resolve`]; holding a ticket is what
/// keeps the analyzing indicator visible.
#[derive(Debug)]
pub struct PendingAnalysis {
    fingerprint: String,
}

impl PendingAnalysis {
    /// Fingerprint of the artifact this ticket belongs to.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Per-artifact analysis dispatcher with a one-in-flight guard.
pub struct AnalysisDispatcher {
    base: Url,
    transport: Arc<dyn AnalysisTransport>,
    vision: Arc<dyn VisionModel>,
    in_flight: Option<String>,
}

impl AnalysisDispatcher {
    /// Creates a dispatcher against a validated base endpoint.
    ///
    /// # Errors
    /// Returns [`DispatchError::InvalidEndpoint`] when the URL is not
    /// http/https or lacks a host.
    pub fn new(
        base_endpoint: &str,
        transport: Arc<dyn AnalysisTransport>,
        vision: Arc<dyn VisionModel>,
    ) -> Result<Self, DispatchError> {
        let base = Url::parse(base_endpoint)
            .map_err(|error| DispatchError::InvalidEndpoint(error.to_string()))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(DispatchError::InvalidEndpoint(
                "analysis endpoint must use http or https".to_string(),
            ));
        }

        if base.host_str().is_none() {
            return Err(DispatchError::InvalidEndpoint(
                "analysis endpoint must include a host".to_string(),
            ));
        }

        Ok(Self {
            base,
            transport,
            vision,
            in_flight: None,
        })
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_analyzing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Registers one in-flight request for the artifact.
    ///
    /// # Errors
    /// Returns [`DispatchError::Busy`] when any request is outstanding; the
    /// duplicate is rejected, never queued, and existing state is untouched.
    pub fn start(&mut self, artifact: &MediaArtifact) -> Result<PendingAnalysis, DispatchError> {
        if self.in_flight.is_some() {
            return Err(DispatchError::Busy);
        }

        let fingerprint = artifact.fingerprint();
        self.in_flight = Some(fingerprint.clone());
        Ok(PendingAnalysis { fingerprint })
    }

    /// Executes the dispatch for a previously started ticket.
    ///
    /// The in-flight marker is cleared on every path, success or failure, so
    /// the analyzing indicator can never stick.
    ///
    /// # Errors
    /// Returns [`DispatchError`] for mismatched tickets, transport failures,
    /// and malformed responses.
    pub fn resolve(
        &mut self,
        pending: PendingAnalysis,
        artifact: &MediaArtifact,
    ) -> Result<AnalysisOutcome, DispatchError> {
        let result = if pending.fingerprint != artifact.fingerprint() {
            Err(DispatchError::RequestBuild(
                "pending ticket does not match the submitted artifact".to_string(),
            ))
        } else {
            self.perform(artifact)
        };

        self.in_flight = None;
        result
    }

    fn perform(&self, artifact: &MediaArtifact) -> Result<AnalysisOutcome, DispatchError> {
        match artifact.modality {
            Modality::Image => self.perform_image(artifact),
            Modality::Video => self.perform_video(artifact),
            Modality::Audio => Ok(AnalysisOutcome::Unavailable),
        }
    }

    fn perform_image(&self, artifact: &MediaArtifact) -> Result<AnalysisOutcome, DispatchError> {
        let body = self.post(artifact, "/predict")?;
        let predict = parse_predict_response(&body).map_err(malformed)?;

        // Validated non-empty by the contract parser.
        let face = predict.face_distortion[0];

        let raw_estimate = self
            .vision
            .estimate_background_obstruction(&artifact.bytes)
            .map_err(DispatchError::from_transport)?;
        let background_obstruction = parse_clamped_score(&raw_estimate)?;

        Ok(AnalysisOutcome::Metrics(RawMetricSet::Image(
            ImageRawMetrics {
                distortion_score: face.distortion_score,
                jaw_symmetry: face.jaw_symmetry,
                eye_symmetry: face.eye_symmetry,
                background_obstruction,
            },
        )))
    }

    fn perform_video(&self, artifact: &MediaArtifact) -> Result<AnalysisOutcome, DispatchError> {
        let body = self.post(artifact, "/process_video")?;
        let report = parse_video_report(&body).map_err(malformed)?;
        Ok(AnalysisOutcome::PreAggregated(Box::new(report)))
    }

    /// Probes frame-level sentiment counts for a video artifact.
    ///
    /// # Errors
    /// Returns [`DispatchError::WrongModality`] for non-video artifacts.
    pub fn analyze_sentiment(
        &self,
        artifact: &MediaArtifact,
    ) -> Result<SentimentCounts, DispatchError> {
        let body = self.post_video_probe(artifact, "/analyze_sentiment")?;
        parse_sentiment_counts(&body).map_err(malformed)
    }

    /// Probes audio/visual sync metrics for a video artifact.
    ///
    /// # Errors
    /// Returns [`DispatchError::WrongModality`] for non-video artifacts.
    pub fn analyze_audio(&self, artifact: &MediaArtifact) -> Result<AudioSyncProbe, DispatchError> {
        let body = self.post_video_probe(artifact, "/analyze_audio")?;
        parse_audio_probe(&body).map_err(malformed)
    }

    /// Probes frame anomaly counts for a video artifact.
    ///
    /// # Errors
    /// Returns [`DispatchError::WrongModality`] for non-video artifacts.
    pub fn analyze_frame(&self, artifact: &MediaArtifact) -> Result<FrameProbe, DispatchError> {
        let body = self.post_video_probe(artifact, "/analyze_frame")?;
        parse_frame_probe(&body).map_err(malformed)
    }

    /// Probes face distortion counts for a video artifact.
    ///
    /// # Errors
    /// Returns [`DispatchError::WrongModality`] for non-video artifacts.
    pub fn analyze_distortions(
        &self,
        artifact: &MediaArtifact,
    ) -> Result<DistortionProbe, DispatchError> {
        let body = self.post_video_probe(artifact, "/analyze_distortions")?;
        parse_distortion_probe(&body).map_err(malformed)
    }

    fn post_video_probe(
        &self,
        artifact: &MediaArtifact,
        path: &str,
    ) -> Result<String, DispatchError> {
        if artifact.modality != Modality::Video {
            return Err(DispatchError::WrongModality(artifact.modality));
        }
        self.post(artifact, path)
    }

    fn post(&self, artifact: &MediaArtifact, path: &str) -> Result<String, DispatchError> {
        let endpoint = self
            .base
            .join(path)
            .map_err(|error| DispatchError::RequestBuild(error.to_string()))?;

        let file = MultipartFile {
            field: artifact.modality.upload_field(),
            file_name: &artifact.file_name,
            bytes: &artifact.bytes,
        };

        self.transport
            .post_multipart(&endpoint, &file)
            .map_err(DispatchError::from_transport)
    }
}

fn malformed(error: ContractError) -> DispatchError {
    DispatchError::Malformed(error.to_string())
}

/// Parses one generative-model numeric estimate and clamps it to [0, 100].
fn parse_clamped_score(raw: &str) -> Result<f64, DispatchError> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    let value: f64 = trimmed.parse().map_err(|_| {
        DispatchError::Malformed(format!("vision model returned non-numeric estimate: {raw:?}"))
    })?;

    Ok(value.clamp(0.0, 100.0))
}

/// Coarse failure class for runtime observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A response was received with a failure status.
    Server,
    /// No response reached the client.
    Connectivity,
    /// The request never left the client.
    Local,
}

/// Classifies a dispatch error into its failure class.
pub fn classify_dispatch_error(error: &DispatchError) -> FailureClass {
    match error {
        DispatchError::Server { .. } => FailureClass::Server,
        DispatchError::Connectivity(_) => FailureClass::Connectivity,
        DispatchError::InvalidEndpoint(_)
        | DispatchError::Busy
        | DispatchError::RequestBuild(_)
        | DispatchError::Malformed(_)
        | DispatchError::WrongModality(_) => FailureClass::Local,
    }
}

/// Dispatch layer error type.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Endpoint configuration is invalid.
    #[error("invalid analysis endpoint: {0}")]
    InvalidEndpoint(String),
    /// A request is already outstanding; duplicates are never queued.
    #[error("an analysis request is already in flight")]
    Busy,
    /// The request could not be constructed locally.
    #[error("analysis request could not be constructed: {0}")]
    RequestBuild(String),
    /// The service responded with a failure status.
    #[error("analysis service error (status {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
    /// No response reached the client.
    #[error("could not reach the analysis service: {0}")]
    Connectivity(String),
    /// The response or model output had an unexpected shape.
    #[error("malformed analysis response: {0}")]
    Malformed(String),
    /// The operation does not apply to this modality.
    #[error("operation is not available for {0:?} artifacts")]
    WrongModality(Modality),
}

impl DispatchError {
    fn from_transport(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Status { status, message } => Self::Server { status, message },
            TransportFailure::NoResponse(reason) => Self::Connectivity(reason),
        }
    }
}
