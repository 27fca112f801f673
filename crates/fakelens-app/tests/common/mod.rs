//! Shared fixtures for app integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fakelens_core::MediaArtifact;
use fakelens_dispatch::{
    AnalysisDispatcher, AnalysisTransport, MultipartFile, TransportFailure, VisionModel,
};
use fakelens_insights::{InsightModel, ModelFailure};
use url::Url;

/// `/predict` body whose raw scores normalize to 50 / 50 / 50.
#[allow(dead_code)]
pub const PREDICT_BODY: &str = r#"{
    "face_distortion": [
        {"distortion_score": 0.5, "jaw_symmetry": 60.0, "eye_symmetry": 75.0}
    ],
    "best_label": "Fake",
    "best_score": 0.91
}"#;

/// `/process_video` body with optional sections present.
#[allow(dead_code)]
pub const VIDEO_REPORT_BODY: &str = r#"{
    "confidence_score": 78.4,
    "risk_level": "high",
    "analysis_result": "Strong signs of facial manipulation across frames.",
    "detailed_scores": {
        "face_quality_score": 81.0,
        "frame_quality_score": 74.5,
        "audio_visual_sync_score": 79.7
    },
    "distorted_faces": 12,
    "mismatch_score": 1.05,
    "total_frames_processed": 240,
    "abnormal_frames_detected": 37,
    "processing_time": 18.2
}"#;

/// One scripted transport reply.
#[allow(dead_code)]
pub enum CannedReply {
    /// Successful response body.
    Body(&'static str),
    /// Failure status with a message.
    Status(u16, &'static str),
    /// No response reached the client.
    NoResponse(&'static str),
}

/// Transport serving scripted replies keyed by endpoint path.
#[allow(dead_code)]
pub struct CannedTransport {
    replies: HashMap<&'static str, CannedReply>,
    requests: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CannedTransport {
    pub fn new(replies: Vec<(&'static str, CannedReply)>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Endpoint paths hit, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl AnalysisTransport for CannedTransport {
    fn post_multipart(
        &self,
        endpoint: &Url,
        _file: &MultipartFile<'_>,
    ) -> Result<String, TransportFailure> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(endpoint.path().to_string());

        match self.replies.get(endpoint.path()) {
            Some(CannedReply::Body(body)) => Ok((*body).to_string()),
            Some(CannedReply::Status(status, message)) => Err(TransportFailure::Status {
                status: *status,
                message: (*message).to_string(),
            }),
            Some(CannedReply::NoResponse(message)) => {
                Err(TransportFailure::NoResponse((*message).to_string()))
            }
            None => Err(TransportFailure::Status {
                status: 404,
                message: "no scripted reply for path".to_string(),
            }),
        }
    }
}

/// Vision model returning a fixed textual estimate.
#[allow(dead_code)]
pub struct CannedVision(pub &'static str);

impl VisionModel for CannedVision {
    fn estimate_background_obstruction(&self, _image: &[u8]) -> Result<String, TransportFailure> {
        Ok(self.0.to_string())
    }
}

/// Insight model returning a fixed completion.
#[allow(dead_code)]
pub struct CannedInsightModel(pub &'static str);

impl InsightModel for CannedInsightModel {
    fn complete(&self, _prompt: &str) -> Result<String, ModelFailure> {
        Ok(self.0.to_string())
    }
}

/// Insight model that always fails.
#[allow(dead_code)]
pub struct FailingInsightModel;

impl InsightModel for FailingInsightModel {
    fn complete(&self, _prompt: &str) -> Result<String, ModelFailure> {
        Err(ModelFailure("model offline".to_string()))
    }
}

#[allow(dead_code)]
pub fn image_artifact() -> MediaArtifact {
    MediaArtifact::new("photo.png", "image/png", vec![1, 2, 3, 4]).expect("image fixture")
}

#[allow(dead_code)]
pub fn video_artifact() -> MediaArtifact {
    MediaArtifact::new("clip.mp4", "video/mp4", vec![9, 9, 9]).expect("video fixture")
}

#[allow(dead_code)]
pub fn audio_artifact() -> MediaArtifact {
    MediaArtifact::new("voice.mp3", "audio/mpeg", vec![7, 7]).expect("audio fixture")
}

/// Dispatcher whose transport serves the scripted replies; `vision` is the
/// vision model's textual estimate.
#[allow(dead_code)]
pub fn dispatcher_with(
    replies: Vec<(&'static str, CannedReply)>,
    vision: &'static str,
) -> (AnalysisDispatcher, Arc<CannedTransport>) {
    let transport = Arc::new(CannedTransport::new(replies));
    let dispatcher = AnalysisDispatcher::new(
        "http://127.0.0.1:5000",
        Arc::clone(&transport) as Arc<dyn AnalysisTransport>,
        Arc::new(CannedVision(vision)),
    )
    .expect("dispatcher fixture");

    (dispatcher, transport)
}
