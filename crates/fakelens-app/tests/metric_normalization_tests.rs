//! Integration tests for raw-score normalization through the full pipeline.

mod common;

use common::{CannedReply, PREDICT_BODY, dispatcher_with, image_artifact};
use fakelens_app::{PipelineOutcome, run_analysis};
use fakelens_metrics::RiskTier;

#[test]
fn metric_normalization_tests_divisors_apply_end_to_end() {
    let (mut dispatcher, _transport) =
        dispatcher_with(vec![("/predict", CannedReply::Body(PREDICT_BODY))], "42");

    let outcome =
        run_analysis(&mut dispatcher, &image_artifact(), None).expect("pipeline should run");
    let PipelineOutcome::Scored(scored) = outcome else {
        panic!("image artifact should produce a scored result");
    };

    // 0.5/1, 60/120, 75/150 all normalize to 50; vision estimate passes
    // through the 0-100 identity scale.
    assert_eq!(scored.metrics[0].label, "Distortion Score");
    assert_eq!(scored.metrics[0].value, 50.0);
    assert_eq!(scored.metrics[1].value, 50.0);
    assert_eq!(scored.metrics[2].value, 50.0);
    assert_eq!(scored.metrics[3].label, "Background Obstruction");
    assert_eq!(scored.metrics[3].value, 42.0);
    assert_eq!(scored.metrics[3].tier, RiskTier::Low);
}

#[test]
fn metric_normalization_tests_out_of_range_raw_scores_saturate() {
    let body = r#"{
        "face_distortion": [
            {"distortion_score": 1.8, "jaw_symmetry": -4.0, "eye_symmetry": 900.0}
        ],
        "best_label": "Fake",
        "best_score": 0.99
    }"#;
    let (mut dispatcher, _transport) =
        dispatcher_with(vec![("/predict", CannedReply::Body(body))], "250");

    let outcome =
        run_analysis(&mut dispatcher, &image_artifact(), None).expect("pipeline should run");
    let PipelineOutcome::Scored(scored) = outcome else {
        panic!("image artifact should produce a scored result");
    };

    assert_eq!(scored.metrics[0].value, 100.0);
    assert_eq!(scored.metrics[1].value, 0.0);
    assert_eq!(scored.metrics[2].value, 100.0);
    // Vision estimates beyond the scale clamp before normalization.
    assert_eq!(scored.metrics[3].value, 100.0);
}
