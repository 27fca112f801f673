//! Integration tests for the one-in-flight dispatch guard.

mod common;

use common::{CannedReply, PREDICT_BODY, audio_artifact, dispatcher_with, image_artifact};
use fakelens_dispatch::{AnalysisOutcome, DispatchError};

#[test]
fn dispatch_guard_tests_duplicate_start_is_rejected_not_queued() {
    let (mut dispatcher, transport) =
        dispatcher_with(vec![("/predict", CannedReply::Body(PREDICT_BODY))], "42");
    let artifact = image_artifact();

    let pending = dispatcher.start(&artifact).expect("first start");
    assert!(dispatcher.is_analyzing());

    // The duplicate fails immediately and nothing reaches the transport.
    assert!(matches!(
        dispatcher.start(&artifact),
        Err(DispatchError::Busy)
    ));
    assert!(transport.requests().is_empty());

    let outcome = dispatcher.resolve(pending, &artifact).expect("resolve");
    assert!(matches!(outcome, AnalysisOutcome::Metrics(_)));
    assert!(!dispatcher.is_analyzing());
}

#[test]
fn dispatch_guard_tests_indicator_clears_on_failure() {
    let (mut dispatcher, _transport) = dispatcher_with(
        vec![("/predict", CannedReply::Status(500, "model crashed"))],
        "42",
    );
    let artifact = image_artifact();

    let pending = dispatcher.start(&artifact).expect("start");
    assert!(dispatcher.resolve(pending, &artifact).is_err());

    // A failed request never leaves the indicator stuck.
    assert!(!dispatcher.is_analyzing());
    assert!(dispatcher.start(&artifact).is_ok());
}

#[test]
fn dispatch_guard_tests_audio_reports_unavailable_without_network() {
    let (mut dispatcher, transport) = dispatcher_with(vec![], "42");
    let artifact = audio_artifact();

    let pending = dispatcher.start(&artifact).expect("start");
    let outcome = dispatcher.resolve(pending, &artifact).expect("resolve");

    assert_eq!(outcome, AnalysisOutcome::Unavailable);
    assert!(transport.requests().is_empty());
}

#[test]
fn dispatch_guard_tests_mismatched_ticket_is_rejected() {
    let (mut dispatcher, _transport) =
        dispatcher_with(vec![("/predict", CannedReply::Body(PREDICT_BODY))], "42");

    let first = image_artifact();
    let pending = dispatcher.start(&first).expect("start");

    let other =
        fakelens_core::MediaArtifact::new("other.png", "image/png", vec![5, 6]).expect("artifact");
    assert!(matches!(
        dispatcher.resolve(pending, &other),
        Err(DispatchError::RequestBuild(_))
    ));
    assert!(!dispatcher.is_analyzing());
}
