//! Integration tests for the per-run file logger.

mod common;

use std::fs;
use std::path::PathBuf;

use common::{CannedReply, PREDICT_BODY, dispatcher_with, image_artifact};
use fakelens_app::{PipelineOutcome, RunLogger, run_analysis_logged};

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fakelens_{label}_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

#[test]
fn run_logger_tests_lines_follow_the_pipe_delimited_format() {
    let logger = RunLogger::new(&scratch_dir("log_format")).expect("logger should open");
    logger.info("startup", "version", "0.1.0");
    logger.error("dispatch", "failed", "connectivity");

    let contents = fs::read_to_string(logger.path()).expect("log file should exist");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    for line in &lines {
        let fields: Vec<&str> = line.split(" | ").collect();
        assert_eq!(fields.len(), 5, "line should have five fields: {line}");

        // `YYYYMMDD_HHMMSS` stamp.
        let stamp = fields[0];
        assert_eq!(stamp.len(), 15);
        assert!(stamp
            .chars()
            .enumerate()
            .all(|(index, c)| if index == 8 { c == '_' } else { c.is_ascii_digit() }));
    }
    assert!(lines[0].contains(" | INFO | startup | version | 0.1.0"));
    assert!(lines[1].contains(" | ERROR | dispatch | failed | connectivity"));
}

#[test]
fn run_logger_tests_logged_analysis_records_fingerprint_not_bytes() {
    let (mut dispatcher, _transport) =
        dispatcher_with(vec![("/predict", CannedReply::Body(PREDICT_BODY))], "42");
    let artifact = image_artifact();
    let logger = RunLogger::new(&scratch_dir("log_scored")).expect("logger should open");

    let outcome =
        run_analysis_logged(&mut dispatcher, &artifact, None, &logger).expect("pipeline");
    assert!(matches!(outcome, PipelineOutcome::Scored(_)));

    let contents = fs::read_to_string(logger.path()).expect("log file should exist");
    assert!(contents.contains(&artifact.fingerprint()));
    assert!(contents.contains("scored composite=48"));

    // Payload bytes never reach the log in any rendering.
    assert!(!contents.contains("[1, 2, 3, 4]"));
    assert!(!contents.contains("1, 2, 3, 4"));
}

#[test]
fn run_logger_tests_failed_analysis_leaves_an_error_line() {
    let (mut dispatcher, _transport) = dispatcher_with(
        vec![("/predict", CannedReply::NoResponse("unreachable"))],
        "42",
    );
    let logger = RunLogger::new(&scratch_dir("log_failure")).expect("logger should open");

    run_analysis_logged(&mut dispatcher, &image_artifact(), None, &logger)
        .expect_err("pipeline should fail");

    let contents = fs::read_to_string(logger.path()).expect("log file should exist");
    assert!(contents.contains(" | ERROR | pipeline | failed | "));
    assert!(contents.contains("unreachable"));
}
