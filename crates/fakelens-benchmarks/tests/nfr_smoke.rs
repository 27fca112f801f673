//! Benchmark smoke test for the deterministic scoring loop.

use std::time::Instant;

use fakelens_core::{ImageRawMetrics, MediaArtifact, RawMetricSet};
use fakelens_insights::fallback_insights;
use fakelens_metrics::{aggregate, normalize};

#[test]
fn benchmark_scoring_smoke_prints_latency() {
    let artifact = MediaArtifact::new("bench.png", "image/png", vec![0xAB; 64 * 1024])
        .expect("artifact should be valid");

    let start = Instant::now();
    let mut score_total = 0u64;
    let mut fingerprint_lengths = 0usize;

    for round in 0..1_000_u32 {
        let raw = RawMetricSet::Image(ImageRawMetrics {
            distortion_score: f64::from(round % 100) / 100.0,
            jaw_symmetry: f64::from(round % 120),
            eye_symmetry: f64::from(round % 150),
            background_obstruction: f64::from(round % 100),
        });

        let metrics = normalize(&raw);
        let composite = aggregate(&metrics).expect("composite should compute");
        let insights = fallback_insights(&metrics);

        score_total += u64::from(composite.score);
        fingerprint_lengths += insights.len();
    }
    fingerprint_lengths += artifact.fingerprint().len();

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_scoring_elapsed_ms={elapsed_ms}");
    println!("benchmark_score_total={score_total}");
    println!("benchmark_insight_and_fingerprint_len={fingerprint_lengths}");

    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "scoring smoke benchmark should stay bounded"
    );
}
