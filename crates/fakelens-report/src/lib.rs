#![warn(missing_docs)]
//! # fakelens-report
//!
//! ## Purpose
//! Renders one completed analysis into a paginated plain-text report ready
//! for download.
//!
//! ## Responsibilities
//! - Render the scored (image) pathway: composite score, verdict, four
//!   normalized metrics, four insights.
//! - Render the pre-aggregated video report, substituting `0` for absent
//!   optional per-axis scores so exports never fail on missing data.
//! - Paginate the rendered lines and stamp the download file name with the
//!   report date.
//!
//! ## Data flow
//! Scored result or [`fakelens_analysis_contract::VideoAnalysisReport`] ->
//! `export_*` -> [`ReportDocument`] -> bytes for the download sink.
//!
//! ## Ownership and lifetimes
//! Documents own all rendered text; callers keep their inputs.
//!
//! ## Error model
//! An incomplete insight set is the only rejected input; see [`ExportError`].
//!
//! ## Security and privacy notes
//! Reports contain metric values and insight text only, never media bytes.

use fakelens_analysis_contract::VideoAnalysisReport;
use fakelens_core::{CoreError, stamped_file_name};
use fakelens_insights::{INSIGHT_COUNT, Insight};
use fakelens_metrics::{CompositeScore, NormalizedMetric};
use serde::Serialize;
use thiserror::Error;

/// Lines rendered on one report page.
pub const MAX_LINES_PER_PAGE: usize = 40;

/// File name prefix shared by all exported reports.
const REPORT_PURPOSE: &str = "analysis_report";

/// One paginated, named report ready for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    /// Download file name, `analysis_report_<date>.txt`.
    pub file_name: String,
    /// Pages of at most [`MAX_LINES_PER_PAGE`] lines each.
    pub pages: Vec<Vec<String>>,
}

impl ReportDocument {
    fn from_lines(lines: Vec<String>, iso_date: &str) -> Result<Self, ExportError> {
        let file_name = stamped_file_name(REPORT_PURPOSE, iso_date, "txt")?;

        let pages = lines
            .chunks(MAX_LINES_PER_PAGE)
            .map(<[String]>::to_vec)
            .collect();

        Ok(Self { file_name, pages })
    }

    /// Total rendered line count across all pages.
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// Flattens the document into the downloadable text body.
    pub fn to_text(&self) -> String {
        let mut body = String::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                body.push('\u{c}');
            }
            for line in page {
                body.push_str(line);
                body.push('\n');
            }
        }
        body
    }

    /// Serializes the document for structured consumers.
    ///
    /// # Errors
    /// Returns [`ExportError::Codec`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ExportError> {
        serde_json::to_vec_pretty(self).map_err(|error| ExportError::Codec(error.to_string()))
    }
}

/// Exports the scored (image pathway) analysis as a report document.
///
/// # Errors
/// Returns [`ExportError::IncompleteInsights`] unless exactly four insights
/// are supplied; a partial report is never produced.
pub fn export_composite(
    source_file: &str,
    composite: &CompositeScore,
    metrics: &[NormalizedMetric],
    insights: &[Insight],
    iso_date: &str,
) -> Result<ReportDocument, ExportError> {
    if insights.len() != INSIGHT_COUNT {
        return Err(ExportError::IncompleteInsights {
            expected: INSIGHT_COUNT,
            actual: insights.len(),
        });
    }

    let mut lines = header_lines(iso_date);
    lines.push(format!("Source file: {source_file}"));
    lines.push(String::new());
    lines.push(format!("Overall risk score: {} / 100", composite.score));
    lines.push(format!("Verdict: {}", composite.verdict.label()));
    lines.push(String::new());
    lines.push("Metric breakdown".to_string());

    for metric in metrics {
        lines.push(format!(
            "  {}: {:.2} / 100 ({} risk)",
            metric.label,
            metric.value,
            metric.tier.label()
        ));
    }

    lines.push(String::new());
    lines.push("Insights".to_string());
    for (index, insight) in insights.iter().enumerate() {
        lines.push(format!(
            "  {}. {} [{}]",
            index + 1,
            insight.title,
            severity_label(insight)
        ));
        lines.push(format!("     {}", insight.description));
    }

    ReportDocument::from_lines(lines, iso_date)
}

/// Exports a pre-aggregated video report as a report document.
///
/// Absent optional per-axis scores are rendered as `0` rather than failing
/// the export.
///
/// # Errors
/// Returns [`ExportError`] when the file name cannot be stamped.
pub fn export_video_report(
    source_file: &str,
    report: &VideoAnalysisReport,
    iso_date: &str,
) -> Result<ReportDocument, ExportError> {
    let mut lines = header_lines(iso_date);
    lines.push(format!("Source file: {source_file}"));
    lines.push(String::new());
    lines.push(format!(
        "Confidence score: {:.2} / 100",
        report.confidence_score
    ));
    lines.push(format!("Risk level: {}", report.risk_level));
    lines.push(format!("Assessment: {}", report.analysis_result));
    lines.push(String::new());
    lines.push("Detailed scores".to_string());
    lines.push(format!(
        "  Face quality: {:.2}",
        report.detailed_scores.face_quality_score.unwrap_or(0.0)
    ));
    lines.push(format!(
        "  Frame quality: {:.2}",
        report.detailed_scores.frame_quality_score.unwrap_or(0.0)
    ));
    lines.push(format!(
        "  Audio/visual sync: {:.2}",
        report.detailed_scores.audio_visual_sync_score.unwrap_or(0.0)
    ));
    lines.push(String::new());
    lines.push(format!(
        "Frames processed: {} ({} abnormal)",
        report.total_frames_processed, report.abnormal_frames_detected
    ));
    lines.push(format!("Distorted faces: {}", report.distorted_faces));
    lines.push(format!("Mismatch score: {:.2}", report.mismatch_score));

    let explanation = &report.score_explanation;
    let sections = [
        ("Face analysis", explanation.face_analysis.as_deref()),
        ("Frame analysis", explanation.frame_analysis.as_deref()),
        ("Audio sync", explanation.audio_sync.as_deref()),
    ];
    if sections.iter().any(|(_, text)| text.is_some()) {
        lines.push(String::new());
        lines.push("Explanations".to_string());
        for (title, text) in sections {
            if let Some(text) = text {
                lines.push(format!("  {title}: {text}"));
            }
        }
    }

    ReportDocument::from_lines(lines, iso_date)
}

fn header_lines(iso_date: &str) -> Vec<String> {
    vec![
        "FakeLens Analysis Report".to_string(),
        format!("Generated: {iso_date}"),
        String::new(),
    ]
}

fn severity_label(insight: &Insight) -> &'static str {
    match insight.severity {
        fakelens_insights::Severity::Low => "low",
        fakelens_insights::Severity::Medium => "medium",
        fakelens_insights::Severity::High => "high",
    }
}

/// Report export error type.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The insight set was not exactly four entries.
    #[error("report requires {expected} insights, got {actual}")]
    IncompleteInsights {
        /// Required insight count.
        expected: usize,
        /// Actual insight count.
        actual: usize,
    },
    /// The download file name could not be stamped.
    #[error("report naming failure: {0}")]
    Naming(#[from] CoreError),
    /// Structured serialization failed.
    #[error("report serialization failure: {0}")]
    Codec(String),
}
