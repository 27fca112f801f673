#![warn(missing_docs)]
//! # fakelens-app
//!
//! ## Purpose
//! Orchestrates capture, dispatch, scoring, insights, reporting, and UI state
//! for `fakelens`.
//!
//! ## Responsibilities
//! - Enforce the fixed pipeline ordering: dispatch -> normalize -> aggregate
//!   -> insights -> export.
//! - Resolve runtime configuration from the environment (analysis endpoint,
//!   insights kill-switch).
//! - Project lane state into UI-safe status snapshots.
//! - Provide per-run file logging for runtime observability.
//!
//! ## Data flow
//! Media artifact -> dispatcher outcome -> metric pipeline or pre-aggregated
//! report -> insight generation -> report export -> UI projection.
//!
//! ## Ownership and lifetimes
//! This crate passes owned results between subsystems to avoid hidden
//! aliasing between pipeline stages.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`] and categorized for runtime
//! observability.
//!
//! ## Security and privacy notes
//! - The insights kill-switch env var can disable generative calls at
//!   runtime; the deterministic fallback still produces a complete set.
//! - Log lines carry fingerprints and stage names, never media bytes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fakelens_analysis_contract::VideoAnalysisReport;
use fakelens_core::MediaArtifact;
use fakelens_dispatch::{AnalysisDispatcher, AnalysisOutcome, DispatchError};
use fakelens_insights::{InsightModel, InsightSet, generate_insights};
use fakelens_metrics::{CompositeScore, METRIC_COUNT, NormalizedMetric, aggregate, normalize};
use fakelens_report::{ReportDocument, export_composite, export_video_report};
use fakelens_ui::{AnalysisLane, LanePhase};
use thiserror::Error;
use time::OffsetDateTime;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FAKELENS_VERSION");

/// Default analysis service endpoint for local development.
pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "http://127.0.0.1:5000";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Resolves the analysis endpoint from `FAKELENS_ANALYSIS_ENDPOINT`.
///
/// Unset or blank falls back to [`DEFAULT_ANALYSIS_ENDPOINT`].
pub fn analysis_endpoint_from_env() -> String {
    match std::env::var("FAKELENS_ANALYSIS_ENDPOINT") {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_ANALYSIS_ENDPOINT.to_string(),
    }
}

/// Checks the generative-insights kill-switch env var.
///
/// Semantics:
/// - Unset => insights enabled.
/// - `0`, `false`, `off` (case-insensitive) => insights disabled.
/// - Any other value => insights enabled.
pub fn insights_enabled_from_env() -> bool {
    match std::env::var("FAKELENS_INSIGHTS_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Today's date in `YYYY-MM-DD` form, used to stamp exported artifacts.
pub fn current_iso_date() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}",
        now.year(),
        now.month() as u8,
        now.day()
    )
}

/// Fully scored result of the client-side (image) pathway.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    /// Analyzed file name.
    pub source_file: String,
    /// The four normalized metrics, in dispatch-table order.
    pub metrics: [NormalizedMetric; METRIC_COUNT],
    /// Composite score and verdict, computed after normalization.
    pub composite: CompositeScore,
    /// The four insights, generated after the composite exists.
    pub insights: InsightSet,
}

/// Outcome of one complete analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Client-side scored result (image pathway).
    Scored(ScoredResult),
    /// Remote pre-aggregated report (video pathway); the normalize and
    /// aggregate stages are skipped by construction.
    PreAggregated {
        /// Analyzed file name, carried so exports can cite it.
        source_file: String,
        /// The report as returned by the remote side.
        report: Box<VideoAnalysisReport>,
    },
    /// No analysis pathway exists for the modality.
    Unavailable,
}

/// Runs one artifact through the full analysis pipeline.
///
/// Stage ordering is fixed by construction: the composite is computed only
/// from normalized metrics, and insights are generated only after the
/// composite exists. `insight_model` is consulted only when the kill-switch
/// allows it; the deterministic fallback covers every other case.
///
/// # Errors
/// Returns [`AppError`] when dispatch or any scoring stage fails.
pub fn run_analysis(
    dispatcher: &mut AnalysisDispatcher,
    artifact: &MediaArtifact,
    insight_model: Option<&dyn InsightModel>,
) -> Result<PipelineOutcome, AppError> {
    let pending = dispatcher.start(artifact).map_err(AppError::Dispatch)?;
    let outcome = dispatcher
        .resolve(pending, artifact)
        .map_err(AppError::Dispatch)?;

    match outcome {
        AnalysisOutcome::Metrics(raw) => {
            let metrics = normalize(&raw);
            let composite = aggregate(&metrics).map_err(AppError::Metrics)?;

            let model = if insights_enabled_from_env() {
                insight_model
            } else {
                None
            };
            let insights =
                generate_insights(model, &metrics, &composite).map_err(AppError::Insights)?;

            Ok(PipelineOutcome::Scored(ScoredResult {
                source_file: artifact.file_name.clone(),
                metrics,
                composite,
                insights,
            }))
        }
        AnalysisOutcome::PreAggregated(report) => Ok(PipelineOutcome::PreAggregated {
            source_file: artifact.file_name.clone(),
            report,
        }),
        AnalysisOutcome::Unavailable => Ok(PipelineOutcome::Unavailable),
    }
}

/// Runs [`run_analysis`] while recording stage progress in the run log.
///
/// Log lines carry the artifact fingerprint, stage names, and an outcome
/// summary, never media bytes.
///
/// # Errors
/// Propagates the underlying [`run_analysis`] error after logging it.
pub fn run_analysis_logged(
    dispatcher: &mut AnalysisDispatcher,
    artifact: &MediaArtifact,
    insight_model: Option<&dyn InsightModel>,
    logger: &RunLogger,
) -> Result<PipelineOutcome, AppError> {
    logger.info("dispatch", "start", &artifact.fingerprint());

    match run_analysis(dispatcher, artifact, insight_model) {
        Ok(outcome) => {
            let detail = match &outcome {
                PipelineOutcome::Scored(scored) => {
                    format!("scored composite={}", scored.composite.score)
                }
                PipelineOutcome::PreAggregated { report, .. } => {
                    format!("pre-aggregated risk={}", report.risk_level)
                }
                PipelineOutcome::Unavailable => "no analysis pathway".to_string(),
            };
            logger.info("pipeline", "complete", &detail);
            Ok(outcome)
        }
        Err(error) => {
            logger.error("pipeline", "failed", &error.to_string());
            Err(error)
        }
    }
}

/// Exports a pipeline outcome as a downloadable report.
///
/// Returns `Ok(None)` for [`PipelineOutcome::Unavailable`]; there is nothing
/// to export and nothing is fabricated.
///
/// # Errors
/// Returns [`AppError::Export`] when rendering fails.
pub fn export_outcome(
    outcome: &PipelineOutcome,
    iso_date: &str,
) -> Result<Option<ReportDocument>, AppError> {
    match outcome {
        PipelineOutcome::Scored(scored) => {
            let document = export_composite(
                &scored.source_file,
                &scored.composite,
                &scored.metrics,
                &scored.insights.insights,
                iso_date,
            )
            .map_err(AppError::Export)?;
            Ok(Some(document))
        }
        PipelineOutcome::PreAggregated { source_file, report } => {
            let document =
                export_video_report(source_file, report, iso_date).map_err(AppError::Export)?;
            Ok(Some(document))
        }
        PipelineOutcome::Unavailable => Ok(None),
    }
}

/// Consolidated runtime status snapshot for simple UI projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// Lane phase as human-readable string.
    pub phase: String,
    /// `true` while an analysis request is outstanding.
    pub analyzing: bool,
    /// Whether generative insights are currently enabled.
    pub insights_enabled: bool,
    /// Selected file name or `none`.
    pub file: String,
    /// Last failure message or `ok`.
    pub status: String,
}

/// Projects lane state into a flat status snapshot.
pub fn project_runtime_status(lane: &AnalysisLane) -> RuntimeStatus {
    RuntimeStatus {
        phase: format!("{:?}", lane.phase()),
        analyzing: lane.phase() == LanePhase::Analyzing,
        insights_enabled: insights_enabled_from_env(),
        file: lane.file_name().unwrap_or("none").to_string(),
        status: lane.error().unwrap_or("ok").to_string(),
    }
}

/// Per-run file logger writing `<stamp>_log.txt` into a chosen directory.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates the run log file inside `dir`.
    ///
    /// # Errors
    /// Returns [`AppError::Logging`] when the file cannot be created.
    pub fn new(dir: &Path) -> Result<Self, AppError> {
        let timestamp = timestamp_compact_utc();
        let path = dir.join(format!("{timestamp}_log.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                AppError::Logging(format!(
                    "unable to create log file '{}': {error}",
                    path.display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the run log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logs one INFO line.
    pub fn info(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("INFO", stage, action, detail);
    }

    /// Logs one ERROR line and flushes.
    pub fn error(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("ERROR", stage, action, detail);
    }

    fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let timestamp = timestamp_compact_utc();
        let line = format!("{timestamp} | {level} | {stage} | {action} | {detail}\n");

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            if level == "ERROR" {
                let _ = file.flush();
            }
        }
    }
}

fn timestamp_compact_utc() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Capture subsystem error.
    #[error("capture error: {0}")]
    Capture(#[from] fakelens_capture::CaptureError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] fakelens_core::CoreError),
    /// Dispatch subsystem error.
    #[error("dispatch error: {0}")]
    Dispatch(DispatchError),
    /// Metric pipeline error.
    #[error("metrics error: {0}")]
    Metrics(fakelens_metrics::MetricsError),
    /// Insight generation error.
    #[error("insights error: {0}")]
    Insights(fakelens_insights::InsightError),
    /// Report export error.
    #[error("export error: {0}")]
    Export(fakelens_report::ExportError),
    /// View state error.
    #[error("ui error: {0}")]
    Ui(#[from] fakelens_ui::UiError),
    /// Run logger setup failure.
    #[error("logging error: {0}")]
    Logging(String),
}
