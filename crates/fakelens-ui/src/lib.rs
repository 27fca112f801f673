#![warn(missing_docs)]
//! # fakelens-ui
//!
//! ## Purpose
//! Host-agnostic view state for the analysis dashboard: preview handle
//! lifecycle and the per-upload lane state machine.
//!
//! ## Responsibilities
//! - Keep exactly one live preview handle per store; replacing or clearing a
//!   preview releases the previous handle before minting the next.
//! - Consolidate the drag/file/analyzing/result flags into one lane phase so
//!   contradictory states (analyzing with no file, results while analyzing)
//!   cannot be represented.
//! - Carry the final presentation for all three modal outcomes.
//!
//! ## Data flow
//! File drop -> [`AnalysisLane::accept_file`] -> [`AnalysisLane::begin_analysis`]
//! -> dispatcher outcome -> [`AnalysisLane::present`] or
//! [`AnalysisLane::fail`].
//!
//! ## Ownership and lifetimes
//! The store owns its [`HandleBroker`]; handles are opaque tokens whose
//! backing resources the broker controls.
//!
//! ## Error model
//! Illegal phase transitions return [`UiError::InvalidTransition`] and leave
//! state untouched.
//!
//! ## Security and privacy notes
//! View state stores file names and scores, never media bytes.

use fakelens_analysis_contract::VideoAnalysisReport;
use fakelens_core::MediaArtifact;
use fakelens_insights::Insight;
use fakelens_metrics::{CompositeScore, NormalizedMetric};
use thiserror::Error;

/// Opaque token for one minted preview resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle(pub String);

/// Mints and releases preview resources (object URLs in a browser host).
pub trait HandleBroker {
    /// Mints one handle for the artifact.
    fn mint(&mut self, artifact: &MediaArtifact) -> PreviewHandle;
    /// Releases a previously minted handle. Releasing twice is a broker bug,
    /// not a store bug; the store never double-releases.
    fn release(&mut self, handle: &PreviewHandle);
}

/// In-memory broker tracking live handles, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryHandleBroker {
    next_id: u64,
    live: Vec<PreviewHandle>,
}

impl MemoryHandleBroker {
    /// Creates an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles minted and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl HandleBroker for MemoryHandleBroker {
    fn mint(&mut self, artifact: &MediaArtifact) -> PreviewHandle {
        self.next_id += 1;
        let handle = PreviewHandle(format!("preview:{}:{}", self.next_id, artifact.file_name));
        self.live.push(handle.clone());
        handle
    }

    fn release(&mut self, handle: &PreviewHandle) {
        self.live.retain(|live| live != handle);
    }
}

/// Preview slot holding at most one live handle.
pub struct PreviewStore {
    broker: Box<dyn HandleBroker>,
    current: Option<PreviewHandle>,
}

impl PreviewStore {
    /// Creates an empty store around a broker.
    pub fn new(broker: Box<dyn HandleBroker>) -> Self {
        Self {
            broker,
            current: None,
        }
    }

    /// Currently live handle, if any.
    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    /// Replaces the preview, releasing the previous handle first.
    pub fn set_preview(&mut self, artifact: &MediaArtifact) -> &PreviewHandle {
        self.clear();
        let handle = self.broker.mint(artifact);
        self.current.insert(handle)
    }

    /// Releases the current handle, if any.
    pub fn clear(&mut self) {
        if let Some(handle) = self.current.take() {
            self.broker.release(&handle);
        }
    }
}

impl Drop for PreviewStore {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Final presentation for one completed analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPresentation {
    /// Client-side scored result (image pathway).
    Scored {
        /// Composite score and verdict.
        composite: CompositeScore,
        /// The four normalized metrics.
        metrics: Vec<NormalizedMetric>,
        /// The four insights.
        insights: Vec<Insight>,
    },
    /// Remote pre-aggregated report (video pathway).
    PreAggregated(Box<VideoAnalysisReport>),
    /// No analysis pathway exists for the modality; rendered as
    /// "no analysis available", never as zeroed scores.
    Unavailable,
}

/// Lane phase; the single source of truth replacing the legacy flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePhase {
    /// No file selected.
    Empty,
    /// A file is selected and previewable.
    HoldingFile,
    /// An analysis request is outstanding.
    Analyzing,
    /// Results are on screen.
    Presenting,
    /// The last analysis failed; the file is still selected.
    Failed,
}

/// One upload-and-analyze lane of the dashboard.
pub struct AnalysisLane {
    phase: LanePhase,
    drag_active: bool,
    file_name: Option<String>,
    presentation: Option<ResultPresentation>,
    error: Option<String>,
}

impl AnalysisLane {
    /// Creates an empty lane.
    pub fn new() -> Self {
        Self {
            phase: LanePhase::Empty,
            drag_active: false,
            file_name: None,
            presentation: None,
            error: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> LanePhase {
        self.phase
    }

    /// `true` while a drag hovers the lane.
    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    /// Selected file name, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Presentation for the completed analysis, if any.
    pub fn presentation(&self) -> Option<&ResultPresentation> {
        self.presentation.as_ref()
    }

    /// Message for the last failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` exactly while the phase is [`LanePhase::Analyzing`].
    pub fn is_analyzing(&self) -> bool {
        self.phase == LanePhase::Analyzing
    }

    /// Marks a drag hovering the lane. Ignored while analyzing.
    pub fn drag_enter(&mut self) {
        if self.phase != LanePhase::Analyzing {
            self.drag_active = true;
        }
    }

    /// Marks the drag leaving the lane.
    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Accepts a dropped or picked file, discarding any prior result.
    ///
    /// # Errors
    /// Returns [`UiError::InvalidTransition`] while an analysis is
    /// outstanding.
    pub fn accept_file(&mut self, file_name: &str) -> Result<(), UiError> {
        if self.phase == LanePhase::Analyzing {
            return Err(UiError::InvalidTransition {
                phase: self.phase,
                action: "accept_file",
            });
        }

        self.drag_active = false;
        self.file_name = Some(file_name.to_string());
        self.presentation = None;
        self.error = None;
        self.phase = LanePhase::HoldingFile;
        Ok(())
    }

    /// Moves the lane into the analyzing phase.
    ///
    /// # Errors
    /// Returns [`UiError::InvalidTransition`] unless a file is held or the
    /// previous attempt failed.
    pub fn begin_analysis(&mut self) -> Result<(), UiError> {
        match self.phase {
            LanePhase::HoldingFile | LanePhase::Failed | LanePhase::Presenting => {
                self.presentation = None;
                self.error = None;
                self.phase = LanePhase::Analyzing;
                Ok(())
            }
            phase => Err(UiError::InvalidTransition {
                phase,
                action: "begin_analysis",
            }),
        }
    }

    /// Presents a completed analysis.
    ///
    /// # Errors
    /// Returns [`UiError::InvalidTransition`] unless the lane is analyzing.
    pub fn present(&mut self, presentation: ResultPresentation) -> Result<(), UiError> {
        if self.phase != LanePhase::Analyzing {
            return Err(UiError::InvalidTransition {
                phase: self.phase,
                action: "present",
            });
        }

        self.presentation = Some(presentation);
        self.phase = LanePhase::Presenting;
        Ok(())
    }

    /// Records a failed analysis, keeping the file for a retry.
    ///
    /// # Errors
    /// Returns [`UiError::InvalidTransition`] unless the lane is analyzing.
    pub fn fail(&mut self, message: &str) -> Result<(), UiError> {
        if self.phase != LanePhase::Analyzing {
            return Err(UiError::InvalidTransition {
                phase: self.phase,
                action: "fail",
            });
        }

        self.error = Some(message.to_string());
        self.phase = LanePhase::Failed;
        Ok(())
    }

    /// Returns the lane to its empty state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for AnalysisLane {
    fn default() -> Self {
        Self::new()
    }
}

/// View state error type.
#[derive(Debug, Error)]
pub enum UiError {
    /// The action is not legal in the current phase.
    #[error("{action} is not valid in the {phase:?} phase")]
    InvalidTransition {
        /// Phase at the time of the action.
        phase: LanePhase,
        /// Rejected action name.
        action: &'static str,
    },
}

#[cfg(test)]
mod tests {
    //! Unit tests for handle lifecycle and lane phase legality.

    use super::*;

    fn artifact(name: &str) -> MediaArtifact {
        MediaArtifact::new(name, "image/png", vec![1, 2, 3]).expect("artifact")
    }

    #[test]
    fn replacing_a_preview_releases_the_previous_handle() {
        let mut store = PreviewStore::new(Box::new(MemoryHandleBroker::new()));

        let first = store.set_preview(&artifact("a.png")).clone();
        let second = store.set_preview(&artifact("b.png")).clone();
        assert_ne!(first, second);
        assert_eq!(store.current(), Some(&second));

        store.clear();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn store_drop_releases_the_live_handle() {
        // Shared broker so the test can observe releases after the drop.
        struct CountingBroker {
            inner: MemoryHandleBroker,
            releases: std::rc::Rc<std::cell::Cell<usize>>,
        }

        impl HandleBroker for CountingBroker {
            fn mint(&mut self, artifact: &MediaArtifact) -> PreviewHandle {
                self.inner.mint(artifact)
            }

            fn release(&mut self, handle: &PreviewHandle) {
                self.releases.set(self.releases.get() + 1);
                self.inner.release(handle);
            }
        }

        let releases = std::rc::Rc::new(std::cell::Cell::new(0));
        {
            let mut store = PreviewStore::new(Box::new(CountingBroker {
                inner: MemoryHandleBroker::new(),
                releases: releases.clone(),
            }));
            store.set_preview(&artifact("a.png"));
        }

        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn lane_rejects_analysis_without_a_file() {
        let mut lane = AnalysisLane::new();
        assert!(lane.begin_analysis().is_err());
        assert_eq!(lane.phase(), LanePhase::Empty);
    }

    #[test]
    fn accepting_a_file_clears_the_drag_flag_and_prior_result() {
        let mut lane = AnalysisLane::new();
        lane.drag_enter();
        lane.accept_file("photo.png").expect("accept");
        assert!(!lane.drag_active());
        assert_eq!(lane.phase(), LanePhase::HoldingFile);

        lane.begin_analysis().expect("begin");
        lane.present(ResultPresentation::Unavailable).expect("present");

        lane.accept_file("other.png").expect("accept");
        assert!(lane.presentation().is_none());
        assert_eq!(lane.phase(), LanePhase::HoldingFile);
    }

    #[test]
    fn failure_keeps_the_file_and_allows_a_retry() {
        let mut lane = AnalysisLane::new();
        lane.accept_file("clip.mp4").expect("accept");
        lane.begin_analysis().expect("begin");
        lane.fail("could not reach the analysis service").expect("fail");

        assert_eq!(lane.phase(), LanePhase::Failed);
        assert_eq!(lane.file_name(), Some("clip.mp4"));
        assert!(lane.begin_analysis().is_ok());
    }

    #[test]
    fn file_drops_are_ignored_while_analyzing() {
        let mut lane = AnalysisLane::new();
        lane.accept_file("photo.png").expect("accept");
        lane.begin_analysis().expect("begin");

        assert!(lane.accept_file("other.png").is_err());
        lane.drag_enter();
        assert!(!lane.drag_active());
        assert_eq!(lane.file_name(), Some("photo.png"));
    }
}
