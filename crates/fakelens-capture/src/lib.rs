#![warn(missing_docs)]
//! # fakelens-capture
//!
//! ## Purpose
//! Implements the screen-recording session state machine that runs inside an
//! isolated content context.
//!
//! ## Responsibilities
//! - Drive the `Idle → CountdownPending → Recording → Stopping → Saved`
//!   lifecycle with cooperative ticks.
//! - Acquire a video-only display stream through an injectable source.
//! - Buffer recorder chunks and concatenate them into one media artifact.
//! - Guarantee every media track is released exactly once on every exit path.
//!
//! ## Data flow
//! Popup command -> [`CaptureController::request_capture`] -> countdown ticks
//! -> display stream grant -> chunk buffering -> stop or ceiling expiry ->
//! [`fakelens_core::MediaArtifact`] handed to the preview store or download
//! queue.
//!
//! ## Ownership and lifetimes
//! The active [`RecordingSession`] exclusively owns the capture stream and
//! its tracks; at most one session exists per controller.
//!
//! ## Error model
//! Permission denial and recorder failures are terminal for the current
//! session only and surface as [`CaptureError`]; stop requests in the wrong
//! state are no-ops and never propagate.
//!
//! ## Security and privacy notes
//! Recorded bytes stay in memory until handed off; this crate never writes
//! or logs chunk contents.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use fakelens_core::{MediaArtifact, stamped_file_name};
use thiserror::Error;

/// Ticks counted down before the display stream is requested.
pub const START_COUNTDOWN_TICKS: u8 = 3;

/// Recording ceiling; the session auto-stops when this many ticks elapse.
pub const RECORDING_CEILING_TICKS: u8 = 15;

/// MIME type of saved recordings.
pub const RECORDING_MIME: &str = "video/webm";

/// One media track obtained from a granted display stream.
#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    released: bool,
    release_tally: Arc<AtomicU32>,
}

impl MediaTrack {
    /// Creates a track that reports releases into a shared tally.
    pub fn new(id: impl Into<String>, release_tally: Arc<AtomicU32>) -> Self {
        Self {
            id: id.into(),
            released: false,
            release_tally,
        }
    }

    /// Releases the track. Repeated calls are no-ops; the tally records each
    /// track at most once.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.release_tally.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Returns the track identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` once the track has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

/// A granted display-media stream (video only).
#[derive(Debug)]
pub struct DisplayStream {
    tracks: Vec<MediaTrack>,
}

impl DisplayStream {
    /// Wraps granted tracks into a stream.
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    /// Releases every track, returning how many were newly released.
    pub fn release_tracks(&mut self) -> usize {
        let mut newly_released = 0;
        for track in &mut self.tracks {
            if !track.is_released() {
                track.release();
                newly_released += 1;
            }
        }
        newly_released
    }

    /// Returns the number of tracks in the stream.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Trait implemented by concrete display-media providers.
pub trait DisplayMediaSource {
    /// Requests a video-only capture stream from the user agent.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`] when the user refuses the
    /// capture prompt and [`CaptureError::Recorder`] for backend failures.
    fn request_stream(&mut self) -> Result<DisplayStream, CaptureError>;

    /// Polls the recorder for the next buffered chunk, if any.
    ///
    /// # Errors
    /// Returns [`CaptureError::Recorder`] when the recorder failed mid-flight.
    fn poll_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;
}

/// Capture lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No session exists.
    Idle,
    /// Pre-capture countdown is running.
    CountdownPending,
    /// Chunks are being buffered from the live stream.
    Recording,
    /// Stop was requested; the recorder stop event finalizes the artifact.
    Stopping,
    /// Artifact is ready for hand-off.
    Saved,
    /// Session failed; awaiting user acknowledgment.
    Error,
}

/// Observable outcome of one cooperative tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTick {
    /// Nothing to do in the current state.
    Noop,
    /// Countdown is still running with this many ticks remaining.
    CountdownRemaining(u8),
    /// Stream was granted and recording began.
    RecordingStarted,
    /// One tick of recording elapsed; ceiling ticks remaining.
    RecordingRemaining(u8),
    /// Recording finalized into an artifact.
    Saved,
    /// Session failed with a user-visible message.
    Failed(String),
}

/// Capture configuration for one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Ticks before the stream request fires.
    pub countdown_ticks: u8,
    /// Recording ceiling in ticks.
    pub max_recording_ticks: u8,
    /// ISO date used to stamp saved recording file names.
    pub date_stamp: String,
}

impl CaptureConfig {
    /// Creates a validated configuration with the standard countdowns.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidConfig`] when the date stamp is blank.
    pub fn new(date_stamp: impl Into<String>) -> Result<Self, CaptureError> {
        let date_stamp = date_stamp.into();
        if date_stamp.trim().is_empty() {
            return Err(CaptureError::InvalidConfig(
                "date stamp must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            countdown_ticks: START_COUNTDOWN_TICKS,
            max_recording_ticks: RECORDING_CEILING_TICKS,
            date_stamp,
        })
    }
}

/// One live recording session; exclusively owns the capture stream.
#[derive(Debug)]
pub struct RecordingSession {
    stream: DisplayStream,
    chunks: Vec<Vec<u8>>,
    countdown_remaining: u8,
    started_at_tick: u64,
}

impl RecordingSession {
    /// Returns the tick at which recording started.
    pub fn started_at_tick(&self) -> u64 {
        self.started_at_tick
    }

    /// Returns how many chunks have been buffered so far.
    pub fn buffered_chunks(&self) -> usize {
        self.chunks.len()
    }
}

/// Screen-recording state machine for one content context.
pub struct CaptureController {
    source: Box<dyn DisplayMediaSource>,
    config: CaptureConfig,
    state: CaptureState,
    countdown_remaining: u8,
    session: Option<RecordingSession>,
    saved: Option<MediaArtifact>,
    error_message: Option<String>,
    tick: u64,
}

impl CaptureController {
    /// Creates an idle controller bound to a display-media source.
    pub fn new(source: Box<dyn DisplayMediaSource>, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            state: CaptureState::Idle,
            countdown_remaining: 0,
            session: None,
            saved: None,
            error_message: None,
            tick: 0,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Returns the pending user-visible error, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Begins a capture session from `Idle`.
    ///
    /// # Errors
    /// Returns [`CaptureError::SessionActive`] when a session already exists
    /// or a saved artifact has not been taken yet.
    pub fn request_capture(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::SessionActive);
        }

        self.state = CaptureState::CountdownPending;
        self.countdown_remaining = self.config.countdown_ticks;
        Ok(())
    }

    /// Requests a stop. Outside `Recording` this is a no-op: it never errors
    /// and never creates a second session.
    pub fn request_stop(&mut self) {
        if self.state == CaptureState::Recording {
            self.state = CaptureState::Stopping;
        }
    }

    /// Acknowledges a surfaced error and returns the controller to `Idle`.
    /// No-op in every other state.
    pub fn acknowledge_error(&mut self) {
        if self.state == CaptureState::Error {
            self.state = CaptureState::Idle;
            self.error_message = None;
        }
    }

    /// Takes the saved artifact, resetting the controller to `Idle`.
    pub fn take_recording(&mut self) -> Option<MediaArtifact> {
        let artifact = self.saved.take();
        if artifact.is_some() {
            self.state = CaptureState::Idle;
        }
        artifact
    }

    /// Advances the cooperative state machine by one tick.
    pub fn on_tick(&mut self) -> CaptureTick {
        self.tick += 1;

        match self.state {
            CaptureState::Idle | CaptureState::Saved | CaptureState::Error => CaptureTick::Noop,
            CaptureState::CountdownPending => self.tick_countdown(),
            CaptureState::Recording => self.tick_recording(),
            CaptureState::Stopping => self.finalize_session(),
        }
    }

    fn tick_countdown(&mut self) -> CaptureTick {
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining > 0 {
            return CaptureTick::CountdownRemaining(self.countdown_remaining);
        }

        match self.source.request_stream() {
            Ok(stream) => {
                self.session = Some(RecordingSession {
                    stream,
                    chunks: Vec::new(),
                    countdown_remaining: self.config.max_recording_ticks,
                    started_at_tick: self.tick,
                });
                self.state = CaptureState::Recording;
                CaptureTick::RecordingStarted
            }
            Err(error) => self.fail_session(error.to_string()),
        }
    }

    fn tick_recording(&mut self) -> CaptureTick {
        let chunk = match self.source.poll_chunk() {
            Ok(chunk) => chunk,
            Err(error) => return self.fail_session(error.to_string()),
        };

        let Some(session) = self.session.as_mut() else {
            return self.fail_session("recording state without a live session".to_string());
        };

        if let Some(chunk) = chunk
            && !chunk.is_empty()
        {
            session.chunks.push(chunk);
        }

        session.countdown_remaining = session.countdown_remaining.saturating_sub(1);
        if session.countdown_remaining == 0 {
            // Ceiling expiry stops the recording without a user action.
            self.state = CaptureState::Stopping;
            return self.finalize_session();
        }

        CaptureTick::RecordingRemaining(session.countdown_remaining)
    }

    /// Finalizes the session: concatenates chunks, releases every track, and
    /// transitions to `Saved` (or `Error` when no data was produced).
    fn finalize_session(&mut self) -> CaptureTick {
        let Some(mut session) = self.session.take() else {
            self.state = CaptureState::Idle;
            return CaptureTick::Noop;
        };

        session.stream.release_tracks();

        let total_len = session.chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total_len);
        for chunk in session.chunks {
            bytes.extend_from_slice(&chunk);
        }

        let file_name =
            match stamped_file_name("screen_recording", &self.config.date_stamp, "webm") {
                Ok(file_name) => file_name,
                Err(error) => return self.fail_session(error.to_string()),
            };

        match MediaArtifact::new(file_name, RECORDING_MIME, bytes) {
            Ok(artifact) => {
                self.saved = Some(artifact);
                self.state = CaptureState::Saved;
                CaptureTick::Saved
            }
            Err(_) => self.fail_session("recording produced no data".to_string()),
        }
    }

    fn fail_session(&mut self, message: String) -> CaptureTick {
        if let Some(mut session) = self.session.take() {
            session.stream.release_tracks();
        }

        self.state = CaptureState::Error;
        self.error_message = Some(message.clone());
        CaptureTick::Failed(message)
    }
}

/// Deterministic synthetic display-media source for tests and CI.
#[derive(Debug)]
pub struct SyntheticDisplaySource {
    deny_permission: bool,
    track_count: usize,
    next_chunk: u8,
    release_tally: Arc<AtomicU32>,
}

impl SyntheticDisplaySource {
    /// Creates a granting source with one video track.
    pub fn new() -> Self {
        Self {
            deny_permission: false,
            track_count: 1,
            next_chunk: 0,
            release_tally: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Creates a source that refuses the capture prompt.
    pub fn denying() -> Self {
        Self {
            deny_permission: true,
            ..Self::new()
        }
    }

    /// Overrides how many tracks a granted stream carries.
    pub fn with_track_count(mut self, track_count: usize) -> Self {
        self.track_count = track_count;
        self
    }

    /// Shared tally of track releases, observable after the controller has
    /// consumed the stream.
    pub fn release_tally(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.release_tally)
    }
}

impl Default for SyntheticDisplaySource {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayMediaSource for SyntheticDisplaySource {
    fn request_stream(&mut self) -> Result<DisplayStream, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::PermissionDenied);
        }

        let tracks = (0..self.track_count)
            .map(|index| {
                MediaTrack::new(format!("video-{index}"), Arc::clone(&self.release_tally))
            })
            .collect();
        Ok(DisplayStream::new(tracks))
    }

    fn poll_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        self.next_chunk = self.next_chunk.wrapping_add(1);
        Ok(Some(vec![self.next_chunk; 4]))
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// User refused the display-media prompt.
    #[error("screen capture permission was denied")]
    PermissionDenied,
    /// Recorder or stream backend failure.
    #[error("capture recorder failure: {0}")]
    Recorder(String),
    /// A session is already active or awaiting hand-off.
    #[error("a capture session is already active")]
    SessionActive,
    /// Configuration is invalid.
    #[error("invalid capture configuration: {0}")]
    InvalidConfig(String),
}
