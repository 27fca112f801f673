#![warn(missing_docs)]
//! # fakelens-bus
//!
//! ## Purpose
//! Relays capture and download commands between three isolated extension
//! execution contexts that share no memory: the popup trigger surface, the
//! background relay, and per-tab content scripts.
//!
//! ## Responsibilities
//! - Define the tagged command schema (`startRecording`, `stopRecording`,
//!   `download`).
//! - Provide per-context FIFO channels with at-most-once delivery.
//! - Route commands through the background relay, including persistent saves
//!   outside the page sandbox.
//!
//! ## Data flow
//! Popup -> [`MessageBus::send`] -> background channel ->
//! [`BackgroundRelay::handle`] -> content channel or [`DownloadSink`].
//!
//! ## Ownership and lifetimes
//! Commands are owned values; queued messages own their payload references so
//! a vanished sender context leaves the queue intact.
//!
//! ## Error model
//! Sending to a missing context fails silently from the sender's perspective
//! (the drop is only counted); codec and sink failures surface as
//! [`BusError`]. No retries are performed.
//!
//! ## Security and privacy notes
//! Download payload references pass through opaquely and are never logged by
//! this crate.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle identifying one target tab/content context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabHandle(pub u32);

/// Binary payload reference plus destination name for persistent saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadData {
    /// Data reference (data URL or equivalent opaque reference).
    pub url: String,
    /// Destination file name outside the page sandbox.
    pub filename: String,
}

/// Cross-context command with an `action` discriminator.
///
/// The serialized shape matches the extension wire schema:
/// `{ "action": "...", "tabId": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Inject capture handling into the target content context.
    #[serde(rename_all = "camelCase")]
    StartRecording {
        /// Target tab.
        tab_id: TabHandle,
    },
    /// Forwarded verbatim to the target content context.
    #[serde(rename_all = "camelCase")]
    StopRecording {
        /// Target tab.
        tab_id: TabHandle,
    },
    /// Persist a recording outside the page sandbox.
    Download {
        /// Payload reference and destination name.
        data: DownloadData,
    },
}

impl Command {
    /// Serializes the command to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`BusError::Codec`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, BusError> {
        serde_json::to_vec(self).map_err(BusError::Codec)
    }

    /// Deserializes a command from JSON bytes.
    ///
    /// # Errors
    /// Returns [`BusError::Codec`] when decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, BusError> {
        serde_json::from_slice(raw).map_err(BusError::Codec)
    }
}

/// One isolated execution context addressable on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextId {
    /// Popup trigger surface.
    Popup,
    /// Background relay.
    Background,
    /// Content script injected into one tab.
    Content(TabHandle),
}

/// In-order, at-most-once command channels between isolated contexts.
///
/// Ordering is guaranteed per channel only; nothing orders messages across
/// channels.
#[derive(Debug, Default)]
pub struct MessageBus {
    channels: HashMap<ContextId, VecDeque<Command>>,
    dropped: u64,
}

impl MessageBus {
    /// Creates a bus with no attached contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a context, creating its delivery channel.
    pub fn attach(&mut self, context: ContextId) {
        self.channels.entry(context).or_default();
    }

    /// Detaches a context; queued commands for it are discarded.
    pub fn detach(&mut self, context: ContextId) {
        self.channels.remove(&context);
    }

    /// Returns `true` when the context has a live channel.
    pub fn is_attached(&self, context: ContextId) -> bool {
        self.channels.contains_key(&context)
    }

    /// Sends a command to one context.
    ///
    /// When the target context is gone the command is dropped silently; the
    /// sender observes no failure and no retry happens.
    pub fn send(&mut self, to: ContextId, command: Command) {
        match self.channels.get_mut(&to) {
            Some(queue) => queue.push_back(command),
            None => self.dropped += 1,
        }
    }

    /// Receives the next command for a context in send order, consuming it.
    pub fn recv(&mut self, context: ContextId) -> Option<Command> {
        self.channels.get_mut(&context)?.pop_front()
    }

    /// Number of commands dropped due to missing target contexts.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

/// Persistent save target outside the page sandbox.
pub trait DownloadSink {
    /// Saves one payload reference under the given file name.
    ///
    /// # Errors
    /// Returns [`BusError::Sink`] when the save fails.
    fn save(&mut self, filename: &str, data_url: &str) -> Result<(), BusError>;
}

/// In-memory download sink for tests.
#[derive(Debug, Default)]
pub struct MemoryDownloadSink {
    saved: Vec<(String, String)>,
}

impl MemoryDownloadSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(filename, data_url)` pairs in save order.
    pub fn saved(&self) -> &[(String, String)] {
        &self.saved
    }
}

impl DownloadSink for MemoryDownloadSink {
    fn save(&mut self, filename: &str, data_url: &str) -> Result<(), BusError> {
        if filename.trim().is_empty() {
            return Err(BusError::Sink("download filename is empty".to_string()));
        }
        self.saved.push((filename.to_string(), data_url.to_string()));
        Ok(())
    }
}

/// Background relay routing commands between the popup and content contexts.
#[derive(Debug, Default)]
pub struct BackgroundRelay;

impl BackgroundRelay {
    /// Creates the relay.
    pub fn new() -> Self {
        Self
    }

    /// Handles one command received on the background channel.
    ///
    /// `startRecording` injects capture handling into the target context
    /// (attaching its channel) and delivers the command there;
    /// `stopRecording` is forwarded verbatim; `download` triggers one
    /// persistent save through the sink.
    ///
    /// # Errors
    /// Returns [`BusError::Sink`] when a download save fails. Missing target
    /// contexts are not an error.
    pub fn handle(
        &self,
        command: Command,
        bus: &mut MessageBus,
        sink: &mut dyn DownloadSink,
    ) -> Result<(), BusError> {
        match command {
            Command::StartRecording { tab_id } => {
                bus.attach(ContextId::Content(tab_id));
                bus.send(ContextId::Content(tab_id), Command::StartRecording { tab_id });
                Ok(())
            }
            Command::StopRecording { tab_id } => {
                bus.send(ContextId::Content(tab_id), Command::StopRecording { tab_id });
                Ok(())
            }
            Command::Download { data } => sink.save(&data.filename, &data.url),
        }
    }
}

/// Message bus error type.
#[derive(Debug, Error)]
pub enum BusError {
    /// Command encoding/decoding failure.
    #[error("command codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    /// Persistent save failure.
    #[error("download sink failure: {0}")]
    Sink(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for command schema and channel semantics.

    use super::*;

    #[test]
    fn command_schema_uses_action_discriminator() {
        let command = Command::StartRecording {
            tab_id: TabHandle(7),
        };
        let raw = command.to_json_bytes().expect("command should encode");
        let value: serde_json::Value = serde_json::from_slice(&raw).expect("json");
        assert_eq!(value["action"], "startRecording");
        assert_eq!(value["tabId"], 7);
    }

    #[test]
    fn send_to_missing_context_is_silent() {
        let mut bus = MessageBus::new();
        bus.send(
            ContextId::Content(TabHandle(1)),
            Command::StopRecording {
                tab_id: TabHandle(1),
            },
        );
        assert_eq!(bus.dropped_count(), 1);
    }

    #[test]
    fn channel_preserves_send_order() {
        let mut bus = MessageBus::new();
        bus.attach(ContextId::Background);
        for index in 0..3 {
            bus.send(
                ContextId::Background,
                Command::StartRecording {
                    tab_id: TabHandle(index),
                },
            );
        }

        for index in 0..3 {
            let command = bus.recv(ContextId::Background).expect("queued command");
            assert_eq!(
                command,
                Command::StartRecording {
                    tab_id: TabHandle(index),
                }
            );
        }
        assert!(bus.recv(ContextId::Background).is_none());
    }
}
