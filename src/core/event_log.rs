//! Append-only transcript of stage communications

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

/// A single communication entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationEvent {
    /// Wall-clock time, truncated to whole seconds
    pub timestamp: DateTime<Local>,

    /// Name of the stage that spoke
    pub source: String,

    /// Free-text message
    pub message: String,

    /// Stage the message is addressed to, if any
    pub recipient: Option<String>,

    /// True for completion/handover messages, false for status messages
    pub is_handover: bool,
}

impl CommunicationEvent {
    /// In-progress status announcement
    pub fn status(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_seconds(),
            source: source.into(),
            message: message.into(),
            recipient: None,
            is_handover: false,
        }
    }

    /// Completion announcement addressed to the next stage (or nobody)
    pub fn handover(
        source: impl Into<String>,
        message: impl Into<String>,
        recipient: Option<String>,
    ) -> Self {
        Self {
            timestamp: now_seconds(),
            source: source.into(),
            message: message.into(),
            recipient,
            is_handover: true,
        }
    }

    /// Timestamp as shown in the transcript
    pub fn clock(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

fn now_seconds() -> DateTime<Local> {
    let now = Local::now();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Ordered record of communication events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<CommunicationEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: CommunicationEvent) {
        self.events.push(event);
    }

    pub fn all(&self) -> &[CommunicationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&CommunicationEvent> {
        self.events.last()
    }

    pub fn handovers(&self) -> impl Iterator<Item = &CommunicationEvent> {
        self.events.iter().filter(|e| e.is_handover)
    }

    /// (source, is_handover) pairs, independent of message content and time
    pub fn shape(&self) -> Vec<(String, bool)> {
        self.events
            .iter()
            .map(|e| (e.source.clone(), e.is_handover))
            .collect()
    }
}
