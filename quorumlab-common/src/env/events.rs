//! events.rs
//!
//! Progress events emitted by the protocol drivers.
//!
//! Every operation appends an ordered stream of `{severity, message}` records
//! (vote cast, commit/abort, election result, consistency violation) to an
//! [`EventSink`]. A renderer drains the receiving half at its own pace; the
//! sink itself never blocks. Each record is also mirrored to `tracing` under
//! the `consensus` target.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Success => "OK",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolEvent {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ProtocolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Non-blocking handle the core appends progress events to.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<ProtocolEvent>>,
}

impl EventSink {
    /// Creates a sink together with the receiver a renderer drains.
    pub fn channel() -> (Self, UnboundedReceiver<ProtocolEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only mirrors events to `tracing`.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info | Severity::Success => info!(target: "consensus", "EVENT:{} {}", severity, message),
            Severity::Warning => warn!(target: "consensus", "EVENT:{} {}", severity, message),
            Severity::Error => error!(target: "consensus", "EVENT:{} {}", severity, message),
        }

        if let Some(tx) = &self.tx {
            // A dropped renderer must not fail the operation.
            let _ = tx.send(ProtocolEvent { severity, message });
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Severity::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }
}

/// Drains everything currently buffered in `rx` without waiting.
pub fn drain(rx: &mut UnboundedReceiver<ProtocolEvent>) -> Vec<ProtocolEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.info("propose");
        sink.success("node 1 committed");
        sink.error("quorum not met");

        let events = drain(&mut rx);
        let severities: Vec<_> = events.iter().map(|e| e.severity).collect();
        assert_eq!(severities, vec![Severity::Info, Severity::Success, Severity::Error]);
        assert_eq!(events[1].message, "node 1 committed");
    }

    #[test]
    fn test_emit_survives_dropped_receiver() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.warning("nobody is listening");
    }

    #[test]
    fn test_disabled_sink_is_silent() {
        let sink = EventSink::disabled();
        sink.info("only traced");
    }

    #[test]
    fn test_event_display() {
        let event = ProtocolEvent { severity: Severity::Warning, message: "Node 3 inactive.".into() };
        assert_eq!(event.to_string(), "[WARN] Node 3 inactive.");
    }
}
