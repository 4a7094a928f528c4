//! Event sinks: where committed records go.
//!
//! Sinks are an observation side-channel. They run after a transition has
//! committed, and a failing sink is logged and skipped; it never undoes the
//! transition.

use std::sync::{Arc, Mutex, MutexGuard};

use lending_registry_core::EventRecord;

use crate::error::SinkError;

/// Receiver of committed event records.
pub trait EventSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Accept one record.
    fn publish(&self, record: &EventRecord) -> Result<(), SinkError>;
}

/// In-memory event log.
///
/// Cloning yields another handle onto the same log, so a test can keep one
/// handle while the registry owns the other.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<EventRecord>>, SinkError> {
        self.records.lock().map_err(|e| SinkError {
            sink: "event-log",
            reason: e.to_string(),
        })
    }

    /// Copy of every record received so far, in arrival order.
    pub fn records(&self) -> Result<Vec<EventRecord>, SinkError> {
        Ok(self.lock()?.clone())
    }

    /// The most recent record.
    pub fn last(&self) -> Result<Option<EventRecord>, SinkError> {
        Ok(self.lock()?.last().cloned())
    }

    /// Number of records received.
    pub fn len(&self) -> Result<usize, SinkError> {
        Ok(self.lock()?.len())
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> Result<bool, SinkError> {
        Ok(self.lock()?.is_empty())
    }
}

impl EventSink for EventLog {
    fn name(&self) -> &'static str {
        "event-log"
    }

    fn publish(&self, record: &EventRecord) -> Result<(), SinkError> {
        self.lock()?.push(record.clone());
        Ok(())
    }
}

/// Logs every record through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn publish(&self, record: &EventRecord) -> Result<(), SinkError> {
        tracing::info!(
            seq = record.seq,
            id = %record.id,
            kind = ?record.kind(),
            event = ?record.event,
            "registry event"
        );
        Ok(())
    }
}
