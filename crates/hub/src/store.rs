//! LogStore — bounded, ordered collection of received events.
//!
//! Ring-buffer semantics over a `VecDeque`: ids are unique and strictly
//! increasing for the lifetime of the store (surviving `clear`), and
//! overflow always evicts the oldest entries first.

use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use wire::{Level, LogEventPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocation {
    pub file: String,
    /// One-based line as captured; zero when the producer omitted it.
    pub line: u32,
    pub column: Option<u32>,
}

/// One stored event. Immutable once created.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub id: u64,
    pub level: Level,
    pub kind: String,
    pub text: String,
    pub values: Vec<Value>,
    pub timestamp: i64,
    pub location: Option<RawLocation>,
    pub stack: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub status: Option<u16>,
    pub duration_ms: Option<f64>,
    pub label: Option<String>,
    pub source: Option<String>,
    /// Originating transport session.
    pub client_id: u64,
}

impl LogEvent {
    fn from_payload(id: u64, payload: LogEventPayload, client_id: u64) -> LogEvent {
        let level = Level::coerce(payload.level.as_deref());
        let kind = payload
            .kind
            .unwrap_or_else(|| level.as_str().to_string());
        let location = payload.file.map(|file| RawLocation {
            file,
            line: payload.line.unwrap_or(0),
            column: payload.column,
        });
        LogEvent {
            id,
            level,
            kind,
            text: payload.text.unwrap_or_default(),
            values: payload.values,
            timestamp: payload
                .timestamp
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            location,
            stack: payload.stack,
            url: payload.url,
            method: payload.method,
            status: payload.status,
            duration_ms: payload.duration_ms,
            label: payload.label,
            source: payload.source,
            client_id,
        }
    }
}

pub struct LogStore {
    entries: VecDeque<Arc<LogEvent>>,
    next_id: u64,
    max_entries: usize,
}

impl LogStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            max_entries,
        }
    }

    /// Validate, assign the next id, append, then trim the oldest
    /// overflow in one pass.
    pub fn ingest(&mut self, payload: LogEventPayload, client_id: u64) -> Arc<LogEvent> {
        let id = self.next_id;
        self.next_id += 1;
        let event = Arc::new(LogEvent::from_payload(id, payload, client_id));
        self.entries.push_back(Arc::clone(&event));
        if self.entries.len() > self.max_entries {
            let overflow = self.entries.len() - self.max_entries;
            self.entries.drain(..overflow);
        }
        event
    }

    /// Reset to empty. The id counter keeps increasing; ids are never
    /// reused.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lookup by id; trimmed or never-assigned ids report not-found.
    pub fn find(&self, id: u64) -> Option<Arc<LogEvent>> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|index| Arc::clone(&self.entries[index]))
    }

    /// Ordered contents, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<LogEvent>> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
