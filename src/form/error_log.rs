use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLogKind {
    FormError,
    ApiError,
    NetworkError,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ErrorLogKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl ErrorLogEntry {
    pub fn new(kind: ErrorLogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub(crate) fn trace(&self) {
        tracing::warn!(
            kind = ?self.kind,
            context = %serde_json::Value::Object(self.context.clone()),
            "{}",
            self.message
        );
    }
}

pub trait ErrorLog: Send + Sync + 'static {
    fn record(&self, entry: ErrorLogEntry);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopErrorLog;

impl ErrorLog for NoopErrorLog {
    fn record(&self, _entry: ErrorLogEntry) {}
}

#[derive(Clone, Debug)]
pub struct RingBufferErrorLog {
    capacity: usize,
    entries: Arc<RwLock<VecDeque<ErrorLogEntry>>>,
}

impl Default for RingBufferErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl RingBufferErrorLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries())
    }

    pub fn from_json(capacity: usize, json: &str) -> serde_json::Result<Self> {
        let stored = serde_json::from_str::<Vec<ErrorLogEntry>>(json)?;
        let log = Self::new(capacity);
        for entry in stored {
            log.push(entry);
        }
        Ok(log)
    }

    fn push(&self, entry: ErrorLogEntry) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl ErrorLog for RingBufferErrorLog {
    fn record(&self, entry: ErrorLogEntry) {
        self.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_evicted() {
        let log = RingBufferErrorLog::new(3);
        for index in 0..5 {
            log.record(ErrorLogEntry::new(
                ErrorLogKind::FormError,
                format!("entry {index}"),
            ));
        }
        let messages = log
            .entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn zero_capacity_still_keeps_latest_entry() {
        let log = RingBufferErrorLog::new(0);
        log.record(ErrorLogEntry::new(ErrorLogKind::ApiError, "a"));
        log.record(ErrorLogEntry::new(ErrorLogKind::ApiError, "b"));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries()[0].message, "b");
    }

    #[test]
    fn json_uses_original_type_tags_and_survives_restore() {
        let log = RingBufferErrorLog::new(5);
        log.record(
            ErrorLogEntry::new(ErrorLogKind::NetworkError, "connection reset")
                .with_context_value("attempt", 2),
        );
        log.record(ErrorLogEntry::new(ErrorLogKind::FormError, "Form validation failed"));

        let json = log.to_json().expect("serialize log");
        assert!(json.contains(r#""type":"network_error""#));
        assert!(json.contains(r#""type":"form_error""#));

        let restored = RingBufferErrorLog::from_json(1, &json).expect("restore log");
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.entries()[0].message, "Form validation failed");
        assert!(restored.entries()[0].context.is_empty());
    }

    #[test]
    fn clear_empties_the_log() {
        let log = RingBufferErrorLog::default();
        log.record(ErrorLogEntry::new(ErrorLogKind::FormError, "x"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), DEFAULT_ERROR_LOG_CAPACITY);
    }
}
