//! Bounded FIFO buffer of recent log records.
//!
//! The buffer is arrival-ordered: records sit in append order, not event
//! time. Readers get owned copies, never references into the deque, so a
//! correlation pass can run against a stable snapshot while appends
//! continue.

use causelog_core::{truncate_chars, LogLevel, LogRecord, MESSAGE_STORE_CAP};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity FIFO of log records. Append evicts the oldest record
/// when full. No interior locking; sharing goes through [`SharedBuffer`].
#[derive(Debug)]
pub struct IngestionBuffer {
    records: VecDeque<LogRecord>,
    capacity: usize,
}

impl IngestionBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one record, evicting the oldest when at capacity.
    /// `message`/`raw` are capped here - storage truncation only, callers
    /// classify on the full line before appending.
    pub fn append(&mut self, mut record: LogRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        record.message = truncate_chars(&record.message, MESSAGE_STORE_CAP);
        record.raw = truncate_chars(&record.raw, MESSAGE_STORE_CAP);
        self.records.push_back(record);
    }

    /// Most recent `n` records, newest last.
    pub fn recent(&self, n: usize) -> Vec<LogRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn by_service(&self, name: &str) -> Vec<LogRecord> {
        self.records
            .iter()
            .filter(|r| r.service == name)
            .cloned()
            .collect()
    }

    pub fn in_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<LogRecord> {
        self.records
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .cloned()
            .collect()
    }

    /// Records at Error level or above.
    pub fn errors_only(&self) -> Vec<LogRecord> {
        self.records
            .iter()
            .filter(|r| r.level >= LogLevel::Error)
            .cloned()
            .collect()
    }

    /// Full copy in arrival order, for correlation passes.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for IngestionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Read-mostly shared handle. The single writer lives inside the
/// ingestion pipeline; everyone else only gets copy-out reads.
#[derive(Debug, Clone)]
pub struct SharedBuffer {
    inner: Arc<RwLock<IngestionBuffer>>,
}

impl SharedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(IngestionBuffer::new(capacity))),
        }
    }

    pub(crate) fn append(&self, record: LogRecord) {
        let mut guard = self.inner.write().expect("buffer lock poisoned");
        guard.append(record);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recent(&self, n: usize) -> Vec<LogRecord> {
        self.inner.read().expect("buffer lock poisoned").recent(n)
    }

    pub fn by_service(&self, name: &str) -> Vec<LogRecord> {
        self.inner
            .read()
            .expect("buffer lock poisoned")
            .by_service(name)
    }

    pub fn in_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<LogRecord> {
        self.inner
            .read()
            .expect("buffer lock poisoned")
            .in_window(start, end)
    }

    pub fn errors_only(&self) -> Vec<LogRecord> {
        self.inner.read().expect("buffer lock poisoned").errors_only()
    }

    /// Consistent copy; the read lock is held only for the copy, not for
    /// the duration of whatever analysis follows.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.inner.read().expect("buffer lock poisoned").snapshot()
    }
}

impl Default for SharedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
