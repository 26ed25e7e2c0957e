// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured per-object logging
//!
//! Every daemon gets a logger bound to its resource identity, so log lines
//! from concurrent daemons of many resources stay attributable.

use okra_core::ResourceRef;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Clone)]
enum LogSink {
    Tracing,
    Capture(Arc<Mutex<Vec<LogEntry>>>),
}

/// A logger bound to one resource object.
#[derive(Clone)]
pub struct ObjectLogger {
    namespace: String,
    name: String,
    uid: String,
    sink: LogSink,
}

impl ObjectLogger {
    pub fn new(resource: &ResourceRef) -> Self {
        Self {
            namespace: resource.namespace.clone().unwrap_or_default(),
            name: resource.name.clone(),
            uid: resource.uid.clone(),
            sink: LogSink::Tracing,
        }
    }

    /// A logger that records entries instead of emitting them, for tests
    /// that assert on exact log counts.
    pub fn capturing(resource: &ResourceRef) -> (Self, LogCapture) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            namespace: resource.namespace.clone().unwrap_or_default(),
            name: resource.name.clone(),
            uid: resource.uid.clone(),
            sink: LogSink::Capture(entries.clone()),
        };
        (logger, LogCapture { entries })
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message.as_ref());
    }

    fn log(&self, level: LogLevel, message: &str) {
        match &self.sink {
            LogSink::Tracing => match level {
                LogLevel::Debug => tracing::debug!(
                    namespace = %self.namespace, name = %self.name, uid = %self.uid,
                    "{}", message
                ),
                LogLevel::Info => tracing::info!(
                    namespace = %self.namespace, name = %self.name, uid = %self.uid,
                    "{}", message
                ),
                LogLevel::Warning => tracing::warn!(
                    namespace = %self.namespace, name = %self.name, uid = %self.uid,
                    "{}", message
                ),
                LogLevel::Error => tracing::error!(
                    namespace = %self.namespace, name = %self.name, uid = %self.uid,
                    "{}", message
                ),
            },
            LogSink::Capture(entries) => {
                entries.lock().push(LogEntry { level, message: message.to_string() });
            }
        }
    }
}

/// Handle to the entries recorded by a capturing [`ObjectLogger`].
#[derive(Clone)]
pub struct LogCapture {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogCapture {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Count of entries whose message contains the fragment.
    pub fn count_containing(&self, fragment: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.message.contains(fragment))
            .count()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == LogLevel::Warning)
            .map(|e| e.message.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
