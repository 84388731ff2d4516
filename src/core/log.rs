//! Append-only log buffers and live log mirroring
//!
//! Every flow, stage and action owns a [`LogBuffer`]. Lines are always
//! appended to the buffer with a timestamp; verbose lines are additionally
//! mirrored to a [`LogObserver`] as they happen.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives log lines live while a flow runs
pub trait LogObserver: Send + Sync {
    fn on_line(&self, line: &str);
}

impl<F> LogObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_line(&self, line: &str) {
        self(line)
    }
}

/// Observer that prints mirrored lines to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl LogObserver for ConsoleObserver {
    fn on_line(&self, line: &str) {
        println!("{}", console::style(line).cyan());
    }
}

/// Append-only, thread-safe buffer of log lines
///
/// `Clone` produces an independent copy of the lines; use [`LogBuffer::share`]
/// to get a second handle onto the same buffer.
#[derive(Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Another handle onto the same underlying buffer
    pub fn share(&self) -> LogBuffer {
        Self {
            lines: Arc::clone(&self.lines),
        }
    }

    // Appends never leave the vector half-written, so a poisoned lock is
    // still safe to use.
    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a single line, returning the new length
    pub fn append(&self, line: String) -> usize {
        let mut lines = self.guard();
        lines.push(line);
        lines.len()
    }

    /// Append several lines as one contiguous block
    pub fn append_batch(&self, batch: Vec<String>) -> usize {
        let mut lines = self.guard();
        lines.extend(batch);
        lines.len()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Copy of the current lines
    pub fn snapshot(&self) -> Vec<String> {
        self.guard().clone()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.guard().iter().any(|line| line.contains(needle))
    }
}

impl Clone for LogBuffer {
    fn clone(&self) -> Self {
        Self::from_lines(self.snapshot())
    }
}

impl PartialEq for LogBuffer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lines, &other.lines) || self.snapshot() == other.snapshot()
    }
}

impl fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.guard().iter()).finish()
    }
}

impl Serialize for LogBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LogBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(LogBuffer::from_lines)
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Write one line to `buffer` and optionally mirror it to `observer`
///
/// The buffered copy is always timestamped. The mirrored copy carries a
/// timestamp prefix only when `with_timestamp` is set.
pub fn log_line(
    buffer: &LogBuffer,
    observer: Option<&dyn LogObserver>,
    line: &str,
    verbose: bool,
    with_timestamp: bool,
) -> String {
    let stamp = now_stamp();
    let stored = format!("[{}] {}", stamp, line);
    buffer.append(stored.clone());

    if verbose {
        if let Some(observer) = observer {
            if with_timestamp {
                observer.on_line(&format!("[{}] {}", stamp, line.trim()));
            } else {
                observer.on_line(line);
            }
        }
    }

    stored
}

/// Run-wide logging settings handed down the hierarchy
#[derive(Clone, Default)]
pub struct LogRecorder {
    observer: Option<Arc<dyn LogObserver>>,
    timestamp: bool,
}

impl LogRecorder {
    pub fn new(observer: Option<Arc<dyn LogObserver>>, timestamp: bool) -> Self {
        Self { observer, timestamp }
    }

    /// Recorder that never mirrors lines
    pub fn silent() -> Self {
        Self::default()
    }

    /// Record a line using the run-wide timestamp setting
    pub fn log(&self, buffer: &LogBuffer, line: &str, verbose: bool) -> String {
        log_line(buffer, self.observer.as_deref(), line, verbose, self.timestamp)
    }

    /// Timestamped form of a line, as it would be stored in a buffer
    pub fn stamp(&self, line: &str) -> String {
        format!("[{}] {}", now_stamp(), line)
    }
}

impl fmt::Debug for LogRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecorder")
            .field("observer", &self.observer.is_some())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
