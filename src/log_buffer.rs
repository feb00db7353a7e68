//! Bounded in-memory event log.
//!
//! Keeps the most recent connectivity events so they can be fetched over the
//! API (`GET /log`) without a serial console. Entries are prefixed with the
//! uptime as `HH:MM:SS`. When the total text exceeds [`MAX_LOG_BYTES`] the
//! oldest entries are dropped. Every entry is mirrored to the `log` facade.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Upper bound on the summed length of retained entries.
pub const MAX_LOG_BYTES: usize = 1024;

/// Logging sink collaborator. Best effort: never fails.
pub trait LogSink: Send {
    fn append(&self, message: &str);
}

#[derive(Debug, Default)]
struct Entries {
    lines: VecDeque<String>,
    total_bytes: usize,
}

/// Shared ring buffer of timestamped log lines. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    started: Instant,
    max_bytes: usize,
    entries: Arc<Mutex<Entries>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_BYTES)
    }

    /// Buffer retaining at most `max_bytes` of entry text.
    pub fn with_capacity(max_bytes: usize) -> Self {
        Self {
            started: Instant::now(),
            max_bytes,
            entries: Arc::new(Mutex::new(Entries::default())),
        }
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.lines.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().lines.iter().cloned().collect(),
        }
    }

    /// Retained entries as a JSON array of strings.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries()).unwrap_or_else(|_| "[]".to_string())
    }

    fn push(&self, line: String) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.total_bytes += line.len();
        entries.lines.push_back(line);
        while entries.total_bytes > self.max_bytes {
            match entries.lines.pop_front() {
                Some(oldest) => entries.total_bytes -= oldest.len(),
                None => break,
            }
        }
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for LogBuffer {
    fn append(&self, message: &str) {
        log::info!("{}", message);
        let line = format!("{}: {}", format_uptime(self.started.elapsed()), message);
        self.push(line);
    }
}

/// Format a duration as `HH:MM:SS`.
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}
