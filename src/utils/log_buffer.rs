//! In-memory log capture for the Logs panel.
//!
//! The TUI owns the terminal, so a normal fmt layer writing to stderr would
//! corrupt the interface. Instead a `tracing` layer appends every event to
//! a bounded ring buffer that the Logs panel renders on demand.

use crate::core::config::MAX_LOG_ENTRIES;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub message: String,
}

/// Shared bounded ring of recent log entries.
#[derive(Clone, Default)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= MAX_LOG_ENTRIES {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// Snapshot of the buffer, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// `tracing` layer feeding a [`LogBuffer`].
pub struct BufferLayer {
    buffer: LogBuffer,
}

impl BufferLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let message = if visitor.line.is_empty() {
            meta.target().to_string()
        } else {
            format!("{}: {}", meta.target(), visitor.line)
        };

        self.buffer.push(LogEntry {
            timestamp: wall_clock_hms(),
            level: *meta.level(),
            message,
        });
    }
}

/// Collects the `message` field first, then any remaining fields as
/// `key=value` pairs.
#[derive(Default)]
struct LineVisitor {
    line: String,
}

impl LineVisitor {
    fn append(&mut self, text: &str) {
        if !self.line.is_empty() {
            self.line.push_str(", ");
        }
        self.line.push_str(text);
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let mut prefixed = value.to_string();
            if !self.line.is_empty() {
                prefixed.push_str(", ");
                prefixed.push_str(&self.line);
            }
            self.line = prefixed;
        } else {
            self.append(&format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let mut prefixed = String::new();
            let _ = write!(prefixed, "{value:?}");
            if !self.line.is_empty() {
                prefixed.push_str(", ");
                prefixed.push_str(&self.line);
            }
            self.line = prefixed;
        } else {
            self.append(&format!("{}={:?}", field.name(), value));
        }
    }
}

fn wall_clock_hms() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_caps_entries() {
        let buffer = LogBuffer::new();
        for i in 0..(MAX_LOG_ENTRIES + 10) {
            buffer.push(LogEntry {
                timestamp: String::new(),
                level: Level::INFO,
                message: i.to_string(),
            });
        }
        let entries = buffer.entries();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        // Oldest entries were evicted.
        assert_eq!(entries[0].message, "10");
    }

    #[test]
    fn snapshot_preserves_order() {
        let buffer = LogBuffer::new();
        for msg in ["a", "b", "c"] {
            buffer.push(LogEntry {
                timestamp: String::new(),
                level: Level::DEBUG,
                message: msg.to_string(),
            });
        }
        let msgs: Vec<String> = buffer.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(msgs, vec!["a", "b", "c"]);
    }
}
