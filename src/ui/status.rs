//! Transient status line for locally observed outcomes.
//!
//! Request failures, refusals and completed operations surface here and
//! auto-expire; the server-pushed message banner is separate state owned by
//! the view reconciler. Newest message wins — there is never more than one.

use crate::core::config::{STATUS_ERROR_TTL, STATUS_TTL};
use ratatui::style::Color;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    pub fn color(self) -> Color {
        match self {
            StatusLevel::Info => Color::Cyan,
            StatusLevel::Success => Color::Green,
            StatusLevel::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    shown_until: Instant,
}

/// The single transient status slot.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    current: Option<StatusMessage>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set(StatusLevel::Info, text.into());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.set(StatusLevel::Success, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set(StatusLevel::Error, text.into());
    }

    fn set(&mut self, level: StatusLevel, text: String) {
        let ttl = match level {
            StatusLevel::Error => STATUS_ERROR_TTL,
            _ => STATUS_TTL,
        };
        self.current = Some(StatusMessage {
            level,
            text,
            shown_until: Instant::now() + ttl,
        });
    }

    /// The active message, or `None` once expired.
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|m| Instant::now() < m.shown_until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_message_wins() {
        let mut status = StatusLine::new();
        status.info("first");
        status.error("second");
        let current = status.current().unwrap();
        assert_eq!(current.text, "second");
        assert_eq!(current.level, StatusLevel::Error);
    }

    #[test]
    fn empty_line_shows_nothing() {
        assert!(StatusLine::new().current().is_none());
    }
}
