//! Centralized configuration constants.
//!
//! All tunable parameters live here so they can be reviewed and adjusted
//! in a single place. Wire-format details (message tags, endpoint paths)
//! stay in their respective modules.

use std::time::Duration;

// ── Transport ────────────────────────────────────────────────────────────────

/// Fixed delay between reconnection attempts on the display channel.
/// Deliberately constant — no backoff growth, no retry cap. The device is
/// expected to come and go (reboots, flaky Wi-Fi) and the channel simply
/// keeps knocking.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Default port of the device's display WebSocket (the HTTP side stays on 80).
pub const DEFAULT_WS_PORT: u16 = 81;

// ── View ─────────────────────────────────────────────────────────────────────

/// Reserved partial-update target id: replaces the whole page body instead of
/// a single slot.
pub const BODY_TARGET_ID: &str = "bodyContent";

/// Shell slot ids that exist outside any pushed page body and are valid
/// partial-update targets from the moment the client starts.
pub const SHELL_SLOT_IDS: &[&str] = &["datetime"];

// ── Status line ──────────────────────────────────────────────────────────────

/// How long an informational status stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// How long an error status stays visible.
pub const STATUS_ERROR_TTL: Duration = Duration::from_secs(5);

// ── UI / Misc ────────────────────────────────────────────────────────────────

/// Key poll interval of the UI loop.
pub const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Maximum log entries kept in the in-memory ring buffer.
pub const MAX_LOG_ENTRIES: usize = 500;
