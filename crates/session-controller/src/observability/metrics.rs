//! Metrics definitions for the session controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `session_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: 11 values (bounded by `EventKind`)
//! - `command`: 10 values (bounded by `HostCommand`)
//! - `outcome`: 2 values (success, error)
//!
//! The exporter is installed by the host; without one these calls are no-ops.

use crate::events::EventKind;
use metrics::{counter, gauge};

/// Record an event delivered to the attached sink.
///
/// Metric: `session_events_delivered_total`
/// Labels: `kind`
pub fn record_event_delivered(kind: EventKind) {
    counter!("session_events_delivered_total", "kind" => kind.as_str()).increment(1);
}

/// Record a best-effort event that could not be delivered.
///
/// Metric: `session_events_dropped_total`
/// Labels: `kind`
///
/// Non-zero values during a call usually mean the consumer detached early.
pub fn record_event_dropped(kind: EventKind) {
    counter!("session_events_dropped_total", "kind" => kind.as_str()).increment(1);
}

/// Set the number of tracked remote participants for one session.
///
/// Metric: `session_remote_participants`
/// Labels: none
pub fn set_remote_participants(count: usize) {
    // usize to f64 conversion is safe for realistic participant counts
    #[allow(clippy::cast_precision_loss)]
    gauge!("session_remote_participants").set(count as f64);
}

/// Set the number of live sessions in the directory.
///
/// Metric: `session_active`
/// Labels: none
pub fn set_sessions_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("session_active").set(count as f64);
}

/// Record a processed host command.
///
/// Metric: `session_commands_total`
/// Labels: `command`, `outcome`
pub fn record_command(command: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!("session_commands_total", "command" => command, "outcome" => outcome).increment(1);
}
