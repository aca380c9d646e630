//! Time gates for a fetch cycle
//!
//! Pure functions of a passed-in instant against configured deadlines.
//! Callers sample the clock once per cycle and thread the value through,
//! so a cycle sees one consistent decision.

use chrono::{DateTime, Utc};

/// Final-slot endpoints are only queried while the final window is open.
pub fn use_final_slots(now: DateTime<Utc>, final_deadline: DateTime<Utc>) -> bool {
    now <= final_deadline
}

/// Whether sales have started at all. No configured instant means the gate
/// is always open. Before this returns true, the orchestrator makes zero
/// network calls and synthesizes every slot as unreleased.
pub fn sales_started(now: DateTime<Utc>, sale_start: Option<DateTime<Utc>>) -> bool {
    sale_start.is_none_or(|start| now >= start)
}
