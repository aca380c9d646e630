//! Configuration management for the kanbai board
//!
//! Configuration can be loaded from:
//! - Environment variables (primary)
//! - Defaults matching the reference event

use crate::error::{KanbaiError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Deadline after which the final-slot endpoints are no longer queried,
/// 23:59:59 JST on the event's final-sale day.
const DEFAULT_FINAL_DEADLINE: &str = "2025-03-25T23:59:59+09:00";

/// Fixed universe of early-band slot labels (15:00 through 18:00).
const DEFAULT_EARLY_SLOTS: [&str; 12] = [
    "15:00-15:15",
    "15:15-15:30",
    "15:30-15:45",
    "15:45-16:00",
    "16:00-16:15",
    "16:15-16:30",
    "16:30-16:45",
    "16:45-17:00",
    "17:00-17:15",
    "17:15-17:30",
    "17:30-17:45",
    "17:45-18:00",
];

// ─────────────────────────────────────────────────────────────────────────────
// SlotRules
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed slot-label universes and band boundaries.
///
/// `tail_hours` names the hour prefixes the reconciliation step overwrites
/// from the final source; it is deliberately its own knob rather than being
/// inferred from `regular_hours`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlotRules {
    /// Closed list of early-band labels
    pub early_slots: Vec<String>,
    /// Start hours whose labels classify as regular
    pub regular_hours: Vec<u32>,
    /// Start hours overwritten by the final source during reconciliation
    pub tail_hours: Vec<u32>,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            early_slots: DEFAULT_EARLY_SLOTS.iter().map(|s| s.to_string()).collect(),
            regular_hours: vec![18, 19, 20, 21],
            tail_hours: vec![21],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Main configuration struct
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // ───────────────────────────────────────────────────────────
    // Fetch settings
    // ───────────────────────────────────────────────────────────
    /// Jobs per concurrent batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (ms), bounding request rate at the origin
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    // ───────────────────────────────────────────────────────────
    // Derivation settings
    // ───────────────────────────────────────────────────────────
    /// Sold-out count at which a slot is flagged crowded
    #[serde(default = "default_crowd_threshold")]
    pub crowd_threshold: usize,

    /// Final-slot endpoints are queried while now <= this instant
    #[serde(default = "default_final_deadline")]
    pub final_slot_deadline: DateTime<Utc>,

    /// Before this instant no network calls are made and every slot is
    /// synthesized as unreleased. None means sales have always started.
    #[serde(default)]
    pub sale_start: Option<DateTime<Utc>>,

    /// Slot universes and band boundaries
    #[serde(default)]
    pub slot_rules: SlotRules,

    // ───────────────────────────────────────────────────────────
    // Roster settings
    // ───────────────────────────────────────────────────────────
    /// Path to the member roster CSV
    #[serde(default = "default_roster_path")]
    pub roster_path: PathBuf,

    /// Fail fast on a malformed roster row instead of skipping it
    #[serde(default)]
    pub strict_roster: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default value functions
// ─────────────────────────────────────────────────────────────────────────────

fn default_batch_size() -> usize {
    55
}
fn default_batch_delay() -> u64 {
    200
}
fn default_timeout() -> u64 {
    20
}
fn default_crowd_threshold() -> usize {
    15
}
fn default_final_deadline() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(DEFAULT_FINAL_DEADLINE)
        .expect("default deadline is valid RFC3339")
        .with_timezone(&Utc)
}
fn default_roster_path() -> PathBuf {
    PathBuf::from("./members.csv")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay(),
            request_timeout_secs: default_timeout(),
            crowd_threshold: default_crowd_threshold(),
            final_slot_deadline: default_final_deadline(),
            sale_start: None,
            slot_rules: SlotRules::default(),
            roster_path: default_roster_path(),
            strict_roster: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(v) = std::env::var("KANBAI_BATCH_SIZE") {
            config.batch_size = v.parse().unwrap_or(default_batch_size());
        }

        if let Ok(v) = std::env::var("KANBAI_BATCH_DELAY_MS") {
            config.batch_delay_ms = v.parse().unwrap_or(default_batch_delay());
        }

        if let Ok(v) = std::env::var("KANBAI_TIMEOUT_SECS") {
            config.request_timeout_secs = v.parse().unwrap_or(default_timeout());
        }

        if let Ok(v) = std::env::var("KANBAI_CROWD_THRESHOLD") {
            config.crowd_threshold = v.parse().unwrap_or(default_crowd_threshold());
        }

        // Instants must parse; a silently wrong deadline flips the gating
        // rules for the whole board.
        if let Ok(v) = std::env::var("KANBAI_FINAL_DEADLINE") {
            config.final_slot_deadline = parse_instant("KANBAI_FINAL_DEADLINE", &v)?;
        }

        if let Ok(v) = std::env::var("KANBAI_SALE_START") {
            config.sale_start = Some(parse_instant("KANBAI_SALE_START", &v)?);
        }

        if let Ok(v) = std::env::var("KANBAI_EARLY_SLOTS") {
            config.slot_rules.early_slots = split_list(&v);
        }

        if let Ok(v) = std::env::var("KANBAI_REGULAR_HOURS") {
            config.slot_rules.regular_hours = parse_hours("KANBAI_REGULAR_HOURS", &v)?;
        }

        if let Ok(v) = std::env::var("KANBAI_TAIL_HOURS") {
            config.slot_rules.tail_hours = parse_hours("KANBAI_TAIL_HOURS", &v)?;
        }

        if let Ok(v) = std::env::var("KANBAI_ROSTER") {
            config.roster_path = PathBuf::from(v);
        }

        if let Ok(v) = std::env::var("KANBAI_STRICT_ROSTER") {
            config.strict_roster = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Validate configuration before running a cycle
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(KanbaiError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.crowd_threshold == 0 {
            return Err(KanbaiError::InvalidConfig(
                "crowd_threshold must be at least 1".to_string(),
            ));
        }
        if self.slot_rules.regular_hours.is_empty() {
            return Err(KanbaiError::InvalidConfig(
                "regular_hours must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_instant(key: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KanbaiError::InvalidConfig(format!("{key}: {e}")))
}

fn parse_hours(key: &str, value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| KanbaiError::InvalidConfig(format!("{key}: {e}")))
        })
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
