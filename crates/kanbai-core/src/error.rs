//! Error types for the kanbai board

use thiserror::Error;

/// Main error type for kanbai operations
#[derive(Error, Debug)]
pub enum KanbaiError {
    // ─────────────────────────────────────────────────────────────
    // Fetch Errors
    // ─────────────────────────────────────────────────────────────
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("unexpected document shape at {url}: {reason}")]
    Parse { url: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Roster Errors
    // ─────────────────────────────────────────────────────────────
    #[error("roster file not found: {path}")]
    RosterNotFound { path: String },

    #[error("malformed roster row at line {line}: {reason}")]
    MalformedRoster { line: usize, reason: String },

    #[error("roster read error: {0}")]
    Roster(String),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ─────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for kanbai operations
pub type Result<T> = std::result::Result<T, KanbaiError>;

impl KanbaiError {
    /// Fatal errors abort startup; everything else degrades to an empty
    /// per-job result and the cycle continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RosterNotFound { .. }
                | Self::MalformedRoster { .. }
                | Self::Roster(_)
                | Self::MissingConfig(_)
                | Self::InvalidConfig(_)
        )
    }

    /// Get the stage where the error occurred (for tracing)
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Parse { .. } => "fetch",
            Self::RosterNotFound { .. } | Self::MalformedRoster { .. } | Self::Roster(_) => {
                "roster"
            }
            Self::MissingConfig(_) | Self::InvalidConfig(_) => "config",
            Self::Io(_) => "io",
        }
    }
}
