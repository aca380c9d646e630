//! Data models for the kanbai board
//!
//! Key concepts:
//! - `Member`: a seller with one or two stock endpoints, fixed for the run
//! - `League`: the member's group tag; `U17` drives the gating exceptions
//! - `StockState`: normalized per-slot stock state after fetching
//! - `DisplayState`: what a renderer shows for a cell; derived, never stored

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Per-member mapping from slot label to normalized stock state.
///
/// A slot absent from the map was not present in the source at all; that is
/// distinct from every fetched state and renders as "unknown".
pub type SlotMap = HashMap<String, StockState>;

// ─────────────────────────────────────────────────────────────────────────────
// League
// ─────────────────────────────────────────────────────────────────────────────

/// Group tag for a member. Closed set; roster rows with anything else are
/// rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    Z1,
    Z2,
    Z3,
    Z4,
    Z5,
    U17,
}

impl League {
    pub const ALL: [League; 6] = [
        League::Z1,
        League::Z2,
        League::Z3,
        League::Z4,
        League::Z5,
        League::U17,
    ];

    /// U17 members sell early slots as ordinary inventory and have no
    /// final endpoint.
    pub fn is_u17(&self) -> bool {
        matches!(self, League::U17)
    }
}

impl FromStr for League {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Z1" => Ok(League::Z1),
            "Z2" => Ok(League::Z2),
            "Z3" => Ok(League::Z3),
            "Z4" => Ok(League::Z4),
            "Z5" => Ok(League::Z5),
            "U17" => Ok(League::U17),
            other => Err(format!("unknown league: {other:?}")),
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            League::Z1 => "Z1",
            League::Z2 => "Z2",
            League::Z3 => "Z3",
            League::Z4 => "Z4",
            League::Z5 => "Z5",
            League::U17 => "U17",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Member
// ─────────────────────────────────────────────────────────────────────────────

/// A seller tracked on the board.
///
/// Constructed once from the roster at startup; immutable for the run.
/// The name is the unique key into the inventory matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique display name, stable across runs
    pub name: String,
    /// Group tag; only consulted for gating exceptions
    pub league: League,
    /// Primary stock page
    pub normal_url: Option<String>,
    /// Secondary, time-gated stock page (absent for U17)
    pub final_url: Option<String>,
}

impl Member {
    pub fn new(
        name: impl Into<String>,
        league: League,
        normal_url: Option<String>,
        final_url: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            league,
            normal_url,
            final_url,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StockState
// ─────────────────────────────────────────────────────────────────────────────

/// Normalized stock state for one (member, slot) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    /// Plentiful stock
    Available,
    /// Low stock (last unit marker on the page)
    LastOne,
    /// Sold out
    SoldOut,
    /// Sale has not opened yet (notify-me sentinel); distinct from sold out
    Unreleased,
}

impl StockState {
    pub fn is_sold_out(&self) -> bool {
        matches!(self, StockState::SoldOut)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DisplayState
// ─────────────────────────────────────────────────────────────────────────────

/// What a renderer shows for one cell. Purely derived from the reconciled
/// matrix plus the gating rules; never stored back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    /// Available or last-one; one marker either way
    Open,
    SoldOut,
    /// Gated: either explicitly unreleased, or an early slot sold out
    /// before the member cleared their regular band
    Locked,
    /// Slot missing from the member's row (fetch failure or not on sale);
    /// must never be conflated with sold out
    Unknown,
}

impl DisplayState {
    /// Single-cell marker for text rendering.
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplayState::Open => "○",
            DisplayState::SoldOut => "×",
            DisplayState::Locked => "🔒",
            DisplayState::Unknown => "・",
        }
    }
}
