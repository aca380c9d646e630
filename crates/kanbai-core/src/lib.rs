//! Kanbai Core - Shared types, models, and configuration
//!
//! This crate provides the foundational data structures used across
//! the kanbai inventory board.

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, SlotRules};
pub use error::{KanbaiError, Result};
pub use models::{DisplayState, League, Member, SlotMap, StockState};
