//! The consolidated status board and its per-run cache
//!
//! `StatusBoard` is what a renderer consumes: the reconciled matrix in
//! roster order, the sorted slot universe, and every derived aggregate.
//! Aggregates are always computed over the full matrix, so filtering the
//! displayed rows by league never changes the numbers.

use crate::derive::{self, Matrix};
use crate::slots;
use chrono::{DateTime, Utc};
use kanbai_core::{DisplayState, League, Member, SlotMap, SlotRules, StockState};
use serde::Serialize;
use std::collections::HashMap;

/// One fetch cycle's consolidated output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBoard {
    /// Roster order, preserved for display
    pub members: Vec<Member>,
    /// Sorted union of every observed slot label
    pub slots: Vec<String>,
    /// member name -> slot label -> reconciled state
    pub matrix: Matrix,
    pub sold_out_counts: HashMap<String, usize>,
    pub crowded: HashMap<String, bool>,
    pub member_sales: HashMap<String, usize>,
    pub members_all_regular_sold_out: usize,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    rules: SlotRules,
}

impl StatusBoard {
    /// Assemble the board from reconciled rows. Every roster member ends up
    /// with a row, empty when its fetches failed.
    pub fn build(
        members: Vec<Member>,
        mut matrix: Matrix,
        rules: &SlotRules,
        crowd_threshold: usize,
        updated_at: DateTime<Utc>,
    ) -> Self {
        for member in &members {
            matrix.entry(member.name.clone()).or_default();
        }

        let mut slot_set: Vec<String> = matrix
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        slots::sort_slots(&mut slot_set);

        let members_all_regular_sold_out =
            derive::count_members_all_regular_sold_out(&members, &matrix, &slot_set, rules);
        let sold_out_counts = derive::sold_out_counts(&members, &matrix, &slot_set, rules);
        let crowded = derive::crowded_slots(
            &slot_set,
            &sold_out_counts,
            members_all_regular_sold_out,
            crowd_threshold,
            rules,
        );
        let member_sales = derive::member_sale_counts(&members, &matrix, &slot_set, rules);

        Self {
            members,
            slots: slot_set,
            matrix,
            sold_out_counts,
            crowded,
            member_sales,
            members_all_regular_sold_out,
            updated_at,
            rules: rules.clone(),
        }
    }

    /// Members to display for a league filter; `None` shows everyone.
    pub fn rows_for_league(&self, league: Option<League>) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| league.is_none_or(|l| m.league == l))
            .collect()
    }

    /// Stored state of one cell.
    pub fn state(&self, member: &str, slot: &str) -> Option<StockState> {
        self.matrix.get(member)?.get(slot).copied()
    }

    /// Display states for one member, aligned with `self.slots`.
    pub fn display_row(&self, member: &Member) -> Vec<DisplayState> {
        let empty = SlotMap::new();
        let row = self.matrix.get(&member.name).unwrap_or(&empty);
        let all_regular_sold =
            derive::all_regular_slots_sold_out(row, &self.slots, &self.rules);

        self.slots
            .iter()
            .map(|slot| {
                derive::display_state(
                    row.get(slot).copied(),
                    slots::classify(&self.rules, slot),
                    member.league.is_u17(),
                    all_regular_sold,
                )
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BoardCache
// ─────────────────────────────────────────────────────────────────────────────

/// Per-run cache of the latest board. One lives for the whole process and
/// is reset explicitly, never implicitly by a UI framework's session.
#[derive(Debug, Default)]
pub struct BoardCache {
    board: Option<StatusBoard>,
    loaded: bool,
    last_update: Option<DateTime<Utc>>,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, board: StatusBoard) {
        self.last_update = Some(board.updated_at);
        self.board = Some(board);
        self.loaded = true;
    }

    pub fn board(&self) -> Option<&StatusBoard> {
        self.board.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
