//! Gating and derivation over the reconciled matrix
//!
//! Early slots are gated releases, not independent inventory: for a non-U17
//! member an early sold-out only means anything once the member's whole
//! regular band is exhausted. Every aggregate here applies that same rule,
//! so a gated early slot never inflates a count before its release. All
//! functions are pure over the matrix plus the configured rules.

use crate::slots::{self, SlotBand};
use kanbai_core::{DisplayState, Member, SlotMap, SlotRules, StockState};
use std::collections::HashMap;

/// Matrix of reconciled rows, keyed by member name.
pub type Matrix = HashMap<String, SlotMap>;

/// True iff the universe contains at least one regular slot AND the member
/// holds every one of them at sold-out. A slot absent from the row counts
/// as not sold out, so a partial fetch can never claim a cleared band.
pub fn all_regular_slots_sold_out(
    row: &SlotMap,
    slot_universe: &[String],
    rules: &SlotRules,
) -> bool {
    let mut has_regular = false;
    for label in slot_universe {
        if slots::classify(rules, label) == SlotBand::Regular {
            has_regular = true;
            if row.get(label).is_none_or(|s| !s.is_sold_out()) {
                return false;
            }
        }
    }
    has_regular
}

/// How many members cleared their whole regular band.
pub fn count_members_all_regular_sold_out(
    members: &[Member],
    matrix: &Matrix,
    slot_universe: &[String],
    rules: &SlotRules,
) -> usize {
    members
        .iter()
        .filter_map(|m| matrix.get(&m.name))
        .filter(|row| all_regular_slots_sold_out(row, slot_universe, rules))
        .count()
}

/// Sold-out count per slot.
///
/// Regular and other slots count plainly. Early slots apply the gating
/// exception: U17 members count by raw state, everyone else only counts
/// once their regular band is cleared.
pub fn sold_out_counts(
    members: &[Member],
    matrix: &Matrix,
    slot_universe: &[String],
    rules: &SlotRules,
) -> HashMap<String, usize> {
    let empty = SlotMap::new();
    let mut counts = HashMap::with_capacity(slot_universe.len());

    for label in slot_universe {
        let early = slots::classify(rules, label) == SlotBand::Early;
        let mut count = 0;

        for member in members {
            let row = matrix.get(&member.name).unwrap_or(&empty);
            let sold = row.get(label).is_some_and(|s| s.is_sold_out());
            if !sold {
                continue;
            }
            if early
                && !member.league.is_u17()
                && !all_regular_slots_sold_out(row, slot_universe, rules)
            {
                continue;
            }
            count += 1;
        }

        counts.insert(label.clone(), count);
    }

    counts
}

/// Crowd flag per slot. Early slots go by how many members cleared their
/// regular band; everything else goes by the slot's own sold-out count.
pub fn crowded_slots(
    slot_universe: &[String],
    sold_out_counts: &HashMap<String, usize>,
    members_all_regular_sold_out: usize,
    threshold: usize,
    rules: &SlotRules,
) -> HashMap<String, bool> {
    slot_universe
        .iter()
        .map(|label| {
            let crowded = if slots::classify(rules, label) == SlotBand::Early {
                members_all_regular_sold_out >= threshold
            } else {
                sold_out_counts.get(label).copied().unwrap_or(0) >= threshold
            };
            (label.clone(), crowded)
        })
        .collect()
}

/// Sold-slot count per member, excluding gated early slots that have not
/// been released yet (non-U17, regular band not cleared).
pub fn member_sale_counts(
    members: &[Member],
    matrix: &Matrix,
    slot_universe: &[String],
    rules: &SlotRules,
) -> HashMap<String, usize> {
    let empty = SlotMap::new();
    let mut counts = HashMap::with_capacity(members.len());

    for member in members {
        let row = matrix.get(&member.name).unwrap_or(&empty);
        let all_regular_sold = all_regular_slots_sold_out(row, slot_universe, rules);

        let sold = row
            .iter()
            .filter(|(label, state)| {
                if !state.is_sold_out() {
                    return false;
                }
                let gated = !member.league.is_u17()
                    && slots::classify(rules, label) == SlotBand::Early
                    && !all_regular_sold;
                !gated
            })
            .count();

        counts.insert(member.name.clone(), sold);
    }

    counts
}

/// Display state for one cell. Derived at render time over reconciled
/// data; the stored state is untouched.
pub fn display_state(
    state: Option<StockState>,
    band: SlotBand,
    is_u17: bool,
    all_regular_sold: bool,
) -> DisplayState {
    match state {
        None => DisplayState::Unknown,
        Some(StockState::Available) | Some(StockState::LastOne) => DisplayState::Open,
        Some(StockState::Unreleased) => DisplayState::Locked,
        Some(StockState::SoldOut) => {
            if band == SlotBand::Early && !is_u17 && !all_regular_sold {
                DisplayState::Locked
            } else {
                DisplayState::SoldOut
            }
        }
    }
}
