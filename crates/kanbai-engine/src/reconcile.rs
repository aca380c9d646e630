//! Reconciliation of a member's normal and final fetch results
//!
//! The final endpoint sells the tail of the evening as one block. While the
//! final window is open, its sold-out-ness is authoritative for every tail
//! slot of the normal timeline: all sold there means the tail is gone, and
//! anything still open there means the tail is effectively available. The
//! overwrite is deliberately lossy; a tail slot's own `last-one` reading
//! from the normal fetch is discarded in favor of the final source.

use crate::slots;
use kanbai_core::{SlotMap, SlotRules, StockState};

/// Merge one member's fetches into a single timeline. With the final window
/// closed or no final result present, the normal result passes through
/// untouched. Members reconcile independently of each other.
pub fn reconcile(
    normal: SlotMap,
    final_result: Option<&SlotMap>,
    use_final_slots: bool,
    rules: &SlotRules,
) -> SlotMap {
    let Some(final_slots) = final_result.filter(|_| use_final_slots) else {
        return normal;
    };

    let final_sold_out =
        !final_slots.is_empty() && final_slots.values().all(|s| s.is_sold_out());

    let tail_state = if final_sold_out {
        StockState::SoldOut
    } else {
        StockState::Available
    };

    normal
        .into_iter()
        .map(|(label, state)| {
            if slots::is_tail(rules, &label) {
                (label, tail_state)
            } else {
                (label, state)
            }
        })
        .collect()
}
