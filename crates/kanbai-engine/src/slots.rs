//! Slot-label classification and ordering
//!
//! A slot label names a fixed-width time range ("15:00-15:15"). Labels are
//! partitioned into two disjoint bands: the early band (a closed list) and
//! the regular band (start hour in a fixed set). Anything else is outside
//! the gating logic but still displayed when a source sells it.

use kanbai_core::SlotRules;

/// Band a slot label falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBand {
    Early,
    Regular,
    Other,
}

/// Classify a label against the configured universes. Pure: depends only on
/// the label and the rules, never on fetch cycle or member.
pub fn classify(rules: &SlotRules, label: &str) -> SlotBand {
    if rules.early_slots.iter().any(|s| s == label) {
        return SlotBand::Early;
    }
    match start_hour(label) {
        Some(h) if rules.regular_hours.contains(&h) => SlotBand::Regular,
        _ => SlotBand::Other,
    }
}

/// Whether the label belongs to the tail band the final source overwrites.
pub fn is_tail(rules: &SlotRules, label: &str) -> bool {
    start_hour(label).is_some_and(|h| rules.tail_hours.contains(&h))
}

/// Sort key: start time in minutes since midnight.
///
/// Labels that do not parse key as 0 and sort to the front. Rejecting them
/// at ingestion would drop slots the source actually sells, so odd labels
/// are kept and merely sort strangely.
pub fn sort_key(label: &str) -> u32 {
    let Some(start) = label.split('-').next() else {
        return 0;
    };
    let mut parts = start.trim().split(':');
    let (Some(h), Some(m)) = (parts.next(), parts.next()) else {
        return 0;
    };
    match (h.parse::<u32>(), m.parse::<u32>()) {
        (Ok(h), Ok(m)) => h * 60 + m,
        _ => 0,
    }
}

/// Stable sort by start time.
pub fn sort_slots(labels: &mut [String]) {
    labels.sort_by_key(|l| sort_key(l));
}

/// Hour component of the label's start time.
pub fn start_hour(label: &str) -> Option<u32> {
    label
        .split('-')
        .next()?
        .trim()
        .split(':')
        .next()?
        .parse()
        .ok()
}

/// Display form: "15:00-15:15" -> "15:00".
pub fn start_time(label: &str) -> &str {
    label.split('-').next().unwrap_or(label).trim()
}

/// The fixed known universe of slot labels: the early list plus one
/// 15-minute label per quarter hour of every regular hour. Used to
/// synthesize rows before sales start.
pub fn known_universe(rules: &SlotRules) -> Vec<String> {
    let mut labels = rules.early_slots.clone();
    for &hour in &rules.regular_hours {
        for minute in [0u32, 15, 30, 45] {
            let (end_h, end_m) = if minute == 45 {
                (hour + 1, 0)
            } else {
                (hour, minute + 15)
            };
            labels.push(format!("{hour:02}:{minute:02}-{end_h:02}:{end_m:02}"));
        }
    }
    sort_slots(&mut labels);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SlotRules {
        SlotRules::default()
    }

    #[test]
    fn test_early_universe_classifies_early() {
        let rules = rules();
        for label in &rules.early_slots {
            assert_eq!(classify(&rules, label), SlotBand::Early, "{label}");
        }
    }

    #[test]
    fn test_regular_hours_classify_regular() {
        let rules = rules();
        for label in ["18:00-18:15", "19:45-20:00", "20:30-20:45", "21:45-22:00"] {
            assert_eq!(classify(&rules, label), SlotBand::Regular, "{label}");
        }
    }

    #[test]
    fn test_outside_both_bands_is_other() {
        let rules = rules();
        assert_eq!(classify(&rules, "12:00-12:15"), SlotBand::Other);
        assert_eq!(classify(&rules, "22:00-22:15"), SlotBand::Other);
        assert_eq!(classify(&rules, "garbage"), SlotBand::Other);
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(sort_key("15:00-15:15"), 900);
        assert_eq!(sort_key("21:45-22:00"), 1305);
        assert_eq!(sort_key("not a slot"), 0);
    }

    #[test]
    fn test_sort_slots_idempotent() {
        let sorted = vec![
            "15:00-15:15".to_string(),
            "18:00-18:15".to_string(),
            "21:45-22:00".to_string(),
        ];
        let mut again = sorted.clone();
        sort_slots(&mut again);
        assert_eq!(again, sorted);

        let mut reversed: Vec<String> = sorted.iter().rev().cloned().collect();
        sort_slots(&mut reversed);
        assert_eq!(reversed, sorted);
    }

    #[test]
    fn test_is_tail() {
        let rules = rules();
        assert!(is_tail(&rules, "21:00-21:15"));
        assert!(is_tail(&rules, "21:45-22:00"));
        assert!(!is_tail(&rules, "20:45-21:00"));
        assert!(!is_tail(&rules, "15:00-15:15"));
    }

    #[test]
    fn test_start_time() {
        assert_eq!(start_time("15:00-15:15"), "15:00");
        assert_eq!(start_time("oddball"), "oddball");
    }

    #[test]
    fn test_known_universe() {
        let universe = known_universe(&rules());
        // 12 early labels + 4 hours * 4 quarter slots
        assert_eq!(universe.len(), 28);
        assert_eq!(universe.first().unwrap(), "15:00-15:15");
        assert_eq!(universe.last().unwrap(), "21:45-22:00");
        assert!(universe.contains(&"19:30-19:45".to_string()));
    }
}
