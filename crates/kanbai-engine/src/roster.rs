//! Member roster loading
//!
//! The roster CSV (`name,league,normal_url,final_url`, with header) is read
//! once at startup into validated `Member` records. A malformed row is
//! skipped with a diagnostic by default; strict mode turns it into a fatal
//! startup error. A missing file is always fatal.

use kanbai_core::{KanbaiError, League, Member, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    league: String,
    #[serde(default)]
    normal_url: String,
    #[serde(default)]
    final_url: String,
}

/// Load and validate the roster. Roster order is preserved; it is the
/// board's display order.
pub fn load_roster(path: &Path, strict: bool) -> Result<Vec<Member>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| match e.kind() {
        csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            KanbaiError::RosterNotFound {
                path: path.display().to_string(),
            }
        }
        _ => KanbaiError::Roster(e.to_string()),
    })?;

    let mut members = Vec::new();

    for (idx, record) in reader.deserialize::<RosterRow>().enumerate() {
        // Header occupies line 1
        let line = idx + 2;
        let parsed = record
            .map_err(|e| KanbaiError::MalformedRoster {
                line,
                reason: e.to_string(),
            })
            .and_then(|row| validate_row(row, line));

        match parsed {
            Ok(member) => members.push(member),
            Err(e) if strict => return Err(e),
            Err(e) => warn!(error = %e, "skipping roster row"),
        }
    }

    info!(members = members.len(), path = %path.display(), "roster loaded");
    Ok(members)
}

fn validate_row(row: RosterRow, line: usize) -> Result<Member> {
    let name = row.name.trim();
    if name.is_empty() {
        return Err(KanbaiError::MalformedRoster {
            line,
            reason: "empty member name".to_string(),
        });
    }

    let league: League = row
        .league
        .parse()
        .map_err(|reason| KanbaiError::MalformedRoster { line, reason })?;

    let normal_url = non_empty(&row.normal_url);
    let final_url = non_empty(&row.final_url);

    // U17 members have no final-slot sale; a final URL on such a row is a
    // roster mistake, not something to quietly fetch.
    if league.is_u17() && final_url.is_some() {
        return Err(KanbaiError::MalformedRoster {
            line,
            reason: format!("U17 member {name:?} must not have a final endpoint"),
        });
    }

    Ok(Member::new(name, league, normal_url, final_url))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn roster_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "name,league,normal_url,final_url\n";

    #[test]
    fn test_load_valid_roster() {
        let file = roster_file(&format!(
            "{HEADER}\
             白咲 ひとみ,Z1,https://shop.example/items/1,https://shop.example/items/2\n\
             三崎 桃果,U17,https://shop.example/items/3,\n"
        ));
        let members = load_roster(file.path(), false).unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "白咲 ひとみ");
        assert_eq!(members[0].league, League::Z1);
        assert!(members[0].final_url.is_some());
        assert_eq!(members[1].league, League::U17);
        assert!(members[1].final_url.is_none());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_roster(Path::new("./no-such-roster.csv"), false).unwrap_err();
        assert!(matches!(err, KanbaiError::RosterNotFound { .. }));
    }

    #[test]
    fn test_malformed_row_skipped_by_default() {
        let file = roster_file(&format!(
            "{HEADER}\
             good,Z2,https://shop.example/items/1,\n\
             bad,Z9,https://shop.example/items/2,\n\
             ,Z1,https://shop.example/items/3,\n"
        ));
        let members = load_roster(file.path(), false).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "good");
    }

    #[test]
    fn test_malformed_row_fatal_in_strict_mode() {
        let file = roster_file(&format!(
            "{HEADER}\
             good,Z2,https://shop.example/items/1,\n\
             bad,Z9,https://shop.example/items/2,\n"
        ));
        let err = load_roster(file.path(), true).unwrap_err();
        match err {
            KanbaiError::MalformedRoster { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_u17_with_final_url_is_malformed() {
        let file = roster_file(&format!(
            "{HEADER}\
             kid,U17,https://shop.example/items/1,https://shop.example/items/2\n"
        ));
        assert!(load_roster(file.path(), false).unwrap().is_empty());
        assert!(load_roster(file.path(), true).is_err());
    }

    #[test]
    fn test_member_without_endpoints_is_allowed() {
        let file = roster_file(&format!("{HEADER}quiet,Z3,,\n"));
        let members = load_roster(file.path(), false).unwrap();
        assert_eq!(members.len(), 1);
        assert!(members[0].normal_url.is_none());
        assert!(members[0].final_url.is_none());
    }
}
