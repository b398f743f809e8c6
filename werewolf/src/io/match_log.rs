//! JSON record of a finished match.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::roster::Roster;
use crate::core::types::{Faction, MatchEvent, Role};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatSummary {
    pub name: String,
    pub role: Role,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub seed: Option<u64>,
    pub days: u32,
    pub winner: Option<Faction>,
    pub roster: Vec<SeatSummary>,
    pub events: Vec<MatchEvent>,
}

impl MatchRecord {
    pub fn new(
        seed: Option<u64>,
        days: u32,
        winner: Option<Faction>,
        roster: &Roster,
        events: &[MatchEvent],
    ) -> Self {
        Self {
            seed,
            days,
            winner,
            roster: roster
                .players()
                .iter()
                .map(|player| SeatSummary {
                    name: player.name.clone(),
                    role: player.role(),
                    alive: player.alive,
                })
                .collect(),
            events: events.to_vec(),
        }
    }
}

/// Serialize `record` to pretty-printed JSON with trailing newline.
pub fn write_record(path: &Path, record: &MatchRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut buf = serde_json::to_string_pretty(record).context("serialize match record")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DeathCause;

    #[test]
    fn record_lists_roles_and_events() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut roster = Roster::new();
        roster.add("Ava", Role::Werewolf).expect("add");
        roster.add("Ben", Role::Villager).expect("add");
        roster.mark_dead("Ava");
        let events = vec![MatchEvent::Died {
            day: 1,
            player: "Ava".to_string(),
            cause: DeathCause::Lynch,
        }];

        let record = MatchRecord::new(Some(3), 1, Some(Faction::Good), &roster, &events);
        let path = temp.path().join("records/match.json");
        write_record(&path, &record).expect("write");

        let raw = fs::read_to_string(&path).expect("read");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(json["winner"], "good");
        assert_eq!(json["roster"][0]["role"], "werewolf");
        assert_eq!(json["roster"][0]["alive"], false);
        assert_eq!(json["events"][0]["type"], "died");
        assert!(raw.ends_with('\n'));
    }
}
