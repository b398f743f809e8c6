//! Per-player observation logs replayed into every decision request.
//!
//! Each player owns two append-only sequences: `public` (speeches and
//! announcements everyone hears) and `private` (outcomes only that player
//! knows). Nothing is ever removed.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::core::types::Phase;

/// Logical timestamp for a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub day: u32,
    pub phase: Phase,
}

impl Stamp {
    pub fn setup() -> Self {
        Self {
            day: 0,
            phase: Phase::Setup,
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Setup => f.write_str("Setup"),
            Phase::Night => write!(f, "Day {} night", self.day),
            Phase::Day => write!(f, "Day {}", self.day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryEntry {
    pub stamp: Stamp,
    pub text: String,
}

impl fmt::Display for MemoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stamp, self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryLog {
    public: Vec<MemoryEntry>,
    private: Vec<MemoryEntry>,
}

impl MemoryLog {
    pub fn public(&self) -> &[MemoryEntry] {
        &self.public
    }

    pub fn private(&self) -> &[MemoryEntry] {
        &self.private
    }

    pub fn render_public(&self) -> String {
        render(&self.public)
    }

    pub fn render_private(&self) -> String {
        render(&self.private)
    }
}

fn render(entries: &[MemoryEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Memory logs for every seated player, stamped with the current phase.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    logs: HashMap<String, MemoryLog>,
    stamp: Stamp,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            logs: HashMap::new(),
            stamp: Stamp::setup(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str) {
        self.logs.entry(name.to_string()).or_default();
    }

    pub fn set_stamp(&mut self, day: u32, phase: Phase) {
        self.stamp = Stamp { day, phase };
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn log(&self, name: &str) -> Option<&MemoryLog> {
        self.logs.get(name)
    }

    pub fn add_public(&mut self, name: &str, text: impl Into<String>) {
        let entry = self.entry(text);
        if let Some(log) = self.logs.get_mut(name) {
            log.public.push(entry);
        }
    }

    pub fn add_private(&mut self, name: &str, text: impl Into<String>) {
        let entry = self.entry(text);
        if let Some(log) = self.logs.get_mut(name) {
            log.private.push(entry);
        }
    }

    /// Append to every registered player's public log.
    pub fn broadcast_public(&mut self, text: impl Into<String>) {
        let entry = self.entry(text);
        for log in self.logs.values_mut() {
            log.public.push(entry.clone());
        }
    }

    /// Append to every registered player's private log.
    pub fn broadcast_private(&mut self, text: impl Into<String>) {
        let entry = self.entry(text);
        for log in self.logs.values_mut() {
            log.private.push(entry.clone());
        }
    }

    fn entry(&self, text: impl Into<String>) -> MemoryEntry {
        MemoryEntry {
            stamp: self.stamp,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_the_current_stamp() {
        let mut memory = MemoryStore::new();
        memory.register("Ava");
        memory.add_private("Ava", "You are the Seer.");
        memory.set_stamp(2, Phase::Night);
        memory.add_private("Ava", "Ben is good.");

        let log = memory.log("Ava").expect("log");
        assert_eq!(
            log.render_private(),
            "[Setup] You are the Seer.\n[Day 2 night] Ben is good."
        );
    }

    #[test]
    fn broadcasts_reach_every_player_and_stay_separate() {
        let mut memory = MemoryStore::new();
        memory.register("Ava");
        memory.register("Ben");
        memory.set_stamp(1, Phase::Day);
        memory.broadcast_public("Dawn breaks.");
        memory.add_public("Ben", "Ava says: hello");

        assert_eq!(memory.log("Ava").expect("ava").public().len(), 1);
        assert_eq!(memory.log("Ben").expect("ben").public().len(), 2);
        assert!(memory.log("Ben").expect("ben").private().is_empty());
    }

    #[test]
    fn unknown_players_are_ignored() {
        let mut memory = MemoryStore::new();
        memory.add_public("Ghost", "boo");
        assert!(memory.log("Ghost").is_none());
    }
}
