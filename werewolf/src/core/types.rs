//! Shared deterministic types for the match engine.
//!
//! These types define stable contracts between the roster, the resolvers and
//! the match record. They carry no I/O and serialize deterministically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::roster::SetupError;

/// The fixed, closed role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Villager,
    Werewolf,
    Witch,
    Seer,
    Guard,
    Hunter,
    Idiot,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Villager,
        Role::Werewolf,
        Role::Witch,
        Role::Seer,
        Role::Guard,
        Role::Hunter,
        Role::Idiot,
    ];

    /// Lowercase identifier used in config files and prompt keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Villager => "villager",
            Role::Werewolf => "werewolf",
            Role::Witch => "witch",
            Role::Seer => "seer",
            Role::Guard => "guard",
            Role::Hunter => "hunter",
            Role::Idiot => "idiot",
        }
    }

    /// Human-facing role title used in prompts and announcements.
    pub fn title(self) -> &'static str {
        match self {
            Role::Villager => "Villager",
            Role::Werewolf => "Werewolf",
            Role::Witch => "Witch",
            Role::Seer => "Seer",
            Role::Guard => "Guard",
            Role::Hunter => "Hunter",
            Role::Idiot => "Idiot",
        }
    }

    pub fn faction(self) -> Faction {
        match self {
            Role::Werewolf => Faction::Werewolf,
            _ => Faction::Good,
        }
    }

    pub fn is_werewolf(self) -> bool {
        self.faction() == Faction::Werewolf
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Role {
    type Err = SetupError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| SetupError::UnknownRole(raw.trim().to_string()))
    }
}

/// Side a role plays for; decides win-condition membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Good,
    Werewolf,
}

impl Faction {
    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Good => "good",
            Faction::Werewolf => "werewolf",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the match a memory entry or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Night,
    Day,
}

/// Why a player left the living set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    WerewolfAttack,
    Poison,
    Lynch,
    HunterShot,
}

impl DeathCause {
    pub fn describe(self) -> &'static str {
        match self {
            DeathCause::WerewolfAttack => "killed by the werewolves",
            DeathCause::Poison => "poisoned",
            DeathCause::Lynch => "executed by vote",
            DeathCause::HunterShot => "shot by the hunter",
        }
    }
}

/// Table rules that vary between common house conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rules {
    /// Whether a Hunter killed by the Witch's poison may still retaliate.
    pub hunter_shoots_when_poisoned: bool,
}

/// Append-only record of every state-changing outcome in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Protected {
        day: u32,
        guard: String,
        target: String,
    },
    Attacked {
        day: u32,
        werewolf: String,
        target: String,
    },
    AttackBlocked {
        day: u32,
        target: String,
    },
    Checked {
        day: u32,
        seer: String,
        target: String,
        faction: Faction,
    },
    Saved {
        day: u32,
        witch: String,
        target: String,
    },
    Poisoned {
        day: u32,
        witch: String,
        target: String,
    },
    HunterShot {
        day: u32,
        hunter: String,
        target: String,
    },
    Died {
        day: u32,
        player: String,
        cause: DeathCause,
    },
    Voted {
        day: u32,
        voter: String,
        target: String,
    },
    NoLynch {
        day: u32,
        tied: Vec<String>,
    },
    IdiotRevealed {
        day: u32,
        player: String,
    },
    GameOver {
        day: u32,
        winner: Faction,
    },
}
