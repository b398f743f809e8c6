//! Player identity, role assignment and living status.

use serde::Serialize;
use thiserror::Error;

use crate::core::types::{Faction, Role};

/// Fatal setup problems, surfaced before a match starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error(
        "unknown role '{0}' (expected one of: villager, werewolf, witch, seer, guard, hunter, idiot)"
    )]
    UnknownRole(String),
    #[error("duplicate player name '{0}'")]
    DuplicatePlayer(String),
    #[error("player name must not be empty")]
    EmptyName,
    #[error("cannot add '{0}' after the match has started")]
    MatchStarted(String),
    #[error("match has no players")]
    NoPlayers,
    #[error("match has no werewolves")]
    NoWerewolves,
}

/// Role tag plus the mutable state that role carries through the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleState {
    Villager,
    Werewolf,
    Witch {
        save_potions: u8,
        poison_potions: u8,
    },
    Seer {
        /// Checked players with the faction revealed, in check order.
        checked: Vec<(String, Faction)>,
    },
    Guard {
        /// The previous night's choice; may not be protected again tonight.
        last_protected: Option<String>,
    },
    Hunter {
        can_shoot: bool,
        dying: bool,
    },
    Idiot {
        revealed: bool,
    },
}

impl RoleState {
    pub fn new(role: Role) -> Self {
        match role {
            Role::Villager => RoleState::Villager,
            Role::Werewolf => RoleState::Werewolf,
            Role::Witch => RoleState::Witch {
                save_potions: 1,
                poison_potions: 1,
            },
            Role::Seer => RoleState::Seer {
                checked: Vec::new(),
            },
            Role::Guard => RoleState::Guard {
                last_protected: None,
            },
            Role::Hunter => RoleState::Hunter {
                can_shoot: true,
                dying: false,
            },
            Role::Idiot => RoleState::Idiot { revealed: false },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleState::Villager => Role::Villager,
            RoleState::Werewolf => Role::Werewolf,
            RoleState::Witch { .. } => Role::Witch,
            RoleState::Seer { .. } => Role::Seer,
            RoleState::Guard { .. } => Role::Guard,
            RoleState::Hunter { .. } => Role::Hunter,
            RoleState::Idiot { .. } => Role::Idiot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub name: String,
    pub alive: bool,
    pub state: RoleState,
}

impl Player {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            alive: true,
            state: RoleState::new(role),
        }
    }

    /// The role is fixed by the state variant, so it never changes after assignment.
    pub fn role(&self) -> Role {
        self.state.role()
    }

    pub fn faction(&self) -> Faction {
        self.role().faction()
    }

    pub fn is_werewolf(&self) -> bool {
        self.role().is_werewolf()
    }

    /// Living players vote, except an Idiot who has revealed.
    pub fn can_vote(&self) -> bool {
        self.alive && !matches!(self.state, RoleState::Idiot { revealed: true })
    }
}

/// Insertion-ordered player table with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, role: Role) -> Result<(), SetupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SetupError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(SetupError::DuplicatePlayer(name.to_string()));
        }
        self.players.push(Player::new(name, role));
        Ok(())
    }

    /// Check the table is playable: at least one player and one werewolf.
    pub fn validate_for_start(&self) -> Result<(), SetupError> {
        if self.players.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if !self.players.iter().any(Player::is_werewolf) {
            return Err(SetupError::NoWerewolves);
        }
        Ok(())
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.name == name)
    }

    pub fn is_alive(&self, name: &str) -> bool {
        self.get(name).is_some_and(|player| player.alive)
    }

    /// Living player names in seating order.
    pub fn living(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|player| player.alive)
            .map(|player| player.name.clone())
            .collect()
    }

    /// Living player names in seating order, excluding `name`.
    pub fn living_except(&self, name: &str) -> Vec<String> {
        self.players
            .iter()
            .filter(|player| player.alive && player.name != name)
            .map(|player| player.name.clone())
            .collect()
    }

    /// First living holder of `role` in seating order.
    pub fn first_living(&self, role: Role) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.alive && player.role() == role)
    }

    pub fn living_werewolves(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|player| player.alive && player.is_werewolf())
            .map(|player| player.name.clone())
            .collect()
    }

    /// Every other werewolf at the table, recomputed on each call so setup order never matters.
    pub fn werewolf_peers(&self, name: &str) -> Vec<String> {
        self.players
            .iter()
            .filter(|player| player.is_werewolf() && player.name != name)
            .map(|player| player.name.clone())
            .collect()
    }

    /// Count living players per faction as `(werewolves, others)`.
    pub fn living_counts(&self) -> (usize, usize) {
        self.players
            .iter()
            .filter(|player| player.alive)
            .fold((0, 0), |(wolves, others), player| {
                if player.is_werewolf() {
                    (wolves + 1, others)
                } else {
                    (wolves, others + 1)
                }
            })
    }

    /// Mark `name` dead. Returns false if the player is unknown or already dead.
    pub fn mark_dead(&mut self, name: &str) -> bool {
        match self.get_mut(name) {
            Some(player) if player.alive => {
                player.alive = false;
                true
            }
            _ => false,
        }
    }
}
