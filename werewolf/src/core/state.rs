//! The mutable match context threaded through every phase.
//!
//! Only the phase currently holding `&mut MatchContext` may mutate the roster,
//! memory or event log.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::core::memory::MemoryStore;
use crate::core::roster::{Roster, SetupError};
use crate::core::types::{DeathCause, Faction, MatchEvent, Phase, Role, Rules};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    /// Current cycle, starting at 1.
    pub day: u32,
    pub game_over: bool,
    pub winner: Option<Faction>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            day: 1,
            game_over: false,
            winner: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchContext {
    pub roster: Roster,
    pub memory: MemoryStore,
    pub state: MatchState,
    pub events: Vec<MatchEvent>,
    pub rules: Rules,
    pub rng: StdRng,
}

impl MatchContext {
    pub fn new(rules: Rules, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            roster: Roster::new(),
            memory: MemoryStore::new(),
            state: MatchState::default(),
            events: Vec::new(),
            rules,
            rng,
        }
    }

    /// Seat a player and tell them their role.
    pub fn add_player(&mut self, name: &str, role: Role) -> Result<(), SetupError> {
        self.roster.add(name, role)?;
        let name = name.trim();
        self.memory.register(name);
        self.memory
            .add_private(name, format!("You are {name}. Your role is the {role}."));
        Ok(())
    }

    pub fn day(&self) -> u32 {
        self.state.day
    }

    pub fn enter_phase(&mut self, phase: Phase) {
        self.memory.set_stamp(self.state.day, phase);
    }

    pub fn record(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    pub fn broadcast_public(&mut self, text: impl Into<String>) {
        self.memory.broadcast_public(text);
    }

    pub fn broadcast_private(&mut self, text: impl Into<String>) {
        self.memory.broadcast_private(text);
    }

    /// Remove `name` from the living set. Every player privately learns of the death.
    ///
    /// Returns false if the player was already dead.
    pub fn kill(&mut self, name: &str, cause: DeathCause) -> bool {
        if !self.roster.mark_dead(name) {
            return false;
        }
        info!(day = self.state.day, player = name, cause = ?cause, "player died");
        self.broadcast_private(format!("{name} died ({}).", cause.describe()));
        self.memory.add_private(name, "You are now dead.");
        self.record(MatchEvent::Died {
            day: self.state.day,
            player: name.to_string(),
            cause,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_records_event_and_private_notes_once() {
        let mut ctx = MatchContext::new(Rules::default(), Some(1));
        ctx.add_player("Ava", Role::Werewolf).expect("add");
        ctx.add_player("Ben", Role::Villager).expect("add");

        assert!(ctx.kill("Ben", DeathCause::Lynch));
        assert!(!ctx.kill("Ben", DeathCause::Lynch));

        assert_eq!(ctx.events.len(), 1);
        let ava = ctx.memory.log("Ava").expect("ava");
        assert!(ava.render_private().contains("Ben died (executed by vote)."));
        assert!(!ctx.roster.is_alive("Ben"));
    }

    #[test]
    fn players_learn_their_role_at_setup() {
        let mut ctx = MatchContext::new(Rules::default(), Some(1));
        ctx.add_player(" Cleo ", Role::Witch).expect("add");
        let log = ctx.memory.log("Cleo").expect("cleo");
        assert_eq!(
            log.render_private(),
            "[Setup] You are Cleo. Your role is the Witch."
        );
    }
}
