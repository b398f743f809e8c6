//! Test-only helpers: a scripted oracle and table builders.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::{Result, anyhow};

use crate::core::state::MatchContext;
use crate::core::types::{Role, Rules};
use crate::io::oracle::{Oracle, OracleRequest};

/// Oracle that replays scripted replies per `(player, key)`.
///
/// Queued replies are consumed first, then the sticky `always` reply. Anything
/// unscripted gets an empty reply, which the gateway treats as abstention.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    queued: RefCell<HashMap<(String, String), VecDeque<String>>>,
    sticky: RefCell<HashMap<(String, String), String>>,
    fail: bool,
    requests: RefCell<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle whose every request fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Queue a one-shot reply.
    pub fn push(&self, player: &str, key: &str, reply: &str) -> &Self {
        self.queued
            .borrow_mut()
            .entry((player.to_string(), key.to_string()))
            .or_default()
            .push_back(reply.to_string());
        self
    }

    /// Reply with `reply` whenever nothing is queued.
    pub fn always(&self, player: &str, key: &str, reply: &str) -> &Self {
        self.sticky
            .borrow_mut()
            .insert((player.to_string(), key.to_string()), reply.to_string());
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.borrow().clone()
    }

    pub fn requests_for(&self, player: &str, key: &str) -> Vec<OracleRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.player == player && request.key == key)
            .cloned()
            .collect()
    }
}

impl Oracle for ScriptedOracle {
    fn generate(&self, request: &OracleRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        if self.fail {
            return Err(anyhow!("scripted oracle failure"));
        }
        let slot = (request.player.clone(), request.key.clone());
        if let Some(reply) = self
            .queued
            .borrow_mut()
            .get_mut(&slot)
            .and_then(VecDeque::pop_front)
        {
            return Ok(reply);
        }
        Ok(self.sticky.borrow().get(&slot).cloned().unwrap_or_default())
    }
}

/// A seeded context with `seats` added in order.
pub fn context_with(seats: &[(&str, Role)], rules: Rules) -> MatchContext {
    let mut ctx = MatchContext::new(rules, Some(7));
    for (name, role) in seats {
        ctx.add_player(name, *role).expect("seat player");
    }
    ctx
}

/// Two werewolves against a villager and one of each special role.
pub fn standard_seats() -> Vec<(&'static str, Role)> {
    vec![
        ("Ava", Role::Werewolf),
        ("Ben", Role::Werewolf),
        ("Cleo", Role::Villager),
        ("Dan", Role::Seer),
        ("Eve", Role::Witch),
        ("Finn", Role::Hunter),
        ("Gus", Role::Guard),
        ("Hana", Role::Idiot),
        ("Ivo", Role::Villager),
    ]
}
