//! Decision gateway: prompt rendering, oracle call and choice extraction.
//!
//! Every judgment in a match goes through [`DecisionGateway`]. Failures at any
//! step (missing template, oracle error, unparseable reply) degrade to
//! abstention so a single bad reply never aborts a match.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use minijinja::Value;
use tracing::{debug, instrument, warn};

use crate::core::state::MatchContext;
use crate::io::extract::extract_choice;
use crate::io::oracle::{Oracle, OracleRequest};
use crate::io::prompt::PromptStore;

/// Phase-specific template fields, added on top of the standard ones.
pub type Fields = Vec<(&'static str, Value)>;

pub struct DecisionGateway<'a, O: Oracle> {
    oracle: &'a O,
    prompts: &'a PromptStore,
}

impl<'a, O: Oracle> DecisionGateway<'a, O> {
    pub fn new(oracle: &'a O, prompts: &'a PromptStore) -> Self {
        Self { oracle, prompts }
    }

    /// Ask `player` to pick one of `candidates`. `None` means abstention.
    #[instrument(skip_all, fields(player = %player, key = %key, candidates = candidates.len()))]
    pub fn request_choice(
        &self,
        ctx: &MatchContext,
        player: &str,
        key: &str,
        candidates: &[String],
        fields: Fields,
    ) -> Option<String> {
        if candidates.is_empty() {
            debug!("no candidates; skipping request");
            return None;
        }
        let reply = self.ask(ctx, player, key, candidates, fields)?;
        let choice = extract_choice(&reply, candidates);
        match &choice {
            Some(choice) => debug!(choice = %choice, "decision extracted"),
            None => debug!(bytes = reply.len(), "reply named no candidate"),
        }
        choice
    }

    /// Ask `player` for free text (a speech or a reflection). Blank replies count as abstention.
    #[instrument(skip_all, fields(player = %player, key = %key))]
    pub fn request_text(
        &self,
        ctx: &MatchContext,
        player: &str,
        key: &str,
        fields: Fields,
    ) -> Option<String> {
        let reply = self.ask(ctx, player, key, &[], fields)?;
        let reply = reply.trim();
        if reply.is_empty() {
            debug!("blank reply");
            return None;
        }
        Some(reply.to_string())
    }

    /// Render the prompt `player` would receive for `key`. `Ok(None)` if no template exists.
    pub fn render_prompt(
        &self,
        ctx: &MatchContext,
        player: &str,
        key: &str,
        candidates: &[String],
        fields: Fields,
    ) -> Result<Option<String>> {
        let seat = ctx
            .roster
            .get(player)
            .with_context(|| format!("unknown player {player}"))?;
        let (public_memory, private_memory) = ctx
            .memory
            .log(player)
            .map(|log| (log.render_public(), log.render_private()))
            .unwrap_or_default();
        let peers = if seat.is_werewolf() {
            ctx.roster.werewolf_peers(player)
        } else {
            Vec::new()
        };

        let mut values: BTreeMap<&str, Value> = BTreeMap::new();
        values.insert("player_name", Value::from(player));
        values.insert("role", Value::from(seat.role().title()));
        values.insert("day", Value::from(ctx.day()));
        values.insert("public_memory", Value::from(public_memory));
        values.insert("private_memory", Value::from(private_memory));
        values.insert("living_players", Value::from(ctx.roster.living().join(", ")));
        values.insert("candidates", Value::from(candidates.join(", ")));
        values.insert("werewolf_peers", Value::from(peers));
        values.extend(fields);

        self.prompts.render(key, &values)
    }

    fn ask(
        &self,
        ctx: &MatchContext,
        player: &str,
        key: &str,
        candidates: &[String],
        fields: Fields,
    ) -> Option<String> {
        let prompt = match self.render_prompt(ctx, player, key, candidates, fields) {
            Ok(Some(prompt)) => prompt,
            Ok(None) => {
                debug!("no template for key; skipping");
                return None;
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "prompt rendering failed");
                return None;
            }
        };
        let role = ctx.roster.get(player)?.role();
        let request = OracleRequest {
            player: player.to_string(),
            key: key.to_string(),
            prompt,
            constraints: Some(format!("You are {player}, playing the {role}.")),
        };
        match self.oracle.generate(&request) {
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "oracle request failed; treating as abstention");
                None
            }
        }
    }
}
