//! Match controller: setup, the night/day loop and final results.

use tracing::{info, instrument};

use crate::core::memory::MemoryStore;
use crate::core::roster::{Roster, SetupError};
use crate::core::state::{MatchContext, MatchState};
use crate::core::types::{Faction, MatchEvent, Role, Rules};
use crate::core::win;
use crate::day::{DayReport, resolve_day};
use crate::gateway::DecisionGateway;
use crate::io::config::MatchConfig;
use crate::io::match_log::MatchRecord;
use crate::io::oracle::Oracle;
use crate::io::prompt::PromptStore;
use crate::night::{NightReport, resolve_night};

/// Knobs fixed before a match starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSettings {
    /// Seed for the werewolf decision-maker draw; `None` uses entropy.
    pub seed: Option<u64>,
    /// Stop after this many cycles even without a winner.
    pub max_days: Option<u32>,
    pub rules: Rules,
}

impl MatchSettings {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            seed: config.seed,
            max_days: config.max_days,
            rules: config.rules(),
        }
    }
}

/// Reason why a match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStop {
    Won(Faction),
    /// `max_days` cycles completed with no winner.
    DayLimitReached,
}

/// Summary of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Cycle the match ended in.
    pub days: u32,
    pub stop: MatchStop,
}

/// Progress notification passed to the `run_with` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseReport {
    Night(NightReport),
    Day(DayReport),
    GameOver { day: u32, winner: Faction },
}

pub struct Match<O: Oracle> {
    ctx: MatchContext,
    oracle: O,
    prompts: PromptStore,
    settings: MatchSettings,
    started: bool,
    outcome: Option<MatchOutcome>,
}

impl<O: Oracle> Match<O> {
    pub fn new(oracle: O, prompts: PromptStore, settings: MatchSettings) -> Self {
        Self {
            ctx: MatchContext::new(settings.rules, settings.seed),
            oracle,
            prompts,
            settings,
            started: false,
            outcome: None,
        }
    }

    /// Build a match and seat every player listed in `config`.
    pub fn from_config(
        config: &MatchConfig,
        oracle: O,
        prompts: PromptStore,
    ) -> Result<Self, SetupError> {
        let mut game = Self::new(oracle, prompts, MatchSettings::from_config(config));
        for seat in &config.players {
            game.add_player(&seat.name, &seat.role)?;
        }
        Ok(game)
    }

    /// Seat a player by role name (case-insensitive).
    pub fn add_player(&mut self, name: &str, role: &str) -> Result<(), SetupError> {
        let role: Role = role.parse()?;
        self.add_role(name, role)
    }

    pub fn add_role(&mut self, name: &str, role: Role) -> Result<(), SetupError> {
        if self.started {
            return Err(SetupError::MatchStarted(name.trim().to_string()));
        }
        self.ctx.add_player(name, role)
    }

    /// Run the match to completion.
    pub fn start_match(&mut self) -> Result<MatchOutcome, SetupError> {
        self.run_with(|_| {})
    }

    /// Run the match to completion, reporting each phase to `on_phase`.
    ///
    /// Fails only on setup problems; decision failures inside the match are abstentions.
    /// Calling this again after the match finished returns the same outcome.
    #[instrument(skip_all, fields(players = self.ctx.roster.len(), seed = ?self.settings.seed))]
    pub fn run_with<F: FnMut(&PhaseReport)>(
        &mut self,
        mut on_phase: F,
    ) -> Result<MatchOutcome, SetupError> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        self.ctx.roster.validate_for_start()?;
        self.started = true;
        info!("match started");

        let gateway = DecisionGateway::new(&self.oracle, &self.prompts);
        let ctx = &mut self.ctx;
        ctx.broadcast_public("The game begins. Night falls; everyone close your eyes.");

        let stop = loop {
            let night = resolve_night(ctx, &gateway);
            on_phase(&PhaseReport::Night(night));
            if let Some(winner) = finish_if_won(ctx) {
                on_phase(&PhaseReport::GameOver {
                    day: ctx.day(),
                    winner,
                });
                break MatchStop::Won(winner);
            }

            let day = resolve_day(ctx, &gateway);
            on_phase(&PhaseReport::Day(day));
            if let Some(winner) = finish_if_won(ctx) {
                on_phase(&PhaseReport::GameOver {
                    day: ctx.day(),
                    winner,
                });
                break MatchStop::Won(winner);
            }

            if self
                .settings
                .max_days
                .is_some_and(|max_days| ctx.day() >= max_days)
            {
                info!(day = ctx.day(), "day limit reached");
                break MatchStop::DayLimitReached;
            }
            ctx.state.day += 1;
        };

        let outcome = MatchOutcome {
            days: ctx.day(),
            stop,
        };
        info!(days = outcome.days, stop = ?outcome.stop, "match finished");
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    pub fn winning_faction(&self) -> Option<Faction> {
        self.ctx.state.winner
    }

    pub fn final_roster(&self) -> &Roster {
        &self.ctx.roster
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.ctx.events
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.ctx.memory
    }

    pub fn state(&self) -> &MatchState {
        &self.ctx.state
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Serializable record of the match so far.
    pub fn record(&self) -> MatchRecord {
        MatchRecord::new(
            self.settings.seed,
            self.ctx.day(),
            self.ctx.state.winner,
            &self.ctx.roster,
            &self.ctx.events,
        )
    }
}

/// Evaluate the win condition; on a win, close the match and announce it.
fn finish_if_won(ctx: &mut MatchContext) -> Option<Faction> {
    let winner = win::evaluate(&ctx.roster)?;
    ctx.state.game_over = true;
    ctx.state.winner = Some(winner);
    let day = ctx.day();
    ctx.record(MatchEvent::GameOver { day, winner });
    ctx.broadcast_public(format!("The game is over. The {winner} faction wins."));
    info!(day, winner = %winner, "game over");
    Some(winner)
}
