//! Day resolution: speeches, voting, tally, lynch.

use tracing::{debug, info, instrument};

use crate::core::roster::RoleState;
use crate::core::state::MatchContext;
use crate::core::tally::{Ballot, TallyResult, tally};
use crate::core::types::{DeathCause, MatchEvent, Phase};
use crate::gateway::DecisionGateway;
use crate::hunter::resolve_death;
use crate::io::oracle::Oracle;
use crate::io::prompt::keys;

const REVEAL: &str = "reveal";
const DECLINE: &str = "decline";

/// What happened during one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub day: u32,
    /// `(speaker, speech)` in speaking order; silent players are absent.
    pub speeches: Vec<(String, String)>,
    pub ballots: Vec<Ballot>,
    pub tally: TallyResult,
    pub lynched: Option<String>,
    /// Idiot who survived the lynch by revealing.
    pub revealed: Option<String>,
    /// Player the lynched Hunter took along.
    pub shot: Option<String>,
}

#[instrument(skip_all, fields(day = ctx.day()))]
pub fn resolve_day<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
) -> DayReport {
    ctx.enter_phase(Phase::Day);
    let speeches = speak(ctx, gateway);
    let ballots = vote(ctx, gateway);
    let result = tally(&ballots);
    debug!(result = ?result, "votes tallied");

    let mut report = DayReport {
        day: ctx.day(),
        speeches,
        ballots,
        tally: result.clone(),
        lynched: None,
        revealed: None,
        shot: None,
    };

    match result {
        TallyResult::Lynch { target, .. } => lynch(ctx, gateway, &target, &mut report),
        TallyResult::Tie { targets, .. } => no_lynch(ctx, targets),
        TallyResult::NoVotes => no_lynch(ctx, Vec::new()),
    }
    report
}

/// Every living player speaks once, in seating order. Later speakers hear earlier ones.
fn speak<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
) -> Vec<(String, String)> {
    let mut speeches = Vec::new();
    for speaker in ctx.roster.living() {
        let Some(speech) = gateway.request_text(ctx, &speaker, keys::PLAYER_SPEAK, Vec::new())
        else {
            continue;
        };
        for listener in ctx.roster.living_except(&speaker) {
            ctx.memory
                .add_public(&listener, format!("{speaker} says: {speech}"));
        }
        ctx.memory
            .add_private(&speaker, format!("You said: {speech}"));
        speeches.push((speaker, speech));
    }
    speeches
}

fn vote<O: Oracle>(ctx: &mut MatchContext, gateway: &DecisionGateway<'_, O>) -> Vec<Ballot> {
    let voters: Vec<String> = ctx
        .roster
        .players()
        .iter()
        .filter(|player| player.can_vote())
        .map(|player| player.name.clone())
        .collect();

    let mut ballots = Vec::new();
    for voter in voters {
        let candidates = ctx.roster.living_except(&voter);
        let Some(target) =
            gateway.request_choice(ctx, &voter, keys::PLAYER_VOTE, &candidates, Vec::new())
        else {
            debug!(voter = %voter, "abstained");
            continue;
        };
        let day = ctx.day();
        ctx.record(MatchEvent::Voted {
            day,
            voter: voter.clone(),
            target: target.clone(),
        });
        ballots.push(Ballot { voter, target });
    }

    let summary = if ballots.is_empty() {
        "Nobody voted.".to_string()
    } else {
        let lines: Vec<String> = ballots
            .iter()
            .map(|ballot| format!("{} -> {}", ballot.voter, ballot.target))
            .collect();
        format!("Votes: {}", lines.join(", "))
    };
    ctx.broadcast_public(summary);
    ballots
}

fn lynch<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    target: &str,
    report: &mut DayReport,
) {
    let hidden_idiot = ctx
        .roster
        .get(target)
        .is_some_and(|player| matches!(player.state, RoleState::Idiot { revealed: false }));
    if hidden_idiot {
        let options = vec![REVEAL.to_string(), DECLINE.to_string()];
        let choice =
            gateway.request_choice(ctx, target, keys::IDIOT_REVEAL_ACTION, &options, Vec::new());
        if choice.as_deref() == Some(REVEAL) {
            if let Some(player) = ctx.roster.get_mut(target) {
                player.state = RoleState::Idiot { revealed: true };
            }
            info!(player = target, "idiot revealed");
            let day = ctx.day();
            ctx.record(MatchEvent::IdiotRevealed {
                day,
                player: target.to_string(),
            });
            ctx.broadcast_public(format!(
                "{target} is the Idiot and is spared, but can no longer vote."
            ));
            report.revealed = Some(target.to_string());
            return;
        }
    }

    let Some(outcome) = resolve_death(ctx, gateway, target, DeathCause::Lynch) else {
        return;
    };
    info!(player = target, "lynched");
    ctx.broadcast_public(format!("{target} was executed by vote."));
    if let Some(shot) = &outcome.shot {
        ctx.broadcast_public(format!(
            "The Hunter {target} shot {shot} before dying."
        ));
    }
    report.lynched = Some(outcome.player);
    report.shot = outcome.shot;
}

fn no_lynch(ctx: &mut MatchContext, tied: Vec<String>) {
    info!(tied = ?tied, "no lynch");
    let day = ctx.day();
    ctx.record(MatchEvent::NoLynch { day, tied });
    ctx.broadcast_public("The vote was inconclusive; no one was executed.");
}
