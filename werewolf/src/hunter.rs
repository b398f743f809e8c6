//! Hunter retaliation and the death sequence shared by night and day.

use minijinja::Value;
use tracing::{debug, info};

use crate::core::roster::RoleState;
use crate::core::state::MatchContext;
use crate::core::types::{DeathCause, MatchEvent, Rules};
use crate::gateway::DecisionGateway;
use crate::io::oracle::Oracle;
use crate::io::prompt::keys;

/// A resolved death, plus the Hunter's shot if one was fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathOutcome {
    pub player: String,
    pub cause: DeathCause,
    pub shot: Option<String>,
}

impl DeathOutcome {
    /// Everyone who died, in the order they died.
    pub fn casualties(&self) -> Vec<String> {
        std::iter::once(self.player.clone())
            .chain(self.shot.clone())
            .collect()
    }
}

/// Whether dying from `cause` lets a Hunter shoot.
pub fn triggers_retaliation(rules: Rules, cause: DeathCause) -> bool {
    match cause {
        DeathCause::WerewolfAttack | DeathCause::Lynch => true,
        DeathCause::Poison => rules.hunter_shoots_when_poisoned,
        DeathCause::HunterShot => false,
    }
}

/// Let `hunter`, about to die from `cause`, pick one living player to take along.
///
/// Returns the target; the caller is responsible for killing it. The shot is
/// spent whatever the outcome. Non-Hunters, spent Hunters and non-triggering
/// causes return `None` without a request.
pub fn retaliate<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    hunter: &str,
    cause: DeathCause,
) -> Option<String> {
    if !triggers_retaliation(ctx.rules, cause) {
        return None;
    }
    let player = ctx.roster.get_mut(hunter)?;
    if !player.alive {
        return None;
    }
    match &mut player.state {
        RoleState::Hunter {
            can_shoot: true,
            dying,
        } => *dying = true,
        _ => return None,
    }

    let candidates = ctx.roster.living_except(hunter);
    let target = gateway.request_choice(
        ctx,
        hunter,
        keys::HUNTER_SHOOT_ACTION,
        &candidates,
        vec![("cause", Value::from(cause.describe()))],
    );

    if let Some(player) = ctx.roster.get_mut(hunter)
        && let RoleState::Hunter { can_shoot, .. } = &mut player.state
    {
        *can_shoot = false;
    }

    match &target {
        Some(target) => {
            info!(hunter, target = %target, "hunter fires");
            ctx.memory
                .add_private(hunter, format!("You shot {target} as you fell."));
            let day = ctx.day();
            ctx.record(MatchEvent::HunterShot {
                day,
                hunter: hunter.to_string(),
                target: target.clone(),
            });
        }
        None => {
            debug!(hunter, "hunter held fire");
            ctx.memory.add_private(hunter, "You did not shoot anyone.");
        }
    }
    target
}

/// Kill `name` from `cause`, running Hunter retaliation first.
///
/// Returns `None` if `name` was not alive.
pub fn resolve_death<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    name: &str,
    cause: DeathCause,
) -> Option<DeathOutcome> {
    if !ctx.roster.is_alive(name) {
        return None;
    }
    let shot = retaliate(ctx, gateway, name, cause);
    ctx.kill(name, cause);
    let shot = shot.filter(|target| ctx.kill(target, DeathCause::HunterShot));
    Some(DeathOutcome {
        player: name.to_string(),
        cause,
        shot,
    })
}
