//! Night resolution.
//!
//! One pass per night, in a fixed order:
//! guard, werewolf, seer, witch, bystander reflection, deaths, dawn announcement.
//! Each step sees the results of the steps before it and nothing after.

use minijinja::Value;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use crate::core::roster::RoleState;
use crate::core::state::MatchContext;
use crate::core::types::{DeathCause, Faction, MatchEvent, Phase, Role};
use crate::gateway::DecisionGateway;
use crate::hunter::resolve_death;
use crate::io::oracle::Oracle;
use crate::io::prompt::{keys, reflection_key};

const SAVE: &str = "save";
const SKIP: &str = "skip";

/// What happened during one night.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightReport {
    pub day: u32,
    /// Player the Guard protected.
    pub protected: Option<String>,
    /// Werewolf who chose tonight's target.
    pub decider: Option<String>,
    /// Werewolf target, even if the attack was blocked or the victim saved.
    pub attacked: Option<String>,
    /// Werewolf victim after guard and witch.
    pub victim: Option<String>,
    pub saved: bool,
    pub poisoned: Option<String>,
    /// Everyone who died tonight in order, Hunter shots included.
    pub deaths: Vec<String>,
}

#[instrument(skip_all, fields(day = ctx.day()))]
pub fn resolve_night<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
) -> NightReport {
    ctx.enter_phase(Phase::Night);
    let mut report = NightReport {
        day: ctx.day(),
        ..NightReport::default()
    };

    let mut acting: Vec<String> = [Role::Guard, Role::Seer, Role::Witch]
        .into_iter()
        .filter_map(|role| ctx.roster.first_living(role).map(|player| player.name.clone()))
        .collect();

    report.protected = guard_turn(ctx, gateway);
    werewolf_turn(ctx, gateway, &mut report);
    acting.extend(report.decider.clone());
    seer_turn(ctx, gateway);
    witch_turn(ctx, gateway, &mut report);
    reflect(ctx, gateway, &acting);
    resolve_deaths(ctx, gateway, &mut report);

    let dawn = match &report.victim {
        Some(victim) => format!("Dawn breaks. {victim} was killed last night."),
        None => "Dawn breaks. It was a peaceful night; nobody was killed.".to_string(),
    };
    ctx.broadcast_public(dawn);
    info!(
        victim = ?report.victim,
        poisoned = ?report.poisoned,
        deaths = report.deaths.len(),
        "night resolved"
    );
    report
}

fn guard_turn<O: Oracle>(ctx: &mut MatchContext, gateway: &DecisionGateway<'_, O>) -> Option<String> {
    let guard = ctx.roster.first_living(Role::Guard)?;
    let name = guard.name.clone();
    let last = match &guard.state {
        RoleState::Guard { last_protected } => last_protected.clone(),
        _ => None,
    };
    let candidates: Vec<String> = ctx
        .roster
        .living()
        .into_iter()
        .filter(|candidate| last.as_ref() != Some(candidate))
        .collect();

    let choice = gateway.request_choice(
        ctx,
        &name,
        keys::GUARD_NIGHT_ACTION,
        &candidates,
        vec![(
            "last_protected",
            Value::from(last.as_deref().unwrap_or("nobody")),
        )],
    );

    if let Some(player) = ctx.roster.get_mut(&name)
        && let RoleState::Guard { last_protected } = &mut player.state
    {
        *last_protected = choice.clone();
    }
    match &choice {
        Some(target) => {
            debug!(guard = %name, target = %target, "guard protects");
            ctx.memory
                .add_private(&name, format!("You protected {target} tonight."));
            let day = ctx.day();
            ctx.record(MatchEvent::Protected {
                day,
                guard: name.clone(),
                target: target.clone(),
            });
        }
        None => ctx
            .memory
            .add_private(&name, "You protected nobody tonight."),
    }
    choice
}

fn werewolf_turn<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    report: &mut NightReport,
) {
    let wolves = ctx.roster.living_werewolves();
    let Some(decider) = wolves.choose(&mut ctx.rng).cloned() else {
        return;
    };
    debug!(decider = %decider, "werewolf decision-maker chosen");
    report.decider = Some(decider.clone());

    let candidates = ctx.roster.living();
    let Some(target) = gateway.request_choice(
        ctx,
        &decider,
        keys::WEREWOLF_NIGHT_ACTION,
        &candidates,
        Vec::new(),
    ) else {
        for wolf in &wolves {
            ctx.memory
                .add_private(wolf, format!("The pack ({decider}) attacked nobody tonight."));
        }
        return;
    };

    for wolf in &wolves {
        ctx.memory
            .add_private(wolf, format!("The pack ({decider}) attacked {target} tonight."));
    }
    let day = ctx.day();
    ctx.record(MatchEvent::Attacked {
        day,
        werewolf: decider,
        target: target.clone(),
    });
    report.attacked = Some(target.clone());

    if report.protected.as_ref() == Some(&target) {
        info!(target = %target, "attack blocked by the guard");
        ctx.record(MatchEvent::AttackBlocked { day, target });
    } else {
        report.victim = Some(target);
    }
}

fn seer_turn<O: Oracle>(ctx: &mut MatchContext, gateway: &DecisionGateway<'_, O>) {
    let Some(seer) = ctx.roster.first_living(Role::Seer) else {
        return;
    };
    let name = seer.name.clone();
    let checked = match &seer.state {
        RoleState::Seer { checked } => checked.clone(),
        _ => Vec::new(),
    };
    let candidates: Vec<String> = ctx
        .roster
        .living_except(&name)
        .into_iter()
        .filter(|candidate| !checked.iter().any(|(seen, _)| seen == candidate))
        .collect();
    let history: Vec<String> = checked
        .iter()
        .map(|(seen, faction)| format!("{seen}: {}", faction_label(*faction)))
        .collect();

    let Some(target) = gateway.request_choice(
        ctx,
        &name,
        keys::SEER_NIGHT_ACTION,
        &candidates,
        vec![("checked", Value::from(history))],
    ) else {
        return;
    };
    let Some(faction) = ctx.roster.get(&target).map(|player| player.faction()) else {
        return;
    };

    if let Some(player) = ctx.roster.get_mut(&name)
        && let RoleState::Seer { checked } = &mut player.state
    {
        checked.push((target.clone(), faction));
    }
    ctx.memory.add_private(
        &name,
        format!("You checked {target}: {}.", faction_label(faction)),
    );
    let day = ctx.day();
    ctx.record(MatchEvent::Checked {
        day,
        seer: name,
        target,
        faction,
    });
}

fn faction_label(faction: Faction) -> &'static str {
    match faction {
        Faction::Good => "good",
        Faction::Werewolf => "a werewolf",
    }
}

fn witch_turn<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    report: &mut NightReport,
) {
    let Some(witch) = ctx.roster.first_living(Role::Witch) else {
        return;
    };
    let name = witch.name.clone();
    let &RoleState::Witch {
        mut save_potions,
        mut poison_potions,
    } = &witch.state
    else {
        return;
    };
    let attacked = report.victim.clone();
    if let Some(victim) = &attacked {
        ctx.memory
            .add_private(&name, format!("The werewolves attacked {victim} tonight."));
    }

    if let Some(victim) = &attacked
        && save_potions > 0
    {
        let options = vec![SAVE.to_string(), SKIP.to_string()];
        let choice = gateway.request_choice(
            ctx,
            &name,
            keys::WITCH_SAVE_ACTION,
            &options,
            vec![
                ("victim", Value::from(victim.as_str())),
                ("save_potions", Value::from(save_potions)),
                ("poison_potions", Value::from(poison_potions)),
            ],
        );
        if choice.as_deref() == Some(SAVE) {
            save_potions -= 1;
            report.victim = None;
            report.saved = true;
            info!(witch = %name, target = %victim, "witch saves");
            ctx.memory
                .add_private(&name, format!("You used your save potion on {victim}."));
            let day = ctx.day();
            ctx.record(MatchEvent::Saved {
                day,
                witch: name.clone(),
                target: victim.clone(),
            });
        }
    }

    if poison_potions > 0 {
        let mut options = ctx.roster.living_except(&name);
        options.push(SKIP.to_string());
        let choice = gateway.request_choice(
            ctx,
            &name,
            keys::WITCH_POISON_ACTION,
            &options,
            vec![
                ("victim", Value::from_serialize(&attacked)),
                ("saved", Value::from(report.saved)),
                ("save_potions", Value::from(save_potions)),
                ("poison_potions", Value::from(poison_potions)),
            ],
        );
        if let Some(target) = choice.filter(|choice| choice != SKIP) {
            poison_potions -= 1;
            info!(witch = %name, target = %target, "witch poisons");
            ctx.memory
                .add_private(&name, format!("You poisoned {target}."));
            let day = ctx.day();
            ctx.record(MatchEvent::Poisoned {
                day,
                witch: name.clone(),
                target: target.clone(),
            });
            report.poisoned = Some(target);
        }
    }

    if let Some(player) = ctx.roster.get_mut(&name)
        && let RoleState::Witch {
            save_potions: saves,
            poison_potions: poisons,
        } = &mut player.state
    {
        *saves = save_potions;
        *poisons = poison_potions;
    }
}

/// Everyone who did not act tonight thinks aloud; the result lands in private memory only.
///
/// Roles without a `<role>_night_reflection` template are skipped by the gateway.
fn reflect<O: Oracle>(ctx: &mut MatchContext, gateway: &DecisionGateway<'_, O>, acting: &[String]) {
    let bystanders: Vec<(String, Role)> = ctx
        .roster
        .players()
        .iter()
        .filter(|player| player.alive && !acting.contains(&player.name))
        .map(|player| (player.name.clone(), player.role()))
        .collect();

    for (name, role) in bystanders {
        if let Some(thoughts) = gateway.request_text(ctx, &name, &reflection_key(role), Vec::new())
        {
            ctx.memory
                .add_private(&name, format!("Your thoughts tonight: {thoughts}"));
        }
    }
}

/// Werewolf victim first, then the poison victim if still alive.
fn resolve_deaths<O: Oracle>(
    ctx: &mut MatchContext,
    gateway: &DecisionGateway<'_, O>,
    report: &mut NightReport,
) {
    let pending = [
        (report.victim.clone(), DeathCause::WerewolfAttack),
        (report.poisoned.clone(), DeathCause::Poison),
    ];
    for (name, cause) in pending {
        let Some(name) = name else {
            continue;
        };
        if let Some(outcome) = resolve_death(ctx, gateway, &name, cause) {
            report.deaths.extend(outcome.casualties());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rules;
    use crate::io::prompt::PromptStore;
    use crate::test_support::{ScriptedOracle, context_with, standard_seats};

    fn lone_wolf_table() -> Vec<(&'static str, Role)> {
        vec![
            ("Ava", Role::Werewolf),
            ("Cleo", Role::Villager),
            ("Dan", Role::Seer),
            ("Eve", Role::Witch),
            ("Finn", Role::Hunter),
            ("Gus", Role::Guard),
        ]
    }

    #[test]
    fn unprotected_target_dies_and_is_announced() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Ava", keys::WEREWOLF_NIGHT_ACTION, "Cleo");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.decider.as_deref(), Some("Ava"));
        assert_eq!(report.victim.as_deref(), Some("Cleo"));
        assert_eq!(report.deaths, vec!["Cleo"]);
        assert!(!ctx.roster.is_alive("Cleo"));

        let dan = ctx.memory.log("Dan").expect("dan");
        assert!(
            dan.render_public()
                .contains("[Day 1 night] Dawn breaks. Cleo was killed last night.")
        );
        assert!(dan.render_private().contains("Cleo died (killed by the werewolves)."));
    }

    #[test]
    fn guarded_target_survives() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Gus", keys::GUARD_NIGHT_ACTION, "Cleo");
        oracle.push("Ava", keys::WEREWOLF_NIGHT_ACTION, "Cleo");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.protected.as_deref(), Some("Cleo"));
        assert_eq!(report.attacked.as_deref(), Some("Cleo"));
        assert_eq!(report.victim, None);
        assert!(report.deaths.is_empty());
        assert!(ctx.events.contains(&MatchEvent::AttackBlocked {
            day: 1,
            target: "Cleo".to_string()
        }));
        let cleo = ctx.memory.log("Cleo").expect("cleo");
        assert!(cleo.render_public().contains("peaceful night"));
    }

    #[test]
    fn guard_cannot_repeat_last_nights_choice() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.always("Gus", keys::GUARD_NIGHT_ACTION, "Cleo");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let first = resolve_night(&mut ctx, &gateway);
        assert_eq!(first.protected.as_deref(), Some("Cleo"));
        ctx.state.day += 1;
        let second = resolve_night(&mut ctx, &gateway);
        assert_eq!(second.protected, None, "Cleo is not a candidate tonight");

        let requests = oracle.requests_for("Gus", keys::GUARD_NIGHT_ACTION);
        assert!(!requests[1].prompt.contains("protect tonight: Ava, Cleo"));
        assert!(requests[1].prompt.contains("Protected last night: Cleo"));

        ctx.state.day += 1;
        let third = resolve_night(&mut ctx, &gateway);
        assert_eq!(third.protected.as_deref(), Some("Cleo"), "abstaining resets the rule");
    }

    #[test]
    fn seer_learns_factions_and_never_rechecks() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Dan", keys::SEER_NIGHT_ACTION, "Ava");
        oracle.push("Dan", keys::SEER_NIGHT_ACTION, "Ava");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        resolve_night(&mut ctx, &gateway);
        let dan = ctx.roster.get("Dan").expect("dan");
        assert_eq!(
            dan.state,
            RoleState::Seer {
                checked: vec![("Ava".to_string(), Faction::Werewolf)]
            }
        );
        assert!(
            ctx.memory
                .log("Dan")
                .expect("dan")
                .render_private()
                .contains("You checked Ava: a werewolf.")
        );

        ctx.state.day += 1;
        resolve_night(&mut ctx, &gateway);
        let requests = oracle.requests_for("Dan", keys::SEER_NIGHT_ACTION);
        assert!(requests[1].prompt.contains("- Ava: a werewolf"));
        assert!(
            requests[1]
                .prompt
                .contains("Players you have not checked: Cleo, Eve, Finn, Gus")
        );
        let checks = ctx
            .events
            .iter()
            .filter(|event| matches!(event, MatchEvent::Checked { .. }))
            .count();
        assert_eq!(checks, 1);
    }

    #[test]
    fn witch_save_is_single_use() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.always("Ava", keys::WEREWOLF_NIGHT_ACTION, "Cleo");
        oracle.always("Eve", keys::WITCH_SAVE_ACTION, "save");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let first = resolve_night(&mut ctx, &gateway);
        assert!(first.saved);
        assert_eq!(first.attacked.as_deref(), Some("Cleo"));
        assert!(ctx.roster.is_alive("Cleo"));

        ctx.state.day += 1;
        let second = resolve_night(&mut ctx, &gateway);
        assert!(!second.saved);
        assert_eq!(second.deaths, vec!["Cleo"]);
        assert_eq!(
            oracle.requests_for("Eve", keys::WITCH_SAVE_ACTION).len(),
            1,
            "no save request once the potion is gone"
        );
    }

    #[test]
    fn witch_poison_kills_and_is_not_announced() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Eve", keys::WITCH_POISON_ACTION, "Ava");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.poisoned.as_deref(), Some("Ava"));
        assert_eq!(report.deaths, vec!["Ava"]);
        assert!(!ctx.roster.is_alive("Ava"));
        assert_eq!(
            ctx.roster.get("Eve").expect("eve").state,
            RoleState::Witch {
                save_potions: 1,
                poison_potions: 0
            }
        );

        let cleo = ctx.memory.log("Cleo").expect("cleo");
        assert!(!cleo.render_public().contains("Ava"));
        assert!(cleo.render_private().contains("Ava died (poisoned)."));

        let request = oracle
            .requests_for("Eve", keys::WITCH_POISON_ACTION)
            .pop()
            .expect("request");
        assert!(request.prompt.contains("Options: Ava, Cleo, Dan, Finn, Gus, skip"));
    }

    #[test]
    fn witch_poison_is_single_use() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.always("Eve", keys::WITCH_POISON_ACTION, "Cleo");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let first = resolve_night(&mut ctx, &gateway);
        assert_eq!(first.poisoned.as_deref(), Some("Cleo"));

        ctx.state.day += 1;
        let second = resolve_night(&mut ctx, &gateway);
        assert_eq!(second.poisoned, None);
        assert!(second.deaths.is_empty());
        assert_eq!(
            oracle.requests_for("Eve", keys::WITCH_POISON_ACTION).len(),
            1,
            "no poison request once the potion is gone"
        );
        assert!(matches!(
            ctx.roster.get("Eve").expect("eve").state,
            RoleState::Witch {
                poison_potions: 0,
                ..
            }
        ));
    }

    #[test]
    fn poisoning_the_werewolf_victim_kills_once() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Ava", keys::WEREWOLF_NIGHT_ACTION, "Cleo");
        oracle.push("Eve", keys::WITCH_SAVE_ACTION, "skip");
        oracle.push("Eve", keys::WITCH_POISON_ACTION, "Cleo");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.victim.as_deref(), Some("Cleo"));
        assert_eq!(report.poisoned.as_deref(), Some("Cleo"));
        assert_eq!(report.deaths, vec!["Cleo"]);
        let deaths: Vec<&MatchEvent> = ctx
            .events
            .iter()
            .filter(|event| matches!(event, MatchEvent::Died { .. }))
            .collect();
        assert_eq!(
            deaths,
            vec![&MatchEvent::Died {
                day: 1,
                player: "Cleo".to_string(),
                cause: DeathCause::WerewolfAttack,
            }]
        );
    }

    #[test]
    fn skip_keeps_the_poison() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Eve", keys::WITCH_POISON_ACTION, "skip");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.poisoned, None);
        assert!(matches!(
            ctx.roster.get("Eve").expect("eve").state,
            RoleState::Witch {
                poison_potions: 1,
                ..
            }
        ));
    }

    #[test]
    fn attacked_hunter_shoots_before_dying() {
        let mut ctx = context_with(&lone_wolf_table(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.push("Ava", keys::WEREWOLF_NIGHT_ACTION, "Finn");
        oracle.push("Finn", keys::HUNTER_SHOOT_ACTION, "Ava");
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        assert_eq!(report.deaths, vec!["Finn", "Ava"]);
        let dan = ctx.memory.log("Dan").expect("dan");
        assert!(dan.render_public().contains("Finn was killed last night."));
        assert!(!dan.render_public().contains("Ava"));
    }

    #[test]
    fn bystanders_reflect_but_the_decider_does_not() {
        let mut ctx = context_with(&standard_seats(), Rules::default());
        let oracle = ScriptedOracle::new();
        oracle.always("Cleo", "villager_night_reflection", "Ben feels off.");
        let mut prompts = PromptStore::builtin();
        prompts
            .insert("werewolf_night_reflection", "Think, {{ player_name }}.")
            .expect("insert");
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        let decider = report.decider.expect("decider");
        let other = if decider == "Ava" { "Ben" } else { "Ava" };

        assert_eq!(
            oracle
                .requests_for(other, "werewolf_night_reflection")
                .len(),
            1
        );
        assert!(
            oracle
                .requests_for(&decider, "werewolf_night_reflection")
                .is_empty()
        );
        for seat in ["Cleo", "Finn", "Hana", "Ivo"] {
            assert_eq!(oracle.requests().iter().filter(|r| r.player == seat).count(), 1);
        }
        assert!(
            ctx.memory
                .log("Cleo")
                .expect("cleo")
                .render_private()
                .contains("Your thoughts tonight: Ben feels off.")
        );
        assert!(
            !ctx.memory
                .log("Dan")
                .expect("dan")
                .render_public()
                .contains("Ben feels off.")
        );
    }

    #[test]
    fn werewolf_candidates_include_the_pack() {
        let mut ctx = context_with(&standard_seats(), Rules::default());
        let oracle = ScriptedOracle::new();
        let prompts = PromptStore::builtin();
        let gateway = DecisionGateway::new(&oracle, &prompts);

        let report = resolve_night(&mut ctx, &gateway);
        let decider = report.decider.expect("decider");
        let request = oracle
            .requests_for(&decider, keys::WEREWOLF_NIGHT_ACTION)
            .pop()
            .expect("request");
        assert!(request.prompt.contains("Possible targets: Ava, Ben, Cleo"));
        assert!(request.prompt.contains("Your fellow werewolves:"));
        assert_eq!(report.victim, None);
    }
}
