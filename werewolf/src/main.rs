//! Werewolf match runner.
//!
//! Seats the table from `werewolf.toml` (or a built-in nine-seat default),
//! plays a match with every seat driven by the configured oracle command,
//! and narrates the result on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use werewolf::controller::{Match, MatchStop, PhaseReport};
use werewolf::core::roster::Roster;
use werewolf::day::DayReport;
use werewolf::exit_codes;
use werewolf::io::config::{MatchConfig, load_config, write_config};
use werewolf::io::match_log::write_record;
use werewolf::io::oracle::CommandOracle;
use werewolf::io::prompt::{PromptStore, write_builtin_templates};
use werewolf::logging;
use werewolf::night::NightReport;

const DEFAULT_CONFIG: &str = "werewolf.toml";

#[derive(Parser)]
#[command(
    name = "werewolf",
    version,
    about = "Werewolf matches played by language-model agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config with the default nine-seat table if missing.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Play one match and print the narration.
    Play {
        /// Match config (TOML). A missing file uses the default table.
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Seed for reproducible werewolf decision-maker selection.
        #[arg(long)]
        seed: Option<u64>,
        /// Directory of `<key>.md` templates overriding the built-ins.
        #[arg(long)]
        prompts: Option<PathBuf>,
        /// Stop after this many cycles without a winner.
        #[arg(long)]
        max_days: Option<u32>,
        /// Write a JSON record of the match here.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Write the built-in prompt templates to a directory for editing.
    Templates {
        #[arg(long)]
        out: PathBuf,
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config, roster and prompt overrides without playing.
    Check {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(logging::default_filter(matches!(cli.command, Command::Play { .. })));
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Play {
            config,
            seed,
            prompts,
            max_days,
            record,
        } => {
            let mut cfg = load_config(&config)?;
            if seed.is_some() {
                cfg.seed = seed;
            }
            if max_days.is_some() {
                cfg.max_days = max_days;
            }
            if prompts.is_some() {
                cfg.prompts_dir = prompts;
            }
            cfg.validate()?;
            cmd_play(&cfg, record.as_deref())
        }
        Command::Templates { out, force } => cmd_templates(&out, force),
        Command::Check { config } => cmd_check(&config),
    }
}

fn cmd_init(config: &Path, force: bool) -> Result<i32> {
    if config.exists() && !force {
        println!("{} already exists (use --force to overwrite)", config.display());
        return Ok(exit_codes::OK);
    }
    write_config(config, &MatchConfig::default())
        .with_context(|| format!("write {}", config.display()))?;
    println!("{}", config.display());
    Ok(exit_codes::OK)
}

fn cmd_play(cfg: &MatchConfig, record: Option<&Path>) -> Result<i32> {
    let prompts = load_prompts(cfg)?;
    let oracle = CommandOracle::new(&cfg.oracle);
    let mut game = Match::from_config(cfg, oracle, prompts).context("seat players")?;

    println!("=== The game begins ===");
    let outcome = game.run_with(narrate).context("start match")?;

    println!("\n=== Game over ===");
    match outcome.stop {
        MatchStop::Won(faction) => println!("Winner: {faction} (day {})", outcome.days),
        MatchStop::DayLimitReached => println!("No winner after {} days", outcome.days),
    }
    print_roster(game.final_roster());

    if let Some(path) = record {
        write_record(path, &game.record())?;
        println!("\nRecord written to {}", path.display());
    }

    Ok(match outcome.stop {
        MatchStop::Won(_) => exit_codes::OK,
        MatchStop::DayLimitReached => exit_codes::DAY_LIMIT,
    })
}

fn cmd_templates(out: &Path, force: bool) -> Result<i32> {
    let written = write_builtin_templates(out, force)?;
    for path in &written {
        println!("{}", path.display());
    }
    if written.is_empty() {
        println!("all templates already present in {} (use --force to overwrite)", out.display());
    }
    Ok(exit_codes::OK)
}

fn cmd_check(config: &Path) -> Result<i32> {
    let cfg = load_config(config)?;
    load_prompts(&cfg)?;
    let game = Match::from_config(&cfg, CommandOracle::new(&cfg.oracle), PromptStore::empty())
        .context("seat players")?;
    let roster = game.final_roster();
    roster
        .validate_for_start()
        .with_context(|| format!("invalid roster in {}", config.display()))?;
    let (werewolves, others) = roster.living_counts();
    println!("ok: {} players ({werewolves} werewolves, {others} others)", roster.len());
    Ok(exit_codes::OK)
}

fn load_prompts(cfg: &MatchConfig) -> Result<PromptStore> {
    match &cfg.prompts_dir {
        Some(dir) => PromptStore::with_overrides(dir),
        None => Ok(PromptStore::builtin()),
    }
}

fn narrate(report: &PhaseReport) {
    match report {
        PhaseReport::Night(night) => narrate_night(night),
        PhaseReport::Day(day) => narrate_day(day),
        PhaseReport::GameOver { day, winner } => {
            println!("\nThe {winner} faction wins on day {day}.");
        }
    }
}

fn narrate_night(night: &NightReport) {
    println!("\n=== Day {} ===\n--- Night ---", night.day);
    if let Some(target) = &night.protected {
        println!("The guard protected {target}.");
    }
    match (&night.decider, &night.attacked) {
        (Some(decider), Some(target)) => println!("{decider} led the pack against {target}."),
        (Some(decider), None) => println!("{decider} led the pack, but they attacked nobody."),
        _ => {}
    }
    if night.saved {
        println!("The witch used the save potion.");
    }
    if let Some(target) = &night.poisoned {
        println!("The witch poisoned {target}.");
    }
    if night.deaths.is_empty() {
        println!("Nobody died tonight.");
    } else {
        println!("Died tonight: {}", night.deaths.join(", "));
    }
}

fn narrate_day(day: &DayReport) {
    println!("\n--- Day ---");
    for (speaker, speech) in &day.speeches {
        println!("{speaker}: {speech}");
    }
    for ballot in &day.ballots {
        println!("{} votes for {}", ballot.voter, ballot.target);
    }
    if let Some(idiot) = &day.revealed {
        println!("{idiot} revealed as the Idiot and survives without a vote.");
    }
    match &day.lynched {
        Some(lynched) => println!("{lynched} was executed."),
        None if day.revealed.is_none() => println!("No one was executed."),
        None => {}
    }
    if let Some(shot) = &day.shot {
        println!("The hunter shot {shot}.");
    }
}

fn print_roster(roster: &Roster) {
    println!("\nPlayers:");
    for player in roster.players() {
        let status = if player.alive { "alive" } else { "dead" };
        println!("  {}: {} ({status})", player.name, player.role());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_play_overrides() {
        let cli = Cli::parse_from(["werewolf", "play", "--seed", "9", "--max-days", "4"]);
        match cli.command {
            Command::Play {
                config,
                seed,
                max_days,
                prompts,
                record,
            } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG));
                assert_eq!(seed, Some(9));
                assert_eq!(max_days, Some(4));
                assert!(prompts.is_none());
                assert!(record.is_none());
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["werewolf", "init"]);
        match cli.command {
            Command::Init { config, force } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG));
                assert!(!force);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn parse_templates_force() {
        let cli = Cli::parse_from(["werewolf", "templates", "--out", "prompts", "--force"]);
        assert!(matches!(cli.command, Command::Templates { force: true, .. }));
    }
}
