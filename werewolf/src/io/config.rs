//! Match configuration stored as TOML.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::Rules;

/// Match configuration (TOML).
///
/// Missing fields fall back to defaults; a missing file yields the default
/// nine-seat table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchConfig {
    /// RNG seed for reproducible werewolf decision-maker selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Stop after this many day/night cycles without a winner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<u32>,

    /// Allow a Hunter killed by poison to retaliate.
    pub hunter_shoots_when_poisoned: bool,

    /// Directory of `<key>.md` templates overriding the built-in prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,

    pub oracle: OracleConfig,

    pub players: Vec<SeatConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Command that reads a prompt on stdin and prints the reply on stdout.
    pub command: Vec<String>,
    /// Per-request wall-clock limit in seconds.
    pub timeout_secs: u64,
    /// Truncate oracle replies beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: ["codex", "exec", "--skip-git-repo-check", "-"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

/// One seat at the table. The role stays a string so unknown roles surface as setup errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatConfig {
    pub name: String,
    pub role: String,
}

impl SeatConfig {
    fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_days: None,
            hunter_shoots_when_poisoned: false,
            prompts_dir: None,
            oracle: OracleConfig::default(),
            players: default_table(),
        }
    }
}

/// Three werewolves against a villager and one of each special role.
pub fn default_table() -> Vec<SeatConfig> {
    vec![
        SeatConfig::new("Ava", "werewolf"),
        SeatConfig::new("Ben", "werewolf"),
        SeatConfig::new("Cleo", "werewolf"),
        SeatConfig::new("Dan", "villager"),
        SeatConfig::new("Eve", "seer"),
        SeatConfig::new("Finn", "witch"),
        SeatConfig::new("Gus", "hunter"),
        SeatConfig::new("Hana", "guard"),
        SeatConfig::new("Ivo", "idiot"),
    ]
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_days == Some(0) {
            return Err(anyhow!("max_days must be > 0 when set"));
        }
        if self.oracle.command.is_empty() || self.oracle.command[0].trim().is_empty() {
            return Err(anyhow!("oracle.command must be a non-empty array"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(anyhow!("oracle.timeout_secs must be > 0"));
        }
        if self.oracle.output_limit_bytes == 0 {
            return Err(anyhow!("oracle.output_limit_bytes must be > 0"));
        }
        if self.players.is_empty() {
            return Err(anyhow!("players must list at least one seat"));
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            hunter_shoots_when_poisoned: self.hunter_shoots_when_poisoned,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<MatchConfig> {
    if !path.exists() {
        let cfg = MatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MatchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default_table() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, MatchConfig::default());
        assert_eq!(cfg.players.len(), 9);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("match.toml");
        let cfg = MatchConfig {
            seed: Some(42),
            max_days: Some(12),
            hunter_shoots_when_poisoned: true,
            ..MatchConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("match.toml");
        fs::write(
            &path,
            r#"
seed = 7

[[players]]
name = "Ava"
role = "werewolf"

[[players]]
name = "Ben"
role = "villager"
"#,
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.players.len(), 2);
        assert_eq!(cfg.oracle, OracleConfig::default());
        assert!(!cfg.hunter_shoots_when_poisoned);
    }

    #[test]
    fn zero_day_limit_is_rejected() {
        let cfg = MatchConfig {
            max_days: Some(0),
            ..MatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
