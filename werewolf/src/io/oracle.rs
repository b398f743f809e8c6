//! Oracle abstraction for text generation.
//!
//! The [`Oracle`] trait decouples the engine from the actual model backend
//! (by default a `codex exec` subprocess). Tests use scripted oracles that
//! return predetermined replies without spawning processes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument, warn};

use crate::io::config::OracleConfig;
use crate::io::process::{ProcessLimits, run_command};

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Seat the request is made for.
    pub player: String,
    /// Prompt template key that produced `prompt`.
    pub key: String,
    /// Rendered prompt text.
    pub prompt: String,
    /// Optional role constraint, sent ahead of the prompt.
    pub constraints: Option<String>,
}

impl OracleRequest {
    /// Full text handed to a backend: constraints block first, then the prompt.
    pub fn render(&self) -> String {
        match self.constraints.as_deref().map(str::trim) {
            Some(constraints) if !constraints.is_empty() => {
                format!("<system>\n{constraints}\n</system>\n\n{}", self.prompt)
            }
            _ => self.prompt.clone(),
        }
    }
}

/// Abstraction over text-generation backends.
pub trait Oracle {
    fn generate(&self, request: &OracleRequest) -> Result<String>;
}

/// Oracle that runs a command with the prompt on stdin and reads the reply from stdout.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    command: Vec<String>,
    limits: ProcessLimits,
}

impl CommandOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            command: config.command.clone(),
            limits: ProcessLimits {
                timeout: Duration::from_secs(config.timeout_secs),
                output_limit_bytes: config.output_limit_bytes,
            },
        }
    }
}

impl Oracle for CommandOracle {
    #[instrument(skip_all, fields(player = %request.player, key = %request.key))]
    fn generate(&self, request: &OracleRequest) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("oracle command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(args);

        let input = request.render();
        let output = run_command(cmd, Some(input.as_bytes()), self.limits)
            .with_context(|| format!("run oracle command {program}"))?;

        if output.timed_out {
            warn!(
                timeout_secs = self.limits.timeout.as_secs(),
                "oracle timed out"
            );
            bail!("oracle timed out after {:?}", self.limits.timeout);
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle failed");
            bail!(
                "oracle exited with status {:?}: {}",
                output.status.code(),
                output.stderr_summary()
            );
        }

        let reply = output.stdout_text().trim().to_string();
        debug!(bytes = reply.len(), "oracle replied");
        Ok(reply)
    }
}
