//! Stable exit codes for werewolf CLI commands.

/// Command succeeded; `play` ended with a winner.
pub const OK: i32 = 0;
/// Invalid config, roster or prompts, or another error.
pub const INVALID: i32 = 1;
/// `play` hit `max_days` without a winner.
pub const DAY_LIMIT: i32 = 2;
