//! I/O helpers: oracle backends, prompt templates, config and match records.

pub mod config;
pub mod extract;
pub mod match_log;
pub mod oracle;
pub mod process;
pub mod prompt;
