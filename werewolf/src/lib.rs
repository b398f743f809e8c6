//! Werewolf match engine with oracle-driven players.
//!
//! Every seat at the table is played by an external text-generation oracle.
//! The engine owns the rules: roles, phase order, night actions, voting and
//! win conditions. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure match state (roster, memory, tally, win evaluation).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting pieces (oracle subprocess, prompt templates,
//!   config and match records). Isolated behind traits for tests.
//!
//! Orchestration modules ([`gateway`], [`night`], [`day`], [`hunter`],
//! [`controller`]) combine the two into a full match.

pub mod controller;
pub mod core;
pub mod day;
pub mod exit_codes;
pub mod gateway;
pub mod hunter;
pub mod io;
pub mod logging;
pub mod night;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
