//! Deterministic, pure logic shared by the match engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod memory;
pub mod roster;
pub mod state;
pub mod tally;
pub mod types;
pub mod win;
