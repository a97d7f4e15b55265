//! Leveler: exam question-bank auto-leveling.
//!
//! Computes per-domain, per-difficulty question targets for an exam with the Largest
//! Remainder Method, reports the gaps against the current inventory, and fills them
//! through a question generator.

pub mod cli;
pub mod config;
pub mod error;
pub mod leveling;
pub mod logging;
pub mod provider;
pub mod store;
pub mod types;
