//! Integration tests for exam auto-leveling

mod auto_leveler;
mod config_integration;
mod run_entry;
mod test_utils;
