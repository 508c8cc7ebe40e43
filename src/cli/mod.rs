//! CLI module for OutbreakCast
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, SelectionArgs, Verbosity};
pub use config::Config;
