//! CLI module - argument parsing, subcommand runners and interactive prompts

pub mod args;
pub mod commands;
mod prompts;

pub use args::{derived_path, Cli, Commands, CorrelateArgs, FilterArgs, LearnArgs, PredictArgs};
pub use commands::{run_correlate, run_filter, run_learn, run_predict};
pub use prompts::*;
