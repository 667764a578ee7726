//! Argument parsing (spec.md §6 "CLI surface"; ground truth: teacher's
//! `cli.rs` `Cli`/`Commands` structs).

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentrun", version)]
#[command(about = "Tool-driven LLM agent runtime")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a provider entry in config.json (interactive; out of core)
    Add,

    /// Print discovered skills
    List,

    /// Drive the reasoning loop once.
    ///
    /// `agentrun run <input>` uses the skill selector; `agentrun run
    /// <skill_name> <input>` bypasses it. Both forms accept `--allow` in
    /// any position after `run`.
    Run {
        /// First positional: the skill name (two-arg form) or the user
        /// request itself (one-arg form) — disambiguated once both
        /// positionals are known, see `main.rs`.
        first: String,

        /// Second positional, present only in the `<skill_name> <input>` form
        second: Option<String>,

        /// Suppress tool confirmation prompts (sets allowAll=true)
        #[arg(long)]
        allow: bool,
    },
}

impl Commands {
    /// Split the `Run` variant's ambiguous positionals into `(skill_name,
    /// input)` (spec.md §6: one-arg form has no named skill).
    pub fn run_args(first: String, second: Option<String>) -> (Option<String>, String) {
        match second {
            Some(input) => (Some(first), input),
            None => (None, first),
        }
    }
}
