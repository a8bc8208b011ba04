//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// taskchain - run chains of tasks described in a plan file.
#[derive(Debug, Parser)]
#[command(name = "taskchain")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory plan paths are resolved against (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every run of a plan
    Run(RunArgs),

    /// Check a plan without running it
    Validate(PlanArgs),

    /// List the tasks, groups and runs of a plan
    List(PlanArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Plan file to run
    pub plan: PathBuf,

    /// Run id for task-list runs (generated when absent)
    #[arg(long, value_name = "ID")]
    pub run_id: Option<String>,

    /// Use the parallel processor regardless of plan settings
    #[arg(long)]
    pub parallel: bool,

    /// Worker count for the parallel processor
    #[arg(long, value_name = "N", env = "TASKCHAIN_WORKERS")]
    pub workers: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for commands that only read a plan.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    /// Plan file
    pub plan: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_flags() {
        let cli = Cli::parse_from([
            "taskchain",
            "run",
            "plan.yml",
            "--run-id",
            "nightly",
            "--parallel",
            "--workers",
            "3",
            "--json",
        ]);

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.plan, PathBuf::from("plan.yml"));
                assert_eq!(args.run_id.as_deref(), Some("nightly"));
                assert!(args.parallel);
                assert_eq!(args.workers, Some(3));
                assert!(args.json);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["taskchain", "list", "plan.yml", "--quiet", "--debug"]);
        assert!(cli.quiet);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["taskchain"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
