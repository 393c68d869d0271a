//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_CONCURRENCY;

/// Injection misuse linter for Python projects
#[derive(Parser, Debug)]
#[command(name = "injectlint")]
#[command(about = "Flags direct references to injected symbols in Python sources")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show a progress bar during long runs
    #[arg(long, global = true)]
    pub progress: bool,
}

// ============================================
// Subcommands
// ============================================

/// Available subcommands for injectlint
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a file or project for injection misuses
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// List the Python files a check would cover
    Files(FilesArgs),
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to a Python file or project directory (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Maximum number of files analyzed at once
    #[arg(
        long,
        value_name = "N",
        env = "INJECTLINT_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY
    )]
    pub concurrency: usize,
}

/// Arguments for the files command
#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Path to a Python file or project directory (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

// ============================================
// Shared Types
// ============================================

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default for terminal)
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON - standard JSON output for machine parsing
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_accepts_path_and_concurrency() {
        let cli = Cli::parse_from(["injectlint", "check", "src", "--concurrency", "4"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.path, Some(PathBuf::from("src")));
                assert_eq!(args.concurrency, 4);
            }
            _ => panic!("expected check subcommand"),
        }
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::parse_from(["injectlint", "check", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
