//! injectlint entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use injectlint::aggregate::ProgressFn;
use injectlint::cli::{CheckArgs, Cli, Commands, FilesArgs, OutputFormat};
use injectlint::config::LintOptions;
use injectlint::detect::Linter;
use injectlint::error::Result;
use injectlint::{discovery, report};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(outcome) => {
            print!("{}", outcome.output);
            if outcome.findings > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// What a subcommand produced: rendered output plus the finding count that
/// decides the exit code.
struct Outcome {
    output: String,
    findings: usize,
}

fn run(cli: &Cli) -> Result<Outcome> {
    match &cli.command {
        Commands::Check(args) => run_check(cli, args),
        Commands::Files(args) => run_files(cli, args),
    }
}

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<Outcome> {
    let root = target_path(args.path.as_deref());
    let options = LintOptions {
        concurrency: args.concurrency,
        ..LintOptions::default()
    };
    let linter = Linter::new(options);

    let progress = cli.progress.then(progress_bar);
    let findings = linter.check_project(&root, progress)?;

    if cli.verbose {
        let stats = linter.cache().stats();
        eprintln!(
            "Parsed {} file(s) ({} parse cache hits, {} registry hits)",
            stats.parses, stats.parse_hits, stats.registry_hits
        );
    }

    let output = match cli.format {
        OutputFormat::Text => report::render_text(&findings),
        OutputFormat::Json => report::render_json(&findings)?,
    };
    Ok(Outcome {
        findings: findings.len(),
        output,
    })
}

fn run_files(cli: &Cli, args: &FilesArgs) -> Result<Outcome> {
    let root = target_path(args.path.as_deref());
    let options = LintOptions::default();

    let mut files = discovery::python_files(&root, &options)?;
    files.retain(|f| !options.is_excluded_file(f));

    if cli.verbose {
        eprintln!(
            "Discovered {} Python file(s) under {}",
            files.len(),
            root.display()
        );
    }

    let output = match cli.format {
        OutputFormat::Text => report::render_paths_text(&files),
        OutputFormat::Json => report::render_paths_json(&files)?,
    };
    Ok(Outcome {
        findings: 0,
        output,
    })
}

fn target_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn progress_bar() -> ProgressFn {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:30.cyan} {pos}/{len} files")
            .unwrap(),
    );
    Box::new(move |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
        if done >= total {
            bar.finish_and_clear();
        }
    })
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "injectlint=debug"
    } else {
        "injectlint=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
