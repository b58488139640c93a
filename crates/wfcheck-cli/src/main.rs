//! CLI binary for checking CI and release workflow files.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use wfcheck_rules::{Expectations, Recorder, SuiteKind, SuiteReport, SuiteRun, WorkflowPaths};

#[derive(Parser)]
#[command(
    name = "wfcheck",
    version,
    about = "Static checks for GitHub Actions CI and release workflows"
)]
struct Cli {
    /// Suite to run
    #[arg(value_enum, default_value_t = SuiteArg::All)]
    suite: SuiteArg,

    /// Path to the CI workflow
    #[arg(long, default_value = ".github/workflows/ci.yml")]
    ci: PathBuf,

    /// Path to the release workflow
    #[arg(long, default_value = ".github/workflows/release.yml")]
    release: PathBuf,

    /// YAML file overriding the expected names, versions and permissions
    #[arg(long)]
    expectations: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SuiteArg {
    Release,
    Consistency,
    EdgeCases,
    Schema,
    All,
}

impl SuiteArg {
    fn kinds(self) -> Vec<SuiteKind> {
        match self {
            SuiteArg::Release => vec![SuiteKind::Release],
            SuiteArg::Consistency => vec![SuiteKind::Consistency],
            SuiteArg::EdgeCases => vec![SuiteKind::EdgeCases],
            SuiteArg::Schema => vec![SuiteKind::Schema],
            SuiteArg::All => SuiteKind::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Streaming PASS/FAIL transcript
    Text,
    /// One JSON report per suite, printed at the end
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the transcript or the JSON report.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let expectations = match &cli.expectations {
        Some(path) => Expectations::from_file(path)
            .with_context(|| format!("failed to load expectations from {}", path.display()))?,
        None => Expectations::default(),
    };
    let paths = WorkflowPaths {
        ci: cli.ci,
        release: cli.release,
    };

    let runs: Vec<SuiteRun> = cli
        .suite
        .kinds()
        .into_iter()
        .map(|kind| {
            let rec = match cli.format {
                Format::Text => Recorder::new(),
                Format::Json => Recorder::quiet(),
            };
            wfcheck_rules::run(kind, &paths, &expectations, rec)
        })
        .collect();

    if cli.format == Format::Json {
        let reports: Vec<SuiteReport> = runs.iter().map(SuiteRun::report).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed: Vec<&str> = runs
        .iter()
        .filter(|run| run.exit_code() != 0)
        .map(|run| run.kind.name())
        .collect();
    if !failed.is_empty() {
        tracing::info!(suites = ?failed, "workflow checks failed");
        std::process::exit(1);
    }
    Ok(())
}
