//! Command-line interface for testcensus.

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::aggregate::{collect_py_files, RepoMetricsRow};
use crate::classify::{classify_file, FileClassification};
use crate::driver::{load_tasks, Driver};
use crate::navigate::Navigator;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;

/// Test-suite census for source repositories.
///
/// Testcensus classifies every function definition in a corpus of Python
/// repositories as non-test, unit test, or property-based test, and emits
/// one metrics row per repository.
#[derive(Parser)]
#[command(name = "testcensus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate test-classification metrics across repositories
    Census(CensusArgs),
    /// Show per-function labels for a file or directory
    Classify(ClassifyArgs),
}

/// Arguments for the census command.
#[derive(Parser)]
pub struct CensusArgs {
    /// JSONL repository list (one metadata record per line)
    #[arg(short, long)]
    pub repos: PathBuf,

    /// Directory of repository checkouts, one `owner+name` directory each
    #[arg(short = 'd', long, default_value = "data/repos")]
    pub root: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: csv or json
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Worker threads (0 = one per core, 1 = sequential)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the classify command.
#[derive(Parser)]
pub struct ClassifyArgs {
    /// File or directory to classify
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Run the census command.
pub fn run_census(args: &CensusArgs) -> anyhow::Result<i32> {
    if args.format != "csv" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'csv' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let tasks = load_tasks(&args.repos, &args.root)?;
    if tasks.is_empty() {
        eprintln!("Warning: no repositories to process");
    }

    let driver = Driver::new()
        .jobs(args.jobs)
        .show_progress(!args.no_progress);
    let results = driver.run(&tasks)?;
    let rows: Vec<RepoMetricsRow> = results.into_values().map(|census| census.row).collect();

    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)?;
            write_rows(file, &rows, &args.format)?;
            eprintln!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => write_rows(io::stdout().lock(), &rows, &args.format)?,
    }

    Ok(EXIT_SUCCESS)
}

fn write_rows<W: io::Write>(out: W, rows: &[RepoMetricsRow], format: &str) -> anyhow::Result<()> {
    match format {
        "json" => report::write_json(out, rows),
        _ => report::write_csv(out, rows),
    }
}

/// Run the classify command.
pub fn run_classify(args: &ClassifyArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let files = if args.path.is_dir() {
        collect_py_files(&args.path)
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no files to classify");
        return Ok(EXIT_SUCCESS);
    }

    let mut merged = FileClassification::default();
    for path in files {
        match Navigator::build(&path) {
            Ok(nav) => merged.merge(classify_file(&nav)),
            Err(err) => eprintln!("Warning: skipped {}: {}", path.display(), err),
        }
    }

    let mut stdout = io::stdout().lock();
    match args.format.as_str() {
        "json" => report::write_labels_json(&mut stdout, &merged)?,
        _ => report::write_pretty(&mut stdout, &merged)?,
    }

    Ok(EXIT_SUCCESS)
}
