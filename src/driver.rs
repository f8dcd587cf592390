//! Batch driver: applies aggregation across many repositories.
//!
//! Repositories are independent units of work with no shared mutable state,
//! so the parallel path is a plain rayon fan-out; sequential and parallel
//! runs produce identical row sets.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::aggregate::{aggregate, repo_dir_name, RepoCensus, RepoMetadata};

/// One unit of work: a checked-out repository plus its metadata record.
#[derive(Debug, Clone)]
pub struct RepoTask {
    pub root: PathBuf,
    pub metadata: RepoMetadata,
}

/// Read a JSONL metadata file and pair each record with its checkout
/// directory under `root` (named `owner+name`).
pub fn load_tasks(repo_list: &Path, root: &Path) -> anyhow::Result<Vec<RepoTask>> {
    let file = fs::File::open(repo_list)
        .with_context(|| format!("cannot open repo list {}", repo_list.display()))?;

    let mut tasks = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let metadata: RepoMetadata = serde_json::from_str(&line)
            .with_context(|| format!("malformed metadata record: {}", line))?;
        let dir = root.join(repo_dir_name(&metadata.repo_id));
        tasks.push(RepoTask {
            root: dir,
            metadata,
        });
    }
    Ok(tasks)
}

/// Runs aggregation over a task list, sequentially or fanned out over a
/// worker pool.
pub struct Driver {
    jobs: usize,
    show_progress: bool,
}

impl Driver {
    pub fn new() -> Self {
        Self {
            jobs: 0,
            show_progress: false,
        }
    }

    /// Worker count for the parallel path. `0` means one worker per core;
    /// `1` selects the sequential path in [`Driver::run`].
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Dispatch to the sequential or parallel strategy based on `jobs`.
    pub fn run(&self, tasks: &[RepoTask]) -> anyhow::Result<BTreeMap<String, RepoCensus>> {
        if self.jobs == 1 {
            Ok(self.run_sequential(tasks))
        } else {
            self.run_parallel(tasks)
        }
    }

    /// Aggregate each repository to completion before starting the next.
    pub fn run_sequential(&self, tasks: &[RepoTask]) -> BTreeMap<String, RepoCensus> {
        let bar = self.progress_bar(tasks.len());
        let mut results = BTreeMap::new();
        for task in tasks {
            let census = aggregate(&task.root, &task.metadata);
            warn_skipped(&census);
            results.insert(task.metadata.repo_id.clone(), census);
            bar.inc(1);
        }
        bar.finish_and_clear();
        results
    }

    /// Fan repositories out over a fixed-size worker pool. Each worker owns
    /// its tasks outright; results are keyed by repository id, so collection
    /// order is irrelevant.
    pub fn run_parallel(&self, tasks: &[RepoTask]) -> anyhow::Result<BTreeMap<String, RepoCensus>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .context("cannot build worker pool")?;

        let bar = self.progress_bar(tasks.len());
        let results: Vec<(String, RepoCensus)> = pool.install(|| {
            tasks
                .par_iter()
                .map(|task| {
                    let census = aggregate(&task.root, &task.metadata);
                    bar.inc(1);
                    (task.metadata.repo_id.clone(), census)
                })
                .collect()
        });
        bar.finish_and_clear();

        let mut map = BTreeMap::new();
        for (repo_id, census) in results {
            warn_skipped(&census);
            map.insert(repo_id, census);
        }
        Ok(map)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} repos {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface skipped files without aborting the batch.
fn warn_skipped(census: &RepoCensus) {
    for skipped in &census.skipped {
        eprintln!(
            "Warning: skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        );
    }
}
