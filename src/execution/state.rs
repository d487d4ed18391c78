use crate::haplotype::read_cluster_file;
use crate::utils::{Result, Workspace};
use std::{fs, path::Path};

/// Lifecycle of a sample as observed on disk. Never stored; re-derived from
/// the `execution/` directory on every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    Unstarted,
    Incomplete,
    Complete,
}

/// A sample is complete when both pbaa cluster files exist and parse.
pub fn infer_state(workspace: &Workspace, sample: &str) -> SampleState {
    if !workspace.execution_dir(sample).is_dir() {
        return SampleState::Unstarted;
    }
    let outputs = [
        workspace.passed_clusters_path(sample),
        workspace.failed_clusters_path(sample),
    ];
    if outputs.iter().all(|path| cluster_file_parses(path)) {
        SampleState::Complete
    } else {
        SampleState::Incomplete
    }
}

/// Both pbaa cluster files are on disk. Says nothing about their contents.
pub fn has_cluster_outputs(workspace: &Workspace, sample: &str) -> bool {
    workspace.passed_clusters_path(sample).is_file()
        && workspace.failed_clusters_path(sample).is_file()
}

fn cluster_file_parses(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match read_cluster_file(path) {
        Ok(mut clusters) => clusters.all(|record| record.is_ok()),
        Err(_) => false,
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct DispatchPlan {
    /// Samples that need a new clustering run.
    pub samples: Vec<String>,
    pub complete: Vec<String>,
    /// Samples whose incomplete execution directory was removed.
    pub purged: Vec<String>,
    pub missing_index: Vec<String>,
}

/// Decides which samples under `fastq/` need clustering. Incomplete execution
/// directories are purged so the next run starts clean. An empty plan is an
/// error: there is no successful no-op outcome.
pub fn plan_dispatch(workspace: &Workspace) -> Result<DispatchPlan> {
    let sample_names = workspace
        .list_read_samples()
        .map_err(|e| format!("Failed to list {}: {}", workspace.fastq_dir().display(), e))?;

    let mut plan = DispatchPlan::default();
    for sample in sample_names.iter() {
        match infer_state(workspace, sample) {
            SampleState::Complete => {
                plan.complete.push(sample.clone());
                continue;
            }
            SampleState::Incomplete => {
                let dir = workspace.execution_dir(sample);
                log::warn!(
                    "Removing incomplete execution directory for {}: {}",
                    sample,
                    dir.display()
                );
                fs::remove_dir_all(&dir)
                    .map_err(|e| format!("Failed to remove {}: {}", dir.display(), e))?;
                plan.purged.push(sample.clone());
            }
            SampleState::Unstarted => {}
        }

        if !workspace.reads_index_path(sample).is_file() {
            log::warn!("No index file found for {}, skipping.", sample);
            plan.missing_index.push(sample.clone());
            continue;
        }
        plan.samples.push(sample.clone());
    }

    if plan.samples.is_empty() {
        return if sample_names.is_empty() {
            Err("No samples found.".into())
        } else {
            Err("No samples found for which clusters have not been generated.".into())
        };
    }

    log::info!(
        "Found {} samples which pbaa has not yet been run on ({} already complete)",
        plan.samples.len(),
        plan.complete.len()
    );
    Ok(plan)
}
