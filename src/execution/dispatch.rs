use crate::utils::Result;
use crossbeam_channel::unbounded;
use log::Level;
use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{fs, path::PathBuf};

/// One clustering run: a single sample writing into its own directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterJob {
    pub sample: String,
    pub reads_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_prefix: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Clean,
    /// Zero exit status, but the tool wrote to stderr.
    Warning {
        stderr: String,
    },
    Failure {
        status: Option<i32>,
        stderr: String,
    },
}

impl JobOutcome {
    pub fn classify(success: bool, status: Option<i32>, stderr: &[u8]) -> Self {
        let stderr = String::from_utf8_lossy(stderr).to_string();
        match (success, stderr.trim().is_empty()) {
            (false, _) => JobOutcome::Failure { status, stderr },
            (true, true) => JobOutcome::Clean,
            (true, false) => JobOutcome::Warning { stderr },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub sample: String,
    /// Exact invocation, for diagnostics.
    pub command: String,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn diagnostic(&self) -> String {
        match &self.outcome {
            JobOutcome::Clean => format!("pbaa run \"{}\" completed.", self.command),
            JobOutcome::Warning { stderr } => {
                format!("pbaa run \"{}\" wrote to stderr.\n{}", self.command, stderr)
            }
            JobOutcome::Failure { status, stderr } => {
                let status = status.map_or("signal".to_string(), |code| code.to_string());
                format!(
                    "pbaa run \"{}\" failed (exit status {}).\n{}",
                    self.command, status, stderr
                )
            }
        }
    }
}

/// Runs the external clustering step for one job. Implementations must not
/// share mutable state between jobs.
pub trait JobRunner: Sync {
    fn run(&self, job: &ClusterJob) -> JobResult;
}

/// Exact failure and warning counts plus the first failure and first warning
/// received, in completion order.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub total: usize,
    pub failures: usize,
    pub warnings: usize,
    pub first_failure: Option<JobResult>,
    pub first_warning: Option<JobResult>,
    pub failed_samples: Vec<String>,
}

impl DispatchSummary {
    fn record(&mut self, result: JobResult) {
        self.total += 1;
        match result.outcome {
            JobOutcome::Clean => {}
            JobOutcome::Warning { .. } => {
                self.warnings += 1;
                if self.first_warning.is_none() {
                    self.first_warning = Some(result);
                }
            }
            JobOutcome::Failure { .. } => {
                self.failures += 1;
                self.failed_samples.push(result.sample.clone());
                if self.first_failure.is_none() {
                    self.first_failure = Some(result);
                }
            }
        }
    }

    /// Batch outcome: failures outrank warnings, and only the first of
    /// either is shown in full.
    pub fn message(&self) -> (Level, String) {
        if let Some(failure) = &self.first_failure {
            (
                Level::Error,
                format!(
                    "pbaa runs failed for {} of {} samples. Only the first error is shown (below).\n{}",
                    self.failures,
                    self.total,
                    failure.diagnostic()
                ),
            )
        } else if let Some(warning) = &self.first_warning {
            (
                Level::Warn,
                format!(
                    "All {} pbaa runs completed successfully, however {} wrote to stderr. Only the first instance is shown (below).\n{}",
                    self.total,
                    self.warnings,
                    warning.diagnostic()
                ),
            )
        } else {
            (
                Level::Info,
                format!("All {} pbaa runs completed successfully.", self.total),
            )
        }
    }

    pub fn report(&self) {
        let (level, message) = self.message();
        log::log!(level, "{}", message);
    }
}

/// Runs every job on a worker pool and folds the results as they complete.
/// A failing job never stops its siblings.
pub fn dispatch<R: JobRunner>(
    jobs: &[ClusterJob],
    runner: &R,
    num_threads: Option<usize>,
) -> Result<DispatchSummary> {
    let mut summary = DispatchSummary::default();
    let mut runnable = Vec::with_capacity(jobs.len());
    for job in jobs {
        match fs::create_dir_all(&job.output_dir) {
            Ok(()) => runnable.push(job),
            Err(e) => summary.record(JobResult {
                sample: job.sample.clone(),
                command: format!("mkdir -p {}", job.output_dir.display()),
                outcome: JobOutcome::Failure {
                    status: None,
                    stderr: e.to_string(),
                },
            }),
        }
    }

    log::debug!(
        "Initializing thread pool with {} threads...",
        num_threads.map_or("default".to_string(), |n| n.to_string())
    );
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .thread_name(|i| format!("dihybrid-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;

    let (sender, receiver) = unbounded();
    pool.install(|| {
        runnable.par_iter().for_each_with(sender, |s, job| {
            log::debug!("Starting pbaa for {}", job.sample);
            let result = runner.run(job);
            if let Err(e) = s.send(result) {
                log::error!("Failed to send result for {}: {}", job.sample, e);
            }
        });
    });

    for result in receiver {
        log::debug!("{}: {:?}", result.sample, result.outcome);
        summary.record(result);
    }
    Ok(summary)
}
