use crate::cli::ClusterArgs;
use crate::execution::{dispatch, plan_dispatch, ClusterJob, DispatchSummary, JobRunner, PbaaRunner};
use crate::utils::{require_executable, GeneConfig, Result, Workspace};
use std::time;

pub fn cluster(args: ClusterArgs) -> Result<()> {
    let pbaa = require_executable("pbaa")?;
    let workspace = Workspace::new(&args.workdir);
    let gene = GeneConfig::load(args.gene, &workspace)?;

    let samples = match args.samples {
        Some(samples) => indexed_samples(&workspace, samples)?,
        None => plan_dispatch(&workspace)?.samples,
    };

    let runner = PbaaRunner::new(&pbaa, &gene, &args.pbaa_options);
    run_clustering(&workspace, &samples, &runner, args.num_threads)?;
    Ok(())
}

/// Keeps the named samples whose reads are indexed.
pub fn indexed_samples(workspace: &Workspace, samples: Vec<String>) -> Result<Vec<String>> {
    let (indexed, unindexed): (Vec<_>, Vec<_>) = samples
        .into_iter()
        .partition(|sample| workspace.reads_index_path(sample).is_file());
    for sample in &unindexed {
        log::warn!("No index file found for {}, skipping.", sample);
    }
    if indexed.is_empty() {
        return Err("No samples found.".to_string());
    }
    Ok(indexed)
}

pub fn build_jobs(workspace: &Workspace, samples: &[String]) -> Vec<ClusterJob> {
    samples
        .iter()
        .map(|sample| ClusterJob {
            sample: sample.clone(),
            reads_path: workspace.reads_path(sample),
            output_dir: workspace.execution_dir(sample),
            output_prefix: workspace.output_prefix(sample),
        })
        .collect()
}

pub fn run_clustering<R: JobRunner>(
    workspace: &Workspace,
    samples: &[String],
    runner: &R,
    num_threads: Option<usize>,
) -> Result<DispatchSummary> {
    let start_timer = time::Instant::now();
    log::info!("Clustering {} samples", samples.len());
    let jobs = build_jobs(workspace, samples);
    let summary = dispatch(&jobs, runner, num_threads)?;
    summary.report();
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{infer_state, JobOutcome, JobResult, SampleState};
    use std::fs;
    use tempfile::TempDir;

    /// Writes pbaa-shaped outputs for every sample except `broken`.
    struct FakePbaa {
        broken: &'static str,
    }

    impl JobRunner for FakePbaa {
        fn run(&self, job: &ClusterJob) -> JobResult {
            let outcome = if job.sample == self.broken {
                fs::write(
                    format!("{}_passed_cluster_sequences.fasta", job.output_prefix.display()),
                    "",
                )
                .unwrap();
                JobOutcome::classify(false, Some(1), b"segfault")
            } else {
                for kind in ["passed", "failed"] {
                    fs::write(
                        format!("{}_{}_cluster_sequences.fasta", job.output_prefix.display(), kind),
                        format!(
                            ">{}_g_cluster-0_ReadCount-5 uchime_score:-1 cluster_freq:1.0\nACGT\n",
                            job.sample
                        ),
                    )
                    .unwrap();
                }
                JobOutcome::Clean
            };
            JobResult {
                sample: job.sample.clone(),
                command: format!("pbaa cluster {}", job.sample),
                outcome,
            }
        }
    }

    #[test]
    fn failed_samples_are_retried_on_the_next_run() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.fastq_dir()).unwrap();
        for sample in ["a", "b", "c"] {
            fs::write(ws.reads_path(sample), "").unwrap();
            fs::write(ws.reads_index_path(sample), "").unwrap();
        }

        let plan = plan_dispatch(&ws).unwrap();
        let summary =
            run_clustering(&ws, &plan.samples, &FakePbaa { broken: "b" }, Some(2)).unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(infer_state(&ws, "a"), SampleState::Complete);
        assert_eq!(infer_state(&ws, "b"), SampleState::Incomplete);
        assert_eq!(infer_state(&ws, "c"), SampleState::Complete);

        let plan = plan_dispatch(&ws).unwrap();
        assert_eq!(plan.samples, vec!["b"]);
        assert_eq!(plan.purged, vec!["b"]);
        let summary = run_clustering(&ws, &plan.samples, &FakePbaa { broken: "" }, None).unwrap();
        assert_eq!(summary.failures, 0);
        assert_eq!(infer_state(&ws, "b"), SampleState::Complete);

        assert!(plan_dispatch(&ws).is_err());
    }

    #[test]
    fn named_samples_without_index_are_skipped() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.fastq_dir()).unwrap();
        for sample in ["a", "b"] {
            fs::write(ws.reads_path(sample), "").unwrap();
        }
        fs::write(ws.reads_index_path("b"), "").unwrap();

        let names = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(indexed_samples(&ws, names(&["a", "b"])).unwrap(), vec!["b"]);
        assert_eq!(
            indexed_samples(&ws, names(&["a"])),
            Err("No samples found.".to_string())
        );
    }
}
