use super::{ClusterJob, JobOutcome, JobResult, JobRunner};
use crate::utils::{GeneConfig, PBAA_DEFAULTS};
use itertools::Itertools;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// Invokes `pbaa cluster [options] <guide> <reads> <prefix>`.
#[derive(Debug, Clone)]
pub struct PbaaRunner {
    executable: PathBuf,
    guide_path: PathBuf,
    options: Vec<String>,
}

impl PbaaRunner {
    /// Options are the gene-specific flags, then the global defaults, then
    /// any user-supplied extras.
    pub fn new(executable: &Path, gene: &GeneConfig, extra_options: &[String]) -> Self {
        let options = gene
            .pbaa_options()
            .iter()
            .cloned()
            .chain(PBAA_DEFAULTS.iter().map(|o| o.to_string()))
            .chain(extra_options.iter().cloned())
            .collect();
        Self {
            executable: executable.to_path_buf(),
            guide_path: gene.guide_path().clone(),
            options,
        }
    }

    pub fn args(&self, job: &ClusterJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["cluster".into()];
        args.extend(self.options.iter().map(OsString::from));
        args.push(self.guide_path.clone().into_os_string());
        args.push(job.reads_path.clone().into_os_string());
        args.push(job.output_prefix.clone().into_os_string());
        args
    }

    pub fn command_line(&self, job: &ClusterJob) -> String {
        std::iter::once(self.executable.as_os_str().to_owned())
            .chain(self.args(job))
            .map(|arg| arg.to_string_lossy().to_string())
            .join(" ")
    }
}

impl JobRunner for PbaaRunner {
    fn run(&self, job: &ClusterJob) -> JobResult {
        let command = self.command_line(job);
        log::debug!("{}", command);
        let outcome = match Command::new(&self.executable)
            .args(self.args(job))
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => {
                JobOutcome::classify(output.status.success(), output.status.code(), &output.stderr)
            }
            Err(e) => JobOutcome::Failure {
                status: None,
                stderr: format!("Failed to execute {}: {}", self.executable.display(), e),
            },
        };
        JobResult {
            sample: job.sample.clone(),
            command,
            outcome,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    fn fake_pbaa(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn job(dir: &Path) -> ClusterJob {
        ClusterJob {
            sample: "s1".to_string(),
            reads_path: dir.join("fastq/s1.fastq"),
            output_dir: dir.join("execution/s1"),
            output_prefix: dir.join("execution/s1/s1"),
        }
    }

    fn gene() -> GeneConfig {
        GeneConfig::new("g", (1, 2), vec!["ac".to_string()], "ACGT".to_string())
            .unwrap()
            .with_guide_path("guides/g.fa")
    }

    #[test]
    fn command_line_orders_options_before_positionals() {
        let runner = PbaaRunner::new(Path::new("pbaa"), &gene(), &["--seed=1".to_string()]);
        let job = ClusterJob {
            sample: "s1".to_string(),
            reads_path: PathBuf::from("fastq/s1.fastq"),
            output_dir: PathBuf::from("execution/s1"),
            output_prefix: PathBuf::from("execution/s1/s1"),
        };
        assert_eq!(
            runner.command_line(&job),
            "pbaa cluster --max-reads-per-guide=1000000 --max-uchime-score=0.01 --seed=1 guides/g.fa fastq/s1.fastq execution/s1/s1"
        );
    }

    #[test]
    fn run_classifies_process_outcomes() {
        let dir = TempDir::new().unwrap();
        let job = job(dir.path());

        let clean = fake_pbaa(dir.path(), "pbaa_clean", "exit 0");
        let result = PbaaRunner::new(&clean, &gene(), &[]).run(&job);
        assert_eq!(result.outcome, JobOutcome::Clean);
        assert!(result.command.ends_with("execution/s1/s1"));

        let warn = fake_pbaa(dir.path(), "pbaa_warn", "echo 'low coverage' >&2\nexit 0");
        let result = PbaaRunner::new(&warn, &gene(), &[]).run(&job);
        assert_eq!(
            result.outcome,
            JobOutcome::Warning {
                stderr: "low coverage\n".to_string()
            }
        );

        let fail = fake_pbaa(dir.path(), "pbaa_fail", "echo 'bad guide' >&2\nexit 3");
        let result = PbaaRunner::new(&fail, &gene(), &[]).run(&job);
        assert_eq!(
            result.outcome,
            JobOutcome::Failure {
                status: Some(3),
                stderr: "bad guide\n".to_string()
            }
        );
    }

    #[test]
    fn run_missing_executable_is_failure() {
        let dir = TempDir::new().unwrap();
        let runner = PbaaRunner::new(&dir.path().join("missing"), &gene(), &[]);
        let result = runner.run(&job(dir.path()));
        assert!(matches!(
            result.outcome,
            JobOutcome::Failure { status: None, .. }
        ));
    }
}
