use std::path::{Path, PathBuf};

pub const READS_EXTENSION: &str = "fastq";
pub const CLUSTERS_EXTENSION: &str = "fasta";

/// Directory layout shared by both pipeline stages.
///
/// ```text
/// <root>/fastq/<sample>.fastq
/// <root>/fastq/<sample>.fastq.fai
/// <root>/guides/<guide>
/// <root>/execution/<sample>/<sample>_passed_cluster_sequences.fasta
/// <root>/execution/<sample>/<sample>_failed_cluster_sequences.fasta
/// <root>/execution/<sample>/<sample>_read_info.txt
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn fastq_dir(&self) -> PathBuf {
        self.root.join("fastq")
    }

    pub fn guides_dir(&self) -> PathBuf {
        self.root.join("guides")
    }

    pub fn execution_root(&self) -> PathBuf {
        self.root.join("execution")
    }

    pub fn reads_path(&self, sample: &str) -> PathBuf {
        self.fastq_dir()
            .join(format!("{}.{}", sample, READS_EXTENSION))
    }

    pub fn reads_index_path(&self, sample: &str) -> PathBuf {
        self.fastq_dir()
            .join(format!("{}.{}.fai", sample, READS_EXTENSION))
    }

    pub fn execution_dir(&self, sample: &str) -> PathBuf {
        self.execution_root().join(sample)
    }

    /// Prefix handed to `pbaa cluster`; every output file name starts with it.
    pub fn output_prefix(&self, sample: &str) -> PathBuf {
        self.execution_dir(sample).join(sample)
    }

    pub fn passed_clusters_path(&self, sample: &str) -> PathBuf {
        self.execution_dir(sample).join(format!(
            "{}_passed_cluster_sequences.{}",
            sample, CLUSTERS_EXTENSION
        ))
    }

    pub fn failed_clusters_path(&self, sample: &str) -> PathBuf {
        self.execution_dir(sample).join(format!(
            "{}_failed_cluster_sequences.{}",
            sample, CLUSTERS_EXTENSION
        ))
    }

    pub fn read_info_path(&self, sample: &str) -> PathBuf {
        self.execution_dir(sample)
            .join(format!("{}_read_info.txt", sample))
    }

    /// Sample names derived from `fastq/<sample>.fastq`, sorted.
    pub fn list_read_samples(&self) -> std::io::Result<Vec<String>> {
        let suffix = format!(".{}", READS_EXTENSION);
        list_dir(&self.fastq_dir(), |path| path.is_file())
            .map(|names| {
                names
                    .into_iter()
                    .filter_map(|name| name.strip_suffix(&suffix).map(|s| s.to_string()))
                    .filter(|name| !name.is_empty())
                    .collect()
            })
    }

    /// Names of the per-sample directories under `execution/`, sorted.
    pub fn list_execution_dirs(&self) -> std::io::Result<Vec<String>> {
        list_dir(&self.execution_root(), |path| path.is_dir())
    }
}

fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> std::io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in dir.read_dir()? {
        let path = entry?.path();
        if !keep(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
