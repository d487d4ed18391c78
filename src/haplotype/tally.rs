use super::{read_clusters, CallHaplotype, ClusterRecord};
use crate::execution::has_cluster_outputs;
use crate::utils::{count_lines, GeneConfig, Result, Workspace, MIN_CLUSTER_FREQUENCY};
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq)]
pub struct HaplotypeCall {
    pub sample: String,
    pub cluster: String,
    pub haplotype: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleTally {
    pub sample: String,
    pub total_reads: usize,
    pub reads_passing_qc: usize,
    /// Read counts in the gene's haplotype order.
    pub counts: Vec<u64>,
}

#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub calls: Vec<HaplotypeCall>,
    pub tallies: Vec<SampleTally>,
    pub incomplete: Vec<String>,
}

/// Calls every cluster at or above the frequency cutoff and sums read counts
/// per haplotype. A code outside the configured set is a hard error.
pub fn analyze_clusters<I, C>(
    sample: &str,
    clusters: I,
    gene: &GeneConfig,
    caller: &mut C,
) -> Result<(Vec<HaplotypeCall>, Vec<u64>)>
where
    I: IntoIterator<Item = Result<ClusterRecord>>,
    C: CallHaplotype,
{
    let mut calls = Vec::new();
    let mut counts = vec![0; gene.haplotypes().len()];
    for record in clusters {
        let record = record?;
        if record.frequency < MIN_CLUSTER_FREQUENCY {
            continue;
        }
        let haplotype = caller.call(&record.seq);
        let index = gene.haplotype_index(&haplotype).ok_or_else(|| {
            format!(
                "haplotype {} not among possible haplotypes ({}) (sample_name={}, cluster_name={})",
                haplotype,
                gene.haplotypes().iter().join(", "),
                sample,
                record.id
            )
        })?;
        log::debug!(
            "{}: cluster {} ({} reads) called {}",
            sample,
            record.id,
            record.read_count,
            haplotype
        );
        counts[index] += record.read_count;
        calls.push(HaplotypeCall {
            sample: sample.to_string(),
            cluster: record.id,
            haplotype,
        });
    }
    Ok((calls, counts))
}

/// Analyzes every execution directory holding both cluster files. Samples
/// missing either file are listed, not analyzed. Any error, including a
/// malformed cluster header, aborts the whole analysis.
pub fn analyze_workspace<C: CallHaplotype>(
    workspace: &Workspace,
    gene: &GeneConfig,
    caller: &mut C,
) -> Result<AnalysisReport> {
    let execution_root = workspace.execution_root();
    if !execution_root.is_dir() {
        return Err(format!(
            "No pbaa execution directory found at {}. Run pbaa first.",
            execution_root.display()
        ));
    }
    let samples = workspace
        .list_execution_dirs()
        .map_err(|e| format!("Failed to list {}: {}", execution_root.display(), e))?;

    let mut report = AnalysisReport::default();
    for sample in samples {
        if !has_cluster_outputs(workspace, &sample) {
            report.incomplete.push(sample);
            continue;
        }
        let clusters = read_clusters(workspace, &sample)?;
        let (calls, counts) = analyze_clusters(&sample, clusters, gene, caller)?;
        let total_reads = count_lines(&workspace.reads_index_path(&sample))?;
        let reads_passing_qc = count_lines(&workspace.read_info_path(&sample))?;
        log::info!(
            "{}: {} clusters called, {} of {} reads passed QC",
            sample,
            calls.len(),
            reads_passing_qc,
            total_reads
        );
        report.calls.extend(calls);
        report.tallies.push(SampleTally {
            sample,
            total_reads,
            reads_passing_qc,
            counts,
        });
    }
    Ok(report)
}
