use crate::cli::HaplotypeArgs;
use crate::haplotype::{
    analyze_workspace, write_cluster_table, write_count_table, AnalysisReport, HaplotypeCaller,
};
use crate::utils::{create_writer, AlignScoring, GeneConfig, Result, Workspace};
use itertools::Itertools;
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time,
};

pub const CLUSTER_TABLE_NAME: &str = "clusters_by_haplotype";
pub const COUNT_TABLE_NAME: &str = "haplotype_counts";

pub fn haplotype(args: HaplotypeArgs) -> Result<()> {
    let start_timer = time::Instant::now();
    let workspace = Workspace::new(&args.workdir);
    let gene = GeneConfig::load(args.gene, &workspace)?;
    let output_dir = args.output_dir.unwrap_or_else(|| args.workdir.clone());

    run_haplotyping(&workspace, &gene, &args.aln_scoring, &output_dir)?;
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

/// Analyzes every sample before writing anything, so a failure leaves no
/// partial tables behind.
pub fn run_haplotyping(
    workspace: &Workspace,
    gene: &GeneConfig,
    scoring: &AlignScoring,
    output_dir: &Path,
) -> Result<AnalysisReport> {
    let mut caller = HaplotypeCaller::new(gene, scoring);
    let report = analyze_workspace(workspace, gene, &mut caller)?;

    if !report.incomplete.is_empty() {
        log::warn!(
            "pbaa execution(s) for {} samples are incomplete: {}",
            report.incomplete.len(),
            report.incomplete.iter().join(" ")
        );
    }
    log::info!(
        "Called {} clusters across {} samples",
        report.calls.len(),
        report.tallies.len()
    );

    let prefix = |name: &str| output_dir.join(name).to_string_lossy().to_string();
    create_writer(&prefix(CLUSTER_TABLE_NAME), "csv", |path| {
        write_cluster_table(open_table(path)?, &report.calls)
    })?;
    create_writer(&prefix(COUNT_TABLE_NAME), "tsv", |path| {
        write_count_table(open_table(path)?, gene, &report.tallies)
    })?;
    Ok(report)
}

fn open_table(path: &str) -> Result<BufWriter<File>> {
    File::create(PathBuf::from(path))
        .map(BufWriter::new)
        .map_err(|e| format!("Failed to create {}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotype::reverse_complement;
    use std::fs;
    use tempfile::TempDir;

    const REFERENCE: &str = "GATCCTAGGCATTGACCGTAAGCTTGAGCCATGTCAGGTTCAACGTGAGT";

    fn gene() -> GeneConfig {
        GeneConfig::new(
            "test",
            (3, 7),
            ["ca", "ct", "ga", "gt"].map(String::from).to_vec(),
            REFERENCE.to_string(),
        )
        .unwrap()
    }

    /// Reference with the given bases at 1-based positions 3 and 7.
    fn haplotype_seq(b1: char, b2: char) -> String {
        let mut bases: Vec<char> = REFERENCE.chars().collect();
        bases[2] = b1;
        bases[6] = b2;
        bases.into_iter().collect()
    }

    fn header(sample: &str, id: usize, reads: u64, freq: f64) -> String {
        format!(
            ">{}_test_cluster-{}_ReadCount-{} uchime_score:-1 cluster_freq:{}",
            sample, id, reads, freq
        )
    }

    fn write_sample(ws: &Workspace, sample: &str, passed: &[String], failed: &[String]) {
        fs::create_dir_all(ws.execution_dir(sample)).unwrap();
        fs::create_dir_all(ws.fastq_dir()).unwrap();
        let fasta = |lines: &[String]| lines.iter().map(|line| format!("{}\n", line)).join("");
        fs::write(ws.passed_clusters_path(sample), fasta(passed)).unwrap();
        fs::write(ws.failed_clusters_path(sample), fasta(failed)).unwrap();
        fs::write(ws.read_info_path(sample), "r1\nr2\nr3\nr4\n").unwrap();
        fs::write(ws.reads_index_path(sample), "r1\nr2\nr3\nr4\nr5\n").unwrap();
    }

    #[test]
    fn end_to_end_tables() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        write_sample(
            &ws,
            "s1",
            &[
                header("s1", 0, 42, 0.7),
                haplotype_seq('C', 'T'),
                header("s1", 1, 3, 0.01),
                haplotype_seq('G', 'A'),
                header("s1", 2, 1, 0.2),
                haplotype_seq('G', 'T'),
            ],
            &[header("s1", 3, 17, 0.25), reverse_complement(&haplotype_seq('G', 'A'))],
        );
        // Incomplete: no failed cluster file
        fs::create_dir_all(ws.execution_dir("s2")).unwrap();
        fs::write(ws.passed_clusters_path("s2"), "").unwrap();

        let report =
            run_haplotyping(&ws, &gene(), &AlignScoring::default(), dir.path()).unwrap();
        assert_eq!(report.incomplete, vec!["s2"]);

        let clusters = fs::read_to_string(dir.path().join("clusters_by_haplotype.csv")).unwrap();
        assert_eq!(
            clusters,
            "sample_name,cluster_name,haplotype\ns1,0,ct\ns1,3,ga\n"
        );
        let counts = fs::read_to_string(dir.path().join("haplotype_counts.tsv")).unwrap();
        assert_eq!(
            counts,
            "sample_name\ttotal_reads\treads_passing_qc\thaplotype_ca_reads\thaplotype_ct_reads\thaplotype_ga_reads\thaplotype_gt_reads\n\
             s1\t5\t4\t0\t42\t17\t0\n"
        );
    }

    #[test]
    fn unexpected_haplotype_writes_no_tables() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        write_sample(
            &ws,
            "s1",
            &[header("s1", 0, 42, 0.7), haplotype_seq('C', 'T')],
            &[],
        );
        write_sample(
            &ws,
            "s2",
            &[header("s2", 5, 30, 0.9), haplotype_seq('T', 'T')],
            &[],
        );

        let err =
            run_haplotyping(&ws, &gene(), &AlignScoring::default(), dir.path()).unwrap_err();
        assert_eq!(
            err,
            "haplotype tt not among possible haplotypes (ca, ct, ga, gt) (sample_name=s2, cluster_name=5)"
        );
        assert!(!dir.path().join("clusters_by_haplotype.csv").exists());
        assert!(!dir.path().join("haplotype_counts.tsv").exists());
    }

    #[test]
    fn malformed_cluster_header_writes_no_tables() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        write_sample(
            &ws,
            "good",
            &[header("good", 0, 42, 0.7), haplotype_seq('C', 'T')],
            &[],
        );
        write_sample(
            &ws,
            "bad",
            &[
                ">bad_test_cluster-0_ReadCount-30 uchime_score:-1".to_string(),
                haplotype_seq('G', 'A'),
            ],
            &[],
        );

        let err =
            run_haplotyping(&ws, &gene(), &AlignScoring::default(), dir.path()).unwrap_err();
        assert!(err.contains("Malformed cluster header (missing cluster_freq)"));
        assert!(!dir.path().join("clusters_by_haplotype.csv").exists());
        assert!(!dir.path().join("haplotype_counts.tsv").exists());
    }

    #[test]
    fn missing_execution_directory_err() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let err =
            run_haplotyping(&ws, &gene(), &AlignScoring::default(), dir.path()).unwrap_err();
        assert!(err.starts_with("No pbaa execution directory found"));
    }
}
