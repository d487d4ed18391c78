use super::{HaplotypeCall, SampleTally};
use crate::utils::{GeneConfig, Result};
use itertools::Itertools;
use std::io::Write;

pub fn write_cluster_table<W: Write>(mut writer: W, calls: &[HaplotypeCall]) -> Result<()> {
    let io_err = |e: std::io::Error| format!("Failed to write cluster table: {}", e);
    writeln!(writer, "sample_name,cluster_name,haplotype").map_err(io_err)?;
    for call in calls {
        writeln!(writer, "{},{},{}", call.sample, call.cluster, call.haplotype).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// One row per sample; haplotype columns follow the gene's configured order.
pub fn write_count_table<W: Write>(
    mut writer: W,
    gene: &GeneConfig,
    tallies: &[SampleTally],
) -> Result<()> {
    let io_err = |e: std::io::Error| format!("Failed to write haplotype counts: {}", e);
    let header = ["sample_name", "total_reads", "reads_passing_qc"]
        .iter()
        .map(|s| s.to_string())
        .chain(
            gene.haplotypes()
                .iter()
                .map(|h| format!("haplotype_{}_reads", h)),
        )
        .join("\t");
    writeln!(writer, "{}", header).map_err(io_err)?;
    for tally in tallies {
        if tally.counts.len() != gene.haplotypes().len() {
            return Err(format!(
                "{}: expected {} haplotype counts, found {}",
                tally.sample,
                gene.haplotypes().len(),
                tally.counts.len()
            ));
        }
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            tally.sample,
            tally.total_reads,
            tally.reads_passing_qc,
            tally.counts.iter().join("\t")
        )
        .map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}
