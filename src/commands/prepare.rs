use crate::cli::PrepareArgs;
use crate::utils::{convert_bam_to_fastq, get_bam_header, get_sample_name, Result, Workspace};
use std::{fs, time};

pub fn prepare(args: PrepareArgs) -> Result<()> {
    if args.sample_name.is_some() && args.bam_paths.len() > 1 {
        return Err("--sample-name can only be used with a single BAM file".into());
    }
    let start_timer = time::Instant::now();
    let workspace = Workspace::new(&args.workdir);
    let fastq_dir = workspace.fastq_dir();
    fs::create_dir_all(&fastq_dir)
        .map_err(|e| format!("Failed to create {}: {}", fastq_dir.display(), e))?;

    for bam_path in &args.bam_paths {
        let sample = match &args.sample_name {
            Some(name) => name.clone(),
            None => get_sample_name(bam_path, &get_bam_header(bam_path)?)?,
        };
        let reads_path = workspace.reads_path(&sample);
        let num_reads =
            convert_bam_to_fastq(bam_path, &reads_path, &workspace.reads_index_path(&sample))?;
        log::info!(
            "{}: wrote {} reads to {}",
            sample,
            num_reads,
            reads_path.display()
        );
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}
