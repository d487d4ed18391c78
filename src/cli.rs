use crate::utils::{AlignScoring, Gene, Result};
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="dihybrid",
          version=&**FULL_VERSION,
          about="Two-SNP haplotype calling from pbaa amplicon clusters",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(global = true)]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Run pbaa clustering for every sample that needs it")]
    Cluster(ClusterArgs),
    #[clap(about = "Submit the clustering stage as a Slurm batch job")]
    Submit(SubmitArgs),
    #[clap(about = "Call haplotypes from pbaa clusters and tally reads per sample")]
    Haplotype(HaplotypeArgs),
    #[clap(about = "Convert unaligned BAM files into indexed per-sample FASTQ")]
    Prepare(PrepareArgs),
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct ClusterArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(help = "Gene to genotype (case-insensitive)")]
    #[clap(value_name = "GENE")]
    #[arg(value_parser = gene_from_string)]
    pub gene: Gene,

    #[clap(short = 'w')]
    #[clap(long = "workdir")]
    #[clap(help = "Directory containing fastq/, guides/ and execution/")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[arg(value_parser = check_dir_exists)]
    pub workdir: PathBuf,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of concurrent pbaa runs [default: all cores]")]
    #[clap(value_name = "THREADS")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: Option<usize>,

    #[clap(long = "samples")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Comma-separated samples to cluster, bypassing sample discovery")]
    #[clap(value_delimiter = ',')]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub samples: Option<Vec<String>>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "pbaa-option")]
    #[clap(value_name = "OPTION")]
    #[clap(help = "Extra option passed to pbaa cluster (repeatable)")]
    #[clap(allow_hyphen_values = true)]
    pub pbaa_options: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct SubmitArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(help = "Gene to genotype (case-insensitive)")]
    #[clap(value_name = "GENE")]
    #[arg(value_parser = gene_from_string)]
    pub gene: Gene,

    #[clap(short = 'w')]
    #[clap(long = "workdir")]
    #[clap(help = "Directory containing fastq/, guides/ and execution/")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[arg(value_parser = check_dir_exists)]
    pub workdir: PathBuf,

    #[clap(long = "slurm-option")]
    #[clap(value_name = "OPTION")]
    #[clap(help = "Slurm resource flag replacing the defaults (repeatable)")]
    #[clap(allow_hyphen_values = true)]
    pub slurm_options: Vec<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "pbaa-option")]
    #[clap(value_name = "OPTION")]
    #[clap(help = "Extra option passed to pbaa cluster (repeatable)")]
    #[clap(allow_hyphen_values = true)]
    pub pbaa_options: Vec<String>,

    #[clap(long = "dry-run")]
    #[clap(help = "Log the sbatch command instead of running it")]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct HaplotypeArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(help = "Gene to genotype (case-insensitive)")]
    #[clap(value_name = "GENE")]
    #[arg(value_parser = gene_from_string)]
    pub gene: Gene,

    #[clap(short = 'w')]
    #[clap(long = "workdir")]
    #[clap(help = "Directory containing fastq/, guides/ and execution/")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[arg(value_parser = check_dir_exists)]
    pub workdir: PathBuf,

    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(help = "Directory for the output tables [default: workdir]")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub output_dir: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "aln-scoring")]
    #[clap(value_name = "SCORING")]
    #[clap(help = "Local alignment scoring (non-negative values): MATCH,MISM,GAPO,GAPE")]
    #[clap(default_value = "2,1,4,1")]
    #[arg(value_parser = scoring_from_string)]
    pub aln_scoring: AlignScoring,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct PrepareArgs {
    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "bam")]
    #[clap(help = "Unaligned BAM file(s) with HiFi reads")]
    #[clap(value_name = "BAM")]
    #[clap(num_args = 1..)]
    #[arg(value_parser = check_file_exists)]
    pub bam_paths: Vec<PathBuf>,

    #[clap(short = 'w')]
    #[clap(long = "workdir")]
    #[clap(help = "Directory receiving fastq/")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[arg(value_parser = check_dir_exists)]
    pub workdir: PathBuf,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample-name")]
    #[clap(value_name = "SAMPLE_NAME")]
    #[clap(help = "Sample name (single BAM only) [default: read group SM or file stem]")]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub sample_name: Option<String>,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn gene_from_string(s: &str) -> Result<Gene> {
    s.parse()
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_sample_name_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Sample name cannot be an empty string".to_string())
    } else if s.contains('/') {
        Err(format!("Sample name cannot contain '/': {}", s))
    } else {
        Ok(s.to_string())
    }
}

fn scoring_from_string(s: &str) -> Result<AlignScoring> {
    const NUM_EXPECTED_VALUES: usize = 4;
    let values: Vec<i32> = s.split(',').filter_map(|x| x.parse().ok()).collect();
    if values.len() != NUM_EXPECTED_VALUES {
        return Err(format!(
            "Expected {} comma-separated values in scoring. Got {} -> {}",
            NUM_EXPECTED_VALUES,
            values.len(),
            s
        ));
    }

    if values.iter().any(|&val| val < 0) {
        return Err(format!(
            "Negative values are not allowed in scoring. Got {}.",
            s
        ));
    }

    if values[0] == 0 {
        return Err("Match score must be positive".to_string());
    }

    Ok(AlignScoring {
        match_scr: values[0],
        mism_scr: values[1],
        gapo_scr: values[2],
        gape_scr: values[3],
    })
}
