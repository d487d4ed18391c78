mod align;
mod bam_utils;
mod gene;
mod io_utils;
mod readers;
mod util;
mod workspace;

pub use align::AlignScoring;
pub use bam_utils::{convert_bam_to_fastq, get_bam_header, get_sample_name, FastqWriter};
pub use gene::{
    Gene, GeneConfig, CHIMERA_SENTINEL, MIN_CLUSTER_FREQUENCY, PBAA_DEFAULTS,
    SINGLETON_READ_COUNT, SLURM_DEFAULTS,
};
pub use io_utils::{count_lines, create_writer};
pub use readers::{open_fasta_reader, read_guide_sequence, record_header};
pub use util::{handle_error_and_exit, require_executable, Result};
pub use workspace::Workspace;
