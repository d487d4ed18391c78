mod caller;
mod clusters;
mod tally;
mod writers;

pub use caller::{reverse_complement, CallHaplotype, HaplotypeCaller};
pub use clusters::{
    parse_cluster_header, read_cluster_file, read_clusters, ClusterHeader, ClusterRecord,
    ClusterRecords,
};
pub use tally::{analyze_clusters, analyze_workspace, AnalysisReport, HaplotypeCall, SampleTally};
pub use writers::{write_cluster_table, write_count_table};
