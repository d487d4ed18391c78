mod dispatch;
mod pbaa;
mod state;

pub use dispatch::{dispatch, ClusterJob, DispatchSummary, JobOutcome, JobResult, JobRunner};
pub use pbaa::PbaaRunner;
pub use state::{has_cluster_outputs, infer_state, plan_dispatch, DispatchPlan, SampleState};
