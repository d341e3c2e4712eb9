//! Pipeline orchestration: run records, lifecycle events, and the staged
//! background executor.

mod events;
mod orchestrator;
mod run;

pub use events::{EventBus, PipelineEvent};
pub use orchestrator::{Orchestrator, RunHandle, StageContext, RESAMPLE_INTERVAL_MINUTES};
pub use run::{
    PipelineRun, PreprocessReport, RunId, RunStatus, Stage, StageOutcome, StageRecord,
    StageResult, StageSummary,
};
