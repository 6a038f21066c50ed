//! Upload orchestration.
//!
//! Named transfer tasks run in parallel against their destination classes;
//! the orchestrator waits for every submitted task and reports either a
//! complete result set or a failure naming the task(s) that did not finish.

pub mod orchestrator;
pub mod task;

pub use orchestrator::{AuthorizedGrantProvider, GrantProvider, UploadOrchestrator};
pub use task::{
    CompletedTransfer, FailedTask, ProgressEvent, TransferTask, UploadError, UploadOutcome,
    TASK_FULL, TASK_PREVIEW, TASK_THUMBNAIL,
};
