//! Media preprocessing and upload orchestration.
//!
//! The publish-side half of the pipeline: metadata scrubbing (fail-open at
//! the pipeline level), duration probing and thumbnail extraction, and the
//! concurrent dual-destination upload orchestrator.

pub mod engine;
pub mod preprocess;
pub mod probe;
pub mod scrub;
pub mod upload;

pub use engine::{FfmpegEngine, TransformEngine, TransformEngineHandle};
pub use preprocess::{PreparedMedia, Preprocessor};
pub use probe::{FfmpegProber, MediaProber, ProbeError};
pub use scrub::{MetadataScrubber, ScrubError};
pub use upload::{
    AuthorizedGrantProvider, CompletedTransfer, GrantProvider, ProgressEvent, TransferTask,
    UploadError, UploadOrchestrator, UploadOutcome,
};
