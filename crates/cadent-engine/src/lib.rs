pub mod detection;
pub mod error;
pub mod feed;
pub mod report;

pub use detection::cadence::{CadenceResult, Frequency};
pub use detection::pipeline::{detect, detect_with_policy, detect_with_trace};
pub use detection::policy::{DETECTION_POLICY_V1, DETECTION_POLICY_VERSION, DetectionPolicy};
pub use detection::trace::{ClusterResolution, GroupSkip, RejectStage, RunTrace};
pub use detection::types::{DetectionOutcome, Direction, Transaction};
pub use error::{EngineError, EngineResult};
pub use feed::{FeedBatch, FeedIssue, parse_feed};
pub use report::{FailureEnvelope, SuccessEnvelope};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
