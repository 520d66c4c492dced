//! Report pipeline engine: duplicate detection, the report/task lifecycle
//! state machine, and the task coordinator that drives it.

pub mod coordinator;
pub mod dedup;
pub mod intake;
pub mod lifecycle;
pub mod oracle;

pub use coordinator::{TaskCoordinator, TaskMeta};
pub use dedup::{DuplicateDetector, DuplicateMatch};
pub use intake::{NewReport, ReportIntake, SubmissionOutcome};
pub use oracle::{ConfidenceOracle, ConfidenceResult, RESOLUTION_CONFIDENCE_THRESHOLD};
