//! Report Store Adapter: narrow async interface over the external
//! document store, plus an in-memory implementation for tests and local
//! runs.
//!
//! Documents are addressed hierarchically:
//! reports at `{category}Reports/{geohash}/reports/{reporterId}/userReports/{reportId}`,
//! tasks flat at `tasks/{taskId}`, notifications flat at
//! `notifications/{notificationId}`.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{BatchWrite, DocumentStore};
