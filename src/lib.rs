//! podium - Leaderboard ranking, snapshot and rank-delta engine
//!
//! Ranks community members across a fixed set of leaderboard categories,
//! persists each ranking as a timestamped snapshot, and answers
//! "where do I stand and how did I move" from those snapshots.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`ranking`] - Category descriptors and the ranking computer
//! - [`storage`] - Snapshot and run-log persistence (SQLite, in-memory)
//! - [`scheduler`] - Snapshot runs, run reports and the daily trigger
//! - [`cache`] - Two-read batch cache over the latest snapshots
//! - [`delta`] - Rank movement between current and previous snapshots
//! - [`badges`] - Gold/silver/bronze podium badges
//! - [`digest`] - Per-subject rank digests and rate-limited delivery
//! - [`api`] - HTTP admin trigger and badge endpoints
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use podium::ranking::{RankingComputer, SqliteActivitySource};
//! use podium::scheduler::SnapshotScheduler;
//! use podium::storage::create_sqlite_store;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = create_sqlite_store("data/podium.db")?;
//!     let source = Arc::new(SqliteActivitySource::new("data/activity.db")?);
//!     let scheduler = SnapshotScheduler::new(store, RankingComputer::new(source));
//!
//!     let report = scheduler.run("cli");
//!     println!("{} snapshots written", report.snapshots_written());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod badges;
pub mod cache;
pub mod config;
pub mod delta;
pub mod digest;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ranking;
pub mod scheduler;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::badges::{Badge, BadgeExtractor, Medal};
    pub use crate::cache::SnapshotCache;
    pub use crate::config::Config;
    pub use crate::delta::{RankDelta, RankDeltaEngine};
    pub use crate::error::{Error, ErrorCategory, PodiumErrorTrait, Result};
    pub use crate::models::{Category, RankingEntry, RunLogEntry, RunStatus, Snapshot, SubjectId};
    pub use crate::ranking::RankingComputer;
    pub use crate::scheduler::{RunReport, SnapshotScheduler};
    pub use crate::storage::{SharedSnapshotStore, SnapshotStore};
}

// Direct re-exports for convenience
pub use models::{Category, RankingEntry, RunStatus, Snapshot, SubjectId};
