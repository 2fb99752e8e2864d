//! Snapshot persistence
//!
//! Leaderboard snapshots are append-only: the scheduler inserts one row per
//! category per run and nothing ever rewrites or deletes them. The same store
//! also keeps the task run log (one upserted row per task name).
//!
//! # Example
//!
//! ```rust,ignore
//! use podium::storage::{SnapshotStore, SqliteSnapshotStore};
//!
//! let store = SqliteSnapshotStore::new("data/podium.db")?;
//! store.save(Category::MostLiked, &rankings, Utc::now())?;
//! let latest = store.find_all_latest_per_category(&Category::all(), Duration::days(7), Utc::now())?;
//! ```

pub mod repository;

pub use repository::{
    create_memory_store, create_sqlite_store, window_start, LatestSnapshots,
    MemorySnapshotStore, SharedSnapshotStore, SnapshotStore, SqliteSnapshotStore,
};
