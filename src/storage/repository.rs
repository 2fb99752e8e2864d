//! Snapshot repository abstraction
//!
//! Trait-based storage for leaderboard snapshots and the task run log, with a
//! SQLite implementation for production and an in-memory implementation for
//! tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │   SnapshotScheduler     SnapshotCache     BadgeExtractor    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 SnapshotStore (append-only)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                         │
//!                   ▼                         ▼
//!         ┌─────────────────┐       ┌─────────────────┐
//!         │     SQLite      │       │     Memory      │
//!         └─────────────────┘       └─────────────────┘
//! ```
//!
//! Snapshots are only ever inserted. The "latest per category" reads are
//! bulk queries: one statement covers every requested category.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::{Category, RankingEntry, RunLogEntry, RunStatus, Snapshot};

// ============================================================================
// Core Types
// ============================================================================

/// Latest snapshots on each side of a freshness window
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshots {
    /// Most recent snapshot taken inside the window, per category
    pub current: HashMap<Category, Snapshot>,
    /// Most recent snapshot taken before the window, per category
    pub previous: HashMap<Category, Snapshot>,
}

/// Start of the freshness window ending at `now`
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now - window
}

fn ensure_dense(category: Category, rankings: &[RankingEntry]) -> Result<()> {
    let dense = rankings
        .iter()
        .enumerate()
        .all(|(i, entry)| entry.rank as usize == i + 1);
    if !dense {
        anyhow::bail!("Refusing to save '{category}' snapshot: ranks are not exactly 1..=N");
    }
    Ok(())
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Durable, append-only snapshot storage
pub trait SnapshotStore: Send + Sync {
    /// Insert a new snapshot; never updates an existing one
    fn save(
        &self,
        category: Category,
        rankings: &[RankingEntry],
        taken_at: DateTime<Utc>,
    ) -> Result<Snapshot>;

    /// Most recent snapshot at or before `before` (or overall when `None`)
    fn find_latest(
        &self,
        category: Category,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<Snapshot>>;

    /// Most recent snapshot per category with `taken_at` in `[now - window, now]`
    ///
    /// One bulk read regardless of how many categories are requested.
    fn find_latest_in_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>>;

    /// Most recent snapshot per category with `taken_at < now - window`
    ///
    /// One bulk read regardless of how many categories are requested.
    fn find_latest_before_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>>;

    /// Current and previous snapshot for every category in exactly two reads
    fn find_all_latest_per_category(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<LatestSnapshots> {
        let current = self.find_latest_in_window(categories, window, now)?;
        let previous = self.find_latest_before_window(categories, window, now)?;
        Ok(LatestSnapshots { current, previous })
    }

    /// Count stored snapshots, optionally for one category
    fn count_snapshots(&self, category: Option<Category>) -> Result<usize>;

    /// Insert or replace the run log row for `entry.task_name`
    fn upsert_run_log(&self, entry: &RunLogEntry) -> Result<()>;

    /// Load the run log row for a task
    fn get_run_log(&self, task_name: &str) -> Result<Option<RunLogEntry>>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of [`SnapshotStore`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Create a new SQLite store
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;

        // WAL lets badge reads proceed while a run is writing
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "Snapshot store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot store connection mutex poisoned"))
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS leaderboard_snapshots (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category TEXT NOT NULL,
                    taken_at INTEGER NOT NULL,
                    rankings TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_leaderboard_snapshots_category_taken
                    ON leaderboard_snapshots(category, taken_at);

                CREATE TABLE IF NOT EXISTS task_run_log (
                    task_name TEXT PRIMARY KEY,
                    last_run_at INTEGER NOT NULL,
                    last_run_by TEXT NOT NULL,
                    status TEXT NOT NULL,
                    details TEXT NOT NULL
                );
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }

    /// Latest row per category matching `bounds` (internal helper)
    ///
    /// `bounds` is a SQL predicate over `taken_at` using positional
    /// parameters that follow the category list.
    fn latest_per_category(
        &self,
        categories: &[Category],
        bounds: &str,
        bound_values: &[i64],
    ) -> Result<HashMap<Category, Snapshot>> {
        if categories.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.lock()?;
        let placeholders: String = categories.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            r#"
            SELECT category, taken_at, rankings FROM (
                SELECT category, taken_at, rankings,
                    ROW_NUMBER() OVER (
                        PARTITION BY category ORDER BY taken_at DESC, id DESC
                    ) AS rn
                FROM leaderboard_snapshots
                WHERE category IN ({placeholders}) AND {bounds}
            )
            WHERE rn = 1
            "#
        );

        let values: Vec<Value> = categories
            .iter()
            .map(|c| Value::Text(c.id().to_string()))
            .chain(bound_values.iter().map(|v| Value::Integer(*v)))
            .collect();

        let mut stmt = conn
            .prepare(&query)
            .context("Failed to prepare latest-per-category query")?;

        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read latest snapshots")?;

        let mut latest = HashMap::with_capacity(rows.len());
        for (category, taken_at, rankings) in rows {
            let snapshot = decode_snapshot(&category, taken_at, &rankings)?;
            latest.insert(snapshot.category, snapshot);
        }
        Ok(latest)
    }
}

fn decode_snapshot(category: &str, taken_at_ms: i64, rankings: &str) -> Result<Snapshot> {
    let category = Category::from_id(category)
        .with_context(|| format!("Unknown category in snapshot row: {category}"))?;
    let taken_at = DateTime::from_timestamp_millis(taken_at_ms)
        .with_context(|| format!("Invalid snapshot timestamp: {taken_at_ms}"))?;
    let rankings: Vec<RankingEntry> = serde_json::from_str(rankings)
        .with_context(|| format!("Corrupt rankings payload for '{category}'"))?;

    Ok(Snapshot::new(category, taken_at, rankings))
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(
        &self,
        category: Category,
        rankings: &[RankingEntry],
        taken_at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        ensure_dense(category, rankings)?;
        let payload = serde_json::to_string(rankings).context("Failed to encode rankings")?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO leaderboard_snapshots (category, taken_at, rankings) VALUES (?1, ?2, ?3)",
            params![category.id(), taken_at.timestamp_millis(), payload],
        )
        .context("Failed to insert snapshot")?;

        // Round-trip the timestamp through storage precision
        let stored_at = DateTime::from_timestamp_millis(taken_at.timestamp_millis())
            .unwrap_or(taken_at);
        Ok(Snapshot::new(category, stored_at, rankings.to_vec()))
    }

    fn find_latest(
        &self,
        category: Category,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<Snapshot>> {
        let conn = self.lock()?;
        let bound = before.map(|b| b.timestamp_millis()).unwrap_or(i64::MAX);

        let row = conn
            .query_row(
                "SELECT category, taken_at, rankings FROM leaderboard_snapshots
                 WHERE category = ?1 AND taken_at <= ?2
                 ORDER BY taken_at DESC, id DESC LIMIT 1",
                params![category.id(), bound],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .context("Failed to load latest snapshot")?;

        row.map(|(c, t, r)| decode_snapshot(&c, t, &r)).transpose()
    }

    fn find_latest_in_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>> {
        let start = window_start(now, window).timestamp_millis();
        self.latest_per_category(
            categories,
            "taken_at >= ? AND taken_at <= ?",
            &[start, now.timestamp_millis()],
        )
    }

    fn find_latest_before_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>> {
        let start = window_start(now, window).timestamp_millis();
        self.latest_per_category(categories, "taken_at < ?", &[start])
    }

    fn count_snapshots(&self, category: Option<Category>) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = match category {
            Some(c) => conn.query_row(
                "SELECT COUNT(*) FROM leaderboard_snapshots WHERE category = ?1",
                params![c.id()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM leaderboard_snapshots", [], |row| {
                row.get(0)
            })?,
        };
        Ok(count as usize)
    }

    fn upsert_run_log(&self, entry: &RunLogEntry) -> Result<()> {
        let conn = self.lock()?;
        let details = serde_json::to_string(&entry.details).context("Failed to encode details")?;

        conn.execute(
            r#"
                INSERT INTO task_run_log (task_name, last_run_at, last_run_by, status, details)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(task_name) DO UPDATE SET
                    last_run_at = excluded.last_run_at,
                    last_run_by = excluded.last_run_by,
                    status = excluded.status,
                    details = excluded.details
                "#,
            params![
                entry.task_name,
                entry.last_run_at.timestamp_millis(),
                entry.last_run_by,
                entry.status.as_str(),
                details
            ],
        )
        .context("Failed to upsert run log")?;

        Ok(())
    }

    fn get_run_log(&self, task_name: &str) -> Result<Option<RunLogEntry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT task_name, last_run_at, last_run_by, status, details
                 FROM task_run_log WHERE task_name = ?1",
                params![task_name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .context("Failed to load run log")?;

        let Some((task_name, last_run_at, last_run_by, status, details)) = row else {
            return Ok(None);
        };

        Ok(Some(RunLogEntry {
            task_name,
            last_run_at: DateTime::from_timestamp_millis(last_run_at)
                .context("Invalid run log timestamp")?,
            last_run_by,
            status: status.parse().unwrap_or(RunStatus::Failed),
            details: serde_json::from_str(&details).context("Corrupt run log details")?,
        }))
    }
}

// ============================================================================
// In-memory Implementation (for testing)
// ============================================================================

/// In-memory implementation of [`SnapshotStore`]
///
/// Counts bulk reads so callers can verify query budgets, and can be told to
/// fail saves for specific categories.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<Vec<Snapshot>>,
    run_logs: RwLock<HashMap<String, RunLogEntry>>,
    failing_saves: RwLock<HashSet<Category>>,
    reads: AtomicUsize,
}

impl MemorySnapshotStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read calls served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make `save` fail for a category
    pub fn fail_saves_for(&self, category: Category) {
        self.failing_saves
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(category);
    }

    /// Total number of stored snapshots
    pub fn len(&self) -> usize {
        self.snapshots.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    /// Latest snapshot per category matching `keep`; later inserts win ties
    fn latest_matching<F>(&self, categories: &[Category], keep: F) -> HashMap<Category, Snapshot>
    where
        F: Fn(&Snapshot) -> bool,
    {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let mut latest: HashMap<Category, Snapshot> = HashMap::new();

        for snapshot in snapshots.iter() {
            if !categories.contains(&snapshot.category) || !keep(snapshot) {
                continue;
            }
            let newer = latest
                .get(&snapshot.category)
                .map_or(true, |existing| snapshot.taken_at >= existing.taken_at);
            if newer {
                latest.insert(snapshot.category, snapshot.clone());
            }
        }
        latest
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(
        &self,
        category: Category,
        rankings: &[RankingEntry],
        taken_at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        if self
            .failing_saves
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&category)
        {
            anyhow::bail!("injected save failure for '{category}'");
        }
        ensure_dense(category, rankings)?;

        let snapshot = Snapshot::new(category, taken_at, rankings.to_vec());
        self.snapshots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot.clone());
        Ok(snapshot)
    }

    fn find_latest(
        &self,
        category: Category,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<Snapshot>> {
        self.record_read();
        let mut latest =
            self.latest_matching(&[category], |s| before.map_or(true, |b| s.taken_at <= b));
        Ok(latest.remove(&category))
    }

    fn find_latest_in_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>> {
        self.record_read();
        let start = window_start(now, window);
        Ok(self.latest_matching(categories, |s| s.taken_at >= start && s.taken_at <= now))
    }

    fn find_latest_before_window(
        &self,
        categories: &[Category],
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<HashMap<Category, Snapshot>> {
        self.record_read();
        let start = window_start(now, window);
        Ok(self.latest_matching(categories, |s| s.taken_at < start))
    }

    fn count_snapshots(&self, category: Option<Category>) -> Result<usize> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        Ok(snapshots
            .iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .count())
    }

    fn upsert_run_log(&self, entry: &RunLogEntry) -> Result<()> {
        self.run_logs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.task_name.clone(), entry.clone());
        Ok(())
    }

    fn get_run_log(&self, task_name: &str) -> Result<Option<RunLogEntry>> {
        Ok(self
            .run_logs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(task_name)
            .cloned())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared store
pub type SharedSnapshotStore = Arc<dyn SnapshotStore>;

/// Create a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> Result<SharedSnapshotStore> {
    let store = SqliteSnapshotStore::new(path)?;
    Ok(Arc::new(store))
}

/// Create a shared in-memory store
pub fn create_memory_store() -> SharedSnapshotStore {
    Arc::new(MemorySnapshotStore::new())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectId;
    use chrono::TimeZone;

    fn create_test_stores() -> Vec<Box<dyn SnapshotStore>> {
        vec![
            Box::new(SqliteSnapshotStore::in_memory().unwrap()),
            Box::new(MemorySnapshotStore::new()),
        ]
    }

    fn entries(ids: &[i64]) -> Vec<RankingEntry> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| RankingEntry {
                subject_id: SubjectId(id),
                rank: i as u32 + 1,
                score: 100 - i as i64,
            })
            .collect()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_save_always_inserts() {
        for store in create_test_stores() {
            store.save(Category::MostLiked, &entries(&[1, 2]), at(1)).unwrap();
            store.save(Category::MostLiked, &entries(&[1, 2]), at(1)).unwrap();

            assert_eq!(store.count_snapshots(Some(Category::MostLiked)).unwrap(), 2);
            assert_eq!(store.count_snapshots(None).unwrap(), 2);
        }
    }

    #[test]
    fn test_save_rejects_non_dense_ranks() {
        for store in create_test_stores() {
            let mut bad = entries(&[1, 2, 3]);
            bad[2].rank = 5;
            assert!(store.save(Category::MostLiked, &bad, at(1)).is_err());
            assert_eq!(store.count_snapshots(None).unwrap(), 0);
        }
    }

    #[test]
    fn test_find_latest_respects_bound() {
        for store in create_test_stores() {
            store.save(Category::MostLiked, &entries(&[1]), at(1)).unwrap();
            store.save(Category::MostLiked, &entries(&[2]), at(5)).unwrap();
            store.save(Category::MostLiked, &entries(&[3]), at(9)).unwrap();

            let latest = store.find_latest(Category::MostLiked, None).unwrap().unwrap();
            assert_eq!(latest.rankings[0].subject_id, SubjectId(3));

            let bounded = store
                .find_latest(Category::MostLiked, Some(at(5)))
                .unwrap()
                .unwrap();
            assert_eq!(bounded.taken_at, at(5));

            assert!(store.find_latest(Category::TopTeachers, None).unwrap().is_none());
        }
    }

    #[test]
    fn test_current_and_previous_split_by_window() {
        for store in create_test_stores() {
            store.save(Category::MostLiked, &entries(&[1]), at(1)).unwrap();
            store.save(Category::MostLiked, &entries(&[2]), at(3)).unwrap();
            store.save(Category::MostLiked, &entries(&[3]), at(12)).unwrap();
            store.save(Category::TopTeachers, &entries(&[4]), at(2)).unwrap();

            let latest = store
                .find_all_latest_per_category(
                    &[Category::MostLiked, Category::TopTeachers],
                    Duration::days(7),
                    at(14),
                )
                .unwrap();

            assert_eq!(latest.current[&Category::MostLiked].taken_at, at(12));
            assert_eq!(latest.previous[&Category::MostLiked].taken_at, at(3));
            assert!(!latest.current.contains_key(&Category::TopTeachers));
            assert_eq!(latest.previous[&Category::TopTeachers].taken_at, at(2));
        }
    }

    #[test]
    fn test_same_timestamp_prefers_latest_insert() {
        for store in create_test_stores() {
            store.save(Category::MostLiked, &entries(&[1]), at(10)).unwrap();
            store.save(Category::MostLiked, &entries(&[2]), at(10)).unwrap();

            let current = store
                .find_latest_in_window(&[Category::MostLiked], Duration::days(7), at(11))
                .unwrap();
            assert_eq!(
                current[&Category::MostLiked].rankings[0].subject_id,
                SubjectId(2)
            );
        }
    }

    #[test]
    fn test_unrequested_categories_excluded() {
        for store in create_test_stores() {
            store.save(Category::MostLiked, &entries(&[1]), at(10)).unwrap();
            store.save(Category::MostActive, &entries(&[1]), at(10)).unwrap();

            let current = store
                .find_latest_in_window(&[Category::MostActive], Duration::days(7), at(11))
                .unwrap();
            assert_eq!(current.len(), 1);
            assert!(current.contains_key(&Category::MostActive));

            let none = store
                .find_latest_in_window(&[], Duration::days(7), at(11))
                .unwrap();
            assert!(none.is_empty());
        }
    }

    #[test]
    fn test_run_log_upsert() {
        for store in create_test_stores() {
            let mut entry = RunLogEntry {
                task_name: "leaderboard_snapshots".to_string(),
                last_run_at: at(1),
                last_run_by: "scheduler".to_string(),
                status: RunStatus::Success,
                details: serde_json::json!({"most_liked": "persisted"}),
            };
            store.upsert_run_log(&entry).unwrap();

            entry.last_run_at = at(2);
            entry.status = RunStatus::Partial;
            entry.last_run_by = "admin:7".to_string();
            store.upsert_run_log(&entry).unwrap();

            let loaded = store.get_run_log("leaderboard_snapshots").unwrap().unwrap();
            assert_eq!(loaded.status, RunStatus::Partial);
            assert_eq!(loaded.last_run_at, at(2));
            assert_eq!(loaded.last_run_by, "admin:7");
            assert_eq!(loaded.details["most_liked"], "persisted");

            assert!(store.get_run_log("missing").unwrap().is_none());
        }
    }

    #[test]
    fn test_memory_store_counts_reads_and_injects_failures() {
        let store = MemorySnapshotStore::new();
        assert!(store.is_empty());

        store
            .find_all_latest_per_category(&Category::all(), Duration::days(7), at(10))
            .unwrap();
        assert_eq!(store.read_count(), 2);

        store.fail_saves_for(Category::TopTeachers);
        assert!(store.save(Category::TopTeachers, &[], at(1)).is_err());
        assert!(store.save(Category::MostLiked, &[], at(1)).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_shared_store_creation() {
        let store = create_memory_store();
        store.save(Category::MostLiked, &entries(&[9]), at(1)).unwrap();
        assert_eq!(store.count_snapshots(None).unwrap(), 1);
    }
}
