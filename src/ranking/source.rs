//! Scoring data sources
//!
//! A [`ScoringSource`] hands the ranking computer one aggregated
//! [`SubjectActivity`] row per subject in a single bulk call. The SQLite
//! source computes those rows with one `GROUP BY` query over the activity
//! event log, so scoring cost does not grow with per-subject round trips.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use crate::models::{Category, SubjectId};

use super::descriptor::RECENT_ACTIVITY_DAYS;
use super::error::{ScoringError, ScoringResult};

// ============================================================================
// Core Types
// ============================================================================

/// Aggregated activity for one subject, as of a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectActivity {
    pub subject_id: SubjectId,
    pub is_active: bool,
    pub is_teacher: bool,
    pub account_age_days: i64,
    pub likes_received: i64,
    /// Likes received in the last [`RECENT_ACTIVITY_DAYS`] days
    pub recent_likes_received: i64,
    pub competition_wins: i64,
    pub competition_podiums: i64,
    pub students_taught: i64,
    pub followers: i64,
    pub posts: i64,
    pub comments: i64,
    pub events_hosted: i64,
    pub choreographies_published: i64,
    pub choreography_views: i64,
}

impl SubjectActivity {
    /// Active subject with no recorded activity
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            is_active: true,
            ..Default::default()
        }
    }
}

/// Kinds of events recorded in the activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    LikeReceived,
    CompetitionWin,
    CompetitionPodium,
    StudentTaught,
    FollowerGained,
    Post,
    Comment,
    EventHosted,
    ChoreographyPublished,
    ChoreographyView,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikeReceived => "like_received",
            Self::CompetitionWin => "competition_win",
            Self::CompetitionPodium => "competition_podium",
            Self::StudentTaught => "student_taught",
            Self::FollowerGained => "follower_gained",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::EventHosted => "event_hosted",
            Self::ChoreographyPublished => "choreography_published",
            Self::ChoreographyView => "choreography_view",
        }
    }

    pub fn all() -> [Self; 10] {
        [
            Self::LikeReceived,
            Self::CompetitionWin,
            Self::CompetitionPodium,
            Self::StudentTaught,
            Self::FollowerGained,
            Self::Post,
            Self::Comment,
            Self::EventHosted,
            Self::ChoreographyPublished,
            Self::ChoreographyView,
        ]
    }

    /// Parse from identifier (accepts kebab-case as well)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase().replace('-', "_");
        Self::all().into_iter().find(|k| k.as_str() == id)
    }
}

/// Bulk provider of per-subject activity aggregates
///
/// Called once per category per run. Implementations must return every
/// candidate subject in one call rather than being queried per subject.
pub trait ScoringSource: Send + Sync {
    /// Aggregated activity for all subjects as of `as_of`
    fn fetch_activity(
        &self,
        category: Category,
        as_of: DateTime<Utc>,
    ) -> ScoringResult<Vec<SubjectActivity>>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// Activity source backed by the platform's SQLite activity log
pub struct SqliteActivitySource {
    conn: Mutex<Connection>,
}

impl SqliteActivitySource {
    /// Open (or create) the activity database
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open activity database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let source = Self {
            conn: Mutex::new(conn),
        };
        source.create_schema()?;

        tracing::info!(path = %path.display(), "Activity source initialized");
        Ok(source)
    }

    /// Create in-memory source (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let source = Self {
            conn: Mutex::new(conn),
        };
        source.create_schema()?;
        Ok(source)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("activity connection mutex poisoned"))
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS subjects (
                    subject_id INTEGER PRIMARY KEY,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    is_teacher INTEGER NOT NULL DEFAULT 0,
                    joined_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS activity_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    subject_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    amount INTEGER NOT NULL DEFAULT 1,
                    occurred_at INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_activity_events_subject
                    ON activity_events(subject_id, occurred_at);
                "#,
        )
        .context("Failed to create activity schema")?;

        Ok(())
    }

    /// Insert or update a subject's profile flags
    pub fn upsert_subject(
        &self,
        subject_id: SubjectId,
        is_active: bool,
        is_teacher: bool,
        joined_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
                INSERT INTO subjects (subject_id, is_active, is_teacher, joined_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(subject_id) DO UPDATE SET
                    is_active = excluded.is_active,
                    is_teacher = excluded.is_teacher,
                    joined_at = excluded.joined_at
                "#,
            params![
                subject_id.get(),
                is_active,
                is_teacher,
                joined_at.timestamp_millis()
            ],
        )
        .context("Failed to upsert subject")?;

        Ok(())
    }

    /// Append an activity event
    pub fn record_event(
        &self,
        subject_id: SubjectId,
        kind: ActivityKind,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO activity_events (subject_id, kind, amount, occurred_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                subject_id.get(),
                kind.as_str(),
                amount,
                occurred_at.timestamp_millis()
            ],
        )
        .context("Failed to record activity event")?;

        Ok(())
    }

    /// Every known subject, in id order
    pub fn subject_ids(&self) -> Result<Vec<SubjectId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT subject_id FROM subjects ORDER BY subject_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .map(|r| r.map(SubjectId))
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list subjects")?;
        Ok(ids)
    }

    fn aggregate(&self, as_of: DateTime<Utc>) -> Result<Vec<SubjectActivity>> {
        let conn = self.lock()?;
        let as_of_ms = as_of.timestamp_millis();
        let recent_ms = (as_of - Duration::days(RECENT_ACTIVITY_DAYS)).timestamp_millis();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT s.subject_id, s.is_active, s.is_teacher, s.joined_at,
                    COALESCE(SUM(CASE WHEN e.kind = 'like_received' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'like_received' AND e.occurred_at >= ?2
                                      THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'competition_win' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'competition_podium' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'student_taught' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'follower_gained' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'post' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'comment' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'event_hosted' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'choreography_published' THEN e.amount END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'choreography_view' THEN e.amount END), 0)
                FROM subjects s
                LEFT JOIN activity_events e
                    ON e.subject_id = s.subject_id AND e.occurred_at <= ?1
                WHERE s.joined_at <= ?1
                GROUP BY s.subject_id
                "#,
            )
            .context("Failed to prepare activity aggregate query")?;

        let rows = stmt
            .query_map(params![as_of_ms, recent_ms], |row| {
                let joined_at_ms: i64 = row.get(3)?;
                Ok(SubjectActivity {
                    subject_id: SubjectId(row.get(0)?),
                    is_active: row.get(1)?,
                    is_teacher: row.get(2)?,
                    account_age_days: (as_of_ms - joined_at_ms) / 86_400_000,
                    likes_received: row.get(4)?,
                    recent_likes_received: row.get(5)?,
                    competition_wins: row.get(6)?,
                    competition_podiums: row.get(7)?,
                    students_taught: row.get(8)?,
                    followers: row.get(9)?,
                    posts: row.get(10)?,
                    comments: row.get(11)?,
                    events_hosted: row.get(12)?,
                    choreographies_published: row.get(13)?,
                    choreography_views: row.get(14)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read activity aggregates")?;

        Ok(rows)
    }
}

impl ScoringSource for SqliteActivitySource {
    fn fetch_activity(
        &self,
        category: Category,
        as_of: DateTime<Utc>,
    ) -> ScoringResult<Vec<SubjectActivity>> {
        self.aggregate(as_of)
            .map_err(|e| ScoringError::unavailable(category, format!("{e:#}")))
    }
}

// ============================================================================
// Static Implementation (for testing and seeding)
// ============================================================================

/// In-memory activity source with optional per-category failure injection
#[derive(Default)]
pub struct StaticActivitySource {
    rows: RwLock<Vec<SubjectActivity>>,
    failing: RwLock<HashSet<Category>>,
    fetches: AtomicUsize,
}

impl StaticActivitySource {
    pub fn new(rows: Vec<SubjectActivity>) -> Self {
        Self {
            rows: RwLock::new(rows),
            ..Default::default()
        }
    }

    /// Make every fetch for `category` fail
    pub fn with_failure(self, category: Category) -> Self {
        self.fail_category(category);
        self
    }

    pub fn fail_category(&self, category: Category) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(category);
    }

    /// Replace the activity rows
    pub fn set_rows(&self, rows: Vec<SubjectActivity>) {
        *self.rows.write().unwrap_or_else(|e| e.into_inner()) = rows;
    }

    /// Number of bulk fetches served
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ScoringSource for StaticActivitySource {
    fn fetch_activity(
        &self,
        category: Category,
        _as_of: DateTime<Utc>,
    ) -> ScoringResult<Vec<SubjectActivity>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self
            .failing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&category)
        {
            return Err(ScoringError::unavailable(category, "injected failure"));
        }

        Ok(self
            .rows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_source(now: DateTime<Utc>) -> SqliteActivitySource {
        let source = SqliteActivitySource::in_memory().unwrap();
        source
            .upsert_subject(SubjectId(1), true, false, now - Duration::days(400))
            .unwrap();
        source
            .upsert_subject(SubjectId(2), true, true, now - Duration::days(10))
            .unwrap();
        source
    }

    #[test]
    fn test_aggregates_are_summed_per_subject() {
        let now = Utc::now();
        let source = seeded_source(now);
        source
            .record_event(SubjectId(1), ActivityKind::LikeReceived, 3, now - Duration::days(60))
            .unwrap();
        source
            .record_event(SubjectId(1), ActivityKind::LikeReceived, 2, now - Duration::days(1))
            .unwrap();
        source
            .record_event(SubjectId(2), ActivityKind::StudentTaught, 4, now - Duration::days(2))
            .unwrap();

        let mut rows = source.fetch_activity(Category::MostLiked, now).unwrap();
        rows.sort_by_key(|r| r.subject_id);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].likes_received, 5);
        assert_eq!(rows[0].recent_likes_received, 2);
        assert!(rows[0].account_age_days >= 399);
        assert_eq!(rows[1].students_taught, 4);
        assert!(rows[1].is_teacher);
        assert_eq!(rows[1].likes_received, 0);
    }

    #[test]
    fn test_events_after_as_of_are_ignored() {
        let now = Utc::now();
        let source = seeded_source(now);
        source
            .record_event(SubjectId(1), ActivityKind::Post, 1, now + Duration::days(1))
            .unwrap();

        let rows = source.fetch_activity(Category::MostActive, now).unwrap();
        assert!(rows.iter().all(|r| r.posts == 0));
    }

    #[test]
    fn test_subject_ids_and_kind_parsing() {
        let source = seeded_source(Utc::now());
        assert_eq!(source.subject_ids().unwrap(), vec![SubjectId(1), SubjectId(2)]);

        assert_eq!(ActivityKind::from_id("like-received"), Some(ActivityKind::LikeReceived));
        assert_eq!(ActivityKind::from_id("tip"), None);
        for kind in ActivityKind::all() {
            assert_eq!(ActivityKind::from_id(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_static_source_failure_injection() {
        let source = StaticActivitySource::new(vec![SubjectActivity::new(SubjectId(1))])
            .with_failure(Category::TopTeachers);

        assert!(source
            .fetch_activity(Category::TopTeachers, Utc::now())
            .is_err());
        assert_eq!(
            source
                .fetch_activity(Category::MostLiked, Utc::now())
                .unwrap()
                .len(),
            1
        );
        assert_eq!(source.fetch_count(), 2);
    }
}
