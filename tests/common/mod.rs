//! Common test utilities

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use podium::models::SubjectId;
use podium::ranking::{RankingComputer, StaticActivitySource, SubjectActivity};
use podium::scheduler::SnapshotScheduler;
use podium::storage::{MemorySnapshotStore, SharedSnapshotStore};

/// Fixed reference time for deterministic runs
#[allow(dead_code)]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap()
}

/// Active subject with some activity in every category
#[allow(dead_code)]
pub fn create_test_subject(id: i64, weight: i64) -> SubjectActivity {
    SubjectActivity {
        is_teacher: true,
        account_age_days: 30,
        likes_received: 10 * weight,
        recent_likes_received: 5 * weight,
        competition_wins: weight,
        competition_podiums: weight,
        students_taught: 2 * weight,
        followers: 3 * weight,
        posts: weight,
        comments: weight,
        events_hosted: weight,
        choreographies_published: 1,
        choreography_views: 100 * weight,
        ..SubjectActivity::new(SubjectId(id))
    }
}

/// `count` subjects where subject `1` is strongest
#[allow(dead_code)]
pub fn create_test_population(count: i64) -> Vec<SubjectActivity> {
    (1..=count)
        .map(|id| create_test_subject(id, count - id + 1))
        .collect()
}

/// Scheduler over a memory store and a static source
#[allow(dead_code)]
pub fn create_test_scheduler(
    rows: Vec<SubjectActivity>,
) -> (SnapshotScheduler, Arc<MemorySnapshotStore>, Arc<StaticActivitySource>) {
    let store = Arc::new(MemorySnapshotStore::new());
    let source = Arc::new(StaticActivitySource::new(rows));
    let shared: SharedSnapshotStore = store.clone();
    let scheduler = SnapshotScheduler::new(shared, RankingComputer::new(source.clone()));
    (scheduler, store, source)
}
