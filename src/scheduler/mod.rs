//! Snapshot run orchestration
//!
//! A run computes and persists one snapshot per registered category, then
//! records the aggregate outcome in the run log.
//!
//! # Overview
//!
//! Each category moves through the same states independently:
//!
//! ```text
//! PENDING ──► COMPUTING ──► PERSISTED ─┐
//!                  │                   ├──► RUNLOG_UPDATED ──► DONE
//!                  └───────► FAILED ───┘
//! ```
//!
//! A failing category never prevents the others from being attempted, and a
//! persisted snapshot is written before the next category starts (or
//! concurrently with it, in parallel mode), so a crash mid-run leaves every
//! completed category durable.
//!
//! Overlapping runs are not coordinated. They can write two snapshots for the
//! same window; readers always take the most recent one.
//!
//! # Modules
//!
//! - [`report`] - Run and per-category outcome types
//! - [`trigger`] - Daily wall-clock trigger for the server
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use podium::scheduler::SnapshotScheduler;
//!
//! let scheduler = SnapshotScheduler::new(store, computer);
//! let report = scheduler.run("scheduler");
//! println!("{}: {} snapshots", report.status, report.snapshots_written());
//! ```

pub mod report;
pub mod trigger;

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Category, RunLogEntry};
use crate::ranking::RankingComputer;
use crate::storage::SharedSnapshotStore;

pub use report::{CategoryFailure, CategoryOutcome, FailureStage, RunReport};
pub use trigger::{DailyTrigger, TriggerConfig};

/// Run log key used when none is configured
pub const DEFAULT_TASK_NAME: &str = "leaderboard_snapshots";

/// Drives a full snapshot run across all categories
#[derive(Clone)]
pub struct SnapshotScheduler {
    store: SharedSnapshotStore,
    computer: RankingComputer,
    task_name: String,
    parallel: bool,
}

impl SnapshotScheduler {
    pub fn new(store: SharedSnapshotStore, computer: RankingComputer) -> Self {
        Self {
            store,
            computer,
            task_name: DEFAULT_TASK_NAME.to_string(),
            parallel: false,
        }
    }

    /// Override the run log key
    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }

    /// Compute categories on scoped threads
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn store(&self) -> &SharedSnapshotStore {
        &self.store
    }

    /// Run now
    pub fn run(&self, triggered_by: &str) -> RunReport {
        self.run_at(triggered_by, Utc::now())
    }

    /// Run with an explicit snapshot timestamp
    ///
    /// Every snapshot written by this run carries `now` as its `taken_at`.
    /// The run itself never fails; per-category errors are reported in the
    /// returned [`RunReport`].
    pub fn run_at(&self, triggered_by: &str, now: DateTime<Utc>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        let categories = self.computer.categories();

        tracing::info!(
            run_id = %run_id,
            triggered_by,
            categories = categories.len(),
            parallel = self.parallel,
            "Snapshot run started"
        );

        let outcomes = if self.parallel {
            self.run_parallel(run_id, &categories, now)
        } else {
            categories
                .iter()
                .map(|&category| {
                    panic::catch_unwind(AssertUnwindSafe(|| {
                        self.run_category(run_id, category, now)
                    }))
                    .unwrap_or_else(|_| panicked(run_id, category))
                })
                .collect()
        };

        let report = RunReport::new(
            run_id,
            self.task_name.clone(),
            triggered_by,
            started_at,
            Utc::now(),
            outcomes,
        );

        self.record_run_log(&report.to_run_log(), run_id);

        crate::metrics::record_run(
            report.status.as_str(),
            triggered_by,
            timer.elapsed().as_secs_f64(),
        );
        tracing::info!(
            run_id = %run_id,
            status = %report.status,
            snapshots_written = report.snapshots_written(),
            failures = report.outcomes.len() - report.snapshots_written(),
            state = "done",
            "Snapshot run finished"
        );

        report
    }

    fn run_parallel(
        &self,
        run_id: Uuid,
        categories: &[Category],
        now: DateTime<Utc>,
    ) -> Vec<CategoryOutcome> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = categories
                .iter()
                .map(|&category| {
                    let handle = scope.spawn(move || self.run_category(run_id, category, now));
                    (category, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(category, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| panicked(run_id, category))
                })
                .collect()
        })
    }

    /// Compute and persist one category
    fn run_category(&self, run_id: Uuid, category: Category, now: DateTime<Utc>) -> CategoryOutcome {
        tracing::debug!(run_id = %run_id, category = %category, state = "computing", "Computing ranking");

        let outcome = match self.computer.compute(category, now) {
            Err(e) => {
                tracing::warn!(
                    run_id = %run_id,
                    category = %category,
                    state = "failed",
                    error = %e,
                    "Ranking failed"
                );
                CategoryOutcome::Failed(CategoryFailure::new(
                    category,
                    FailureStage::Scoring,
                    e.to_string(),
                    e.is_recoverable(),
                ))
            }
            Ok(rankings) => match self.store.save(category, &rankings, now) {
                Ok(snapshot) => {
                    tracing::info!(
                        run_id = %run_id,
                        category = %category,
                        state = "persisted",
                        entries = snapshot.len(),
                        "Snapshot persisted"
                    );
                    crate::metrics::set_ranked_entries(category.id(), snapshot.len());
                    CategoryOutcome::Persisted {
                        category,
                        entries: snapshot.len(),
                    }
                }
                Err(e) => {
                    tracing::error!(
                        run_id = %run_id,
                        category = %category,
                        state = "failed",
                        error = %format!("{e:#}"),
                        "Snapshot persist failed"
                    );
                    CategoryOutcome::Failed(CategoryFailure::new(
                        category,
                        FailureStage::Storage,
                        format!("{e:#}"),
                        true,
                    ))
                }
            },
        };

        crate::metrics::record_category_outcome(category.id(), outcome.label());
        outcome
    }

    /// Upsert the run log; failures are logged only
    fn record_run_log(&self, entry: &RunLogEntry, run_id: Uuid) {
        match self.store.upsert_run_log(entry) {
            Ok(()) => tracing::debug!(
                run_id = %run_id,
                task = %entry.task_name,
                state = "runlog_updated",
                "Run log updated"
            ),
            Err(e) => tracing::warn!(
                run_id = %run_id,
                task = %entry.task_name,
                error = %format!("{e:#}"),
                "Failed to update run log"
            ),
        }
    }

    /// Last recorded run for this scheduler's task
    pub fn last_run(&self) -> crate::error::Result<Option<RunLogEntry>> {
        Ok(self.store.get_run_log(&self.task_name)?)
    }
}

/// Outcome for a category whose computation panicked
fn panicked(run_id: Uuid, category: Category) -> CategoryOutcome {
    tracing::error!(
        run_id = %run_id,
        category = %category,
        state = "failed",
        "Category computation panicked"
    );
    crate::metrics::record_category_outcome(category.id(), "failed");
    CategoryOutcome::Failed(CategoryFailure::new(
        category,
        FailureStage::Panicked,
        "category computation panicked",
        false,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunStatus, SubjectId};
    use crate::ranking::{CategoryDescriptor, StaticActivitySource, SubjectActivity};
    use crate::storage::{MemorySnapshotStore, SnapshotStore};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn source() -> Arc<StaticActivitySource> {
        let rows = (1..=5)
            .map(|id| SubjectActivity {
                likes_received: id * 10,
                followers: 100 - id,
                posts: id,
                ..SubjectActivity::new(SubjectId(id))
            })
            .collect();
        Arc::new(StaticActivitySource::new(rows))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap()
    }

    fn exploding_score(_: &SubjectActivity) -> i64 {
        panic!("score exploded")
    }

    #[test]
    fn test_panicking_category_is_contained() {
        for parallel in [false, true] {
            let store = Arc::new(MemorySnapshotStore::new());
            let computer = RankingComputer::new(source()).with_descriptor(CategoryDescriptor::new(
                Category::MostActive,
                |_| true,
                exploding_score,
            ));
            let scheduler = SnapshotScheduler::new(store.clone(), computer).with_parallel(parallel);

            let report = scheduler.run_at("scheduler", now());

            assert_eq!(report.status, RunStatus::Partial, "parallel={parallel}");
            assert_eq!(report.snapshots_written(), Category::all().len() - 1);
            let failures = report.failures();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].category, Category::MostActive);
            assert_eq!(failures[0].stage, FailureStage::Panicked);

            // Categories after the panicking one still ran
            assert_eq!(store.count_snapshots(Some(Category::TopChoreographers)).unwrap(), 1);
            let log = store.get_run_log(DEFAULT_TASK_NAME).unwrap().unwrap();
            assert_eq!(log.status, RunStatus::Partial);
        }
    }

    #[test]
    fn test_full_success() {
        let store = Arc::new(MemorySnapshotStore::new());
        let scheduler = SnapshotScheduler::new(store.clone(), RankingComputer::new(source()));

        let report = scheduler.run_at("scheduler", now());

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.snapshots_written(), Category::all().len());
        assert_eq!(store.len(), Category::all().len());

        let log = scheduler.last_run().unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Success);
        assert_eq!(log.last_run_by, "scheduler");
    }

    #[test]
    fn test_scoring_failure_is_partial() {
        let source = source();
        source.fail_category(Category::TopTeachers);
        let store = Arc::new(MemorySnapshotStore::new());
        let scheduler = SnapshotScheduler::new(store.clone(), RankingComputer::new(source));

        let report = scheduler.run_at("admin:1", now());

        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.snapshots_written(), Category::all().len() - 1);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].category, Category::TopTeachers);
        assert_eq!(failures[0].stage, FailureStage::Scoring);
        assert!(store.count_snapshots(Some(Category::TopTeachers)).unwrap() == 0);

        let log = store.get_run_log(DEFAULT_TASK_NAME).unwrap().unwrap();
        assert_eq!(log.details["categories"]["top_teachers"]["outcome"], "failed");
    }

    #[test]
    fn test_storage_failure_isolated() {
        let store = Arc::new(MemorySnapshotStore::new());
        store.fail_saves_for(Category::MostActive);
        let scheduler = SnapshotScheduler::new(store.clone(), RankingComputer::new(source()));

        let report = scheduler.run_at("scheduler", now());

        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.failures()[0].stage, FailureStage::Storage);
    }

    #[test]
    fn test_all_failed() {
        let source = source();
        for category in Category::all() {
            source.fail_category(category);
        }
        let store = Arc::new(MemorySnapshotStore::new());
        let scheduler = SnapshotScheduler::new(store.clone(), RankingComputer::new(source));

        let report = scheduler.run_at("scheduler", now());

        assert_eq!(report.status, RunStatus::Failed);
        assert!(store.is_empty());
        assert_eq!(
            scheduler.last_run().unwrap().unwrap().status,
            RunStatus::Failed
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential_store = Arc::new(MemorySnapshotStore::new());
        let parallel_store = Arc::new(MemorySnapshotStore::new());
        let src = source();

        let sequential = SnapshotScheduler::new(sequential_store.clone(), RankingComputer::new(src.clone()))
            .run_at("scheduler", now());
        let parallel = SnapshotScheduler::new(parallel_store.clone(), RankingComputer::new(src))
            .with_parallel(true)
            .run_at("scheduler", now());

        assert_eq!(sequential.outcomes, parallel.outcomes);
        for category in Category::all() {
            assert_eq!(
                sequential_store.find_latest(category, None).unwrap(),
                parallel_store.find_latest(category, None).unwrap()
            );
        }
    }

    #[test]
    fn test_custom_task_name() {
        let store = Arc::new(MemorySnapshotStore::new());
        let scheduler = SnapshotScheduler::new(store.clone(), RankingComputer::new(source()))
            .with_task_name("weekly_boards");

        scheduler.run_at("scheduler", now());

        assert!(store.get_run_log("weekly_boards").unwrap().is_some());
        assert!(store.get_run_log(DEFAULT_TASK_NAME).unwrap().is_none());
    }

    #[test]
    fn test_empty_category_is_success() {
        let store = Arc::new(MemorySnapshotStore::new());
        let computer = RankingComputer::new(Arc::new(StaticActivitySource::default()));
        let scheduler = SnapshotScheduler::new(store.clone(), computer);

        let report = scheduler.run_at("scheduler", now());

        assert_eq!(report.status, RunStatus::Success);
        let snapshot = store.find_latest(Category::MostLiked, None).unwrap().unwrap();
        assert!(snapshot.is_empty());
    }
}
