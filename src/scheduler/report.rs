//! Outcome of a snapshot run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, RunLogEntry, RunStatus};

/// Where a category attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The scoring source or ranking step
    Scoring,
    /// Persisting the snapshot
    Storage,
    /// The worker thread panicked
    Panicked,
}

/// A category that did not produce a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFailure {
    pub category: Category,
    pub stage: FailureStage,
    pub error: String,
    pub recoverable: bool,
}

impl CategoryFailure {
    pub fn new(
        category: Category,
        stage: FailureStage,
        error: impl Into<String>,
        recoverable: bool,
    ) -> Self {
        Self {
            category,
            stage,
            error: error.into(),
            recoverable,
        }
    }
}

/// Result of one category attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CategoryOutcome {
    Persisted { category: Category, entries: usize },
    Failed(CategoryFailure),
}

impl CategoryOutcome {
    pub fn category(&self) -> Category {
        match self {
            Self::Persisted { category, .. } => *category,
            Self::Failed(failure) => failure.category,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }

    /// Label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persisted { .. } => "persisted",
            Self::Failed(_) => "failed",
        }
    }
}

/// Summary of a full scheduler run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub task_name: String,
    pub status: RunStatus,
    pub triggered_by: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per attempted category, in category order
    pub outcomes: Vec<CategoryOutcome>,
}

impl RunReport {
    /// Assemble a report and derive its status from the outcomes
    pub fn new(
        run_id: Uuid,
        task_name: impl Into<String>,
        triggered_by: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: Vec<CategoryOutcome>,
    ) -> Self {
        let written = outcomes.iter().filter(|o| o.is_persisted()).count();
        let status = RunStatus::from_counts(written, outcomes.len() - written);

        Self {
            run_id,
            task_name: task_name.into(),
            status,
            triggered_by: triggered_by.into(),
            started_at,
            finished_at,
            outcomes,
        }
    }

    /// Number of snapshots persisted by this run
    pub fn snapshots_written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_persisted()).count()
    }

    /// Categories that failed, in category order
    pub fn failures(&self) -> Vec<&CategoryFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                CategoryOutcome::Failed(failure) => Some(failure),
                CategoryOutcome::Persisted { .. } => None,
            })
            .collect()
    }

    /// Wall time of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Per-category breakdown stored in the run log
    pub fn details(&self) -> serde_json::Value {
        let categories: serde_json::Map<String, serde_json::Value> = self
            .outcomes
            .iter()
            .map(|o| {
                let value = match o {
                    CategoryOutcome::Persisted { entries, .. } => serde_json::json!({
                        "outcome": "persisted",
                        "entries": entries,
                    }),
                    CategoryOutcome::Failed(failure) => serde_json::json!({
                        "outcome": "failed",
                        "stage": failure.stage,
                        "error": failure.error,
                    }),
                };
                (o.category().id().to_string(), value)
            })
            .collect();

        serde_json::json!({
            "run_id": self.run_id.to_string(),
            "snapshots_written": self.snapshots_written(),
            "failures": self.outcomes.len() - self.snapshots_written(),
            "duration_ms": self.duration().num_milliseconds(),
            "categories": categories,
        })
    }

    /// Run log row for this report
    pub fn to_run_log(&self) -> RunLogEntry {
        RunLogEntry {
            task_name: self.task_name.clone(),
            last_run_at: self.finished_at,
            last_run_by: self.triggered_by.clone(),
            status: self.status,
            details: self.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<CategoryOutcome>) -> RunReport {
        let now = Utc::now();
        RunReport::new(Uuid::new_v4(), "leaderboard_snapshots", "test", now, now, outcomes)
    }

    fn persisted(category: Category) -> CategoryOutcome {
        CategoryOutcome::Persisted {
            category,
            entries: 3,
        }
    }

    fn failed(category: Category) -> CategoryOutcome {
        CategoryOutcome::Failed(CategoryFailure::new(
            category,
            FailureStage::Scoring,
            "source down",
            true,
        ))
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            report(vec![persisted(Category::MostLiked)]).status,
            RunStatus::Success
        );
        assert_eq!(
            report(vec![persisted(Category::MostLiked), failed(Category::TopTeachers)]).status,
            RunStatus::Partial
        );
        assert_eq!(report(vec![failed(Category::TopTeachers)]).status, RunStatus::Failed);
    }

    #[test]
    fn test_details_breakdown() {
        let report = report(vec![persisted(Category::MostLiked), failed(Category::TopTeachers)]);
        let details = report.details();

        assert_eq!(details["snapshots_written"], 1);
        assert_eq!(details["failures"], 1);
        assert_eq!(details["categories"]["most_liked"]["outcome"], "persisted");
        assert_eq!(details["categories"]["top_teachers"]["stage"], "scoring");
        assert_eq!(details["categories"]["top_teachers"]["error"], "source down");
    }

    #[test]
    fn test_run_log_mirrors_report() {
        let report = report(vec![failed(Category::MostActive)]);
        let entry = report.to_run_log();

        assert_eq!(entry.task_name, "leaderboard_snapshots");
        assert_eq!(entry.last_run_by, "test");
        assert_eq!(entry.status, RunStatus::Failed);
        assert_eq!(report.failures().len(), 1);
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(failed(Category::RisingStars)).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["category"], "rising_stars");
        assert_eq!(json["recoverable"], true);
    }
}
