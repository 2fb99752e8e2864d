// Core data structures for the leaderboard engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Subject
// ============================================================================

/// Identifier of a ranked subject (a platform user)
///
/// Ordering on this type is the tie-break key for equal scores.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl SubjectId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Category
// ============================================================================

/// Leaderboard categories
///
/// The set is closed: every component matches on it exhaustively, so adding
/// a variant forces a decision in the ranking descriptors and badge metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MostLiked,
    CompetitionChampions,
    TopTeachers,
    MostFollowed,
    MostActive,
    RisingStars,
    TopEventHosts,
    TopChoreographers,
}

impl Category {
    /// Get all categories in registration order
    pub fn all() -> Vec<Self> {
        vec![
            Self::MostLiked,
            Self::CompetitionChampions,
            Self::TopTeachers,
            Self::MostFollowed,
            Self::MostActive,
            Self::RisingStars,
            Self::TopEventHosts,
            Self::TopChoreographers,
        ]
    }

    /// Stable identifier, used as the storage key
    pub fn id(&self) -> &'static str {
        match self {
            Self::MostLiked => "most_liked",
            Self::CompetitionChampions => "competition_champions",
            Self::TopTeachers => "top_teachers",
            Self::MostFollowed => "most_followed",
            Self::MostActive => "most_active",
            Self::RisingStars => "rising_stars",
            Self::TopEventHosts => "top_event_hosts",
            Self::TopChoreographers => "top_choreographers",
        }
    }

    /// Human-readable leaderboard title
    pub fn title(&self) -> &'static str {
        match self {
            Self::MostLiked => "Most Liked Dancers",
            Self::CompetitionChampions => "Competition Champions",
            Self::TopTeachers => "Top Teachers",
            Self::MostFollowed => "Most Followed",
            Self::MostActive => "Most Active",
            Self::RisingStars => "Rising Stars",
            Self::TopEventHosts => "Top Event Hosts",
            Self::TopChoreographers => "Top Choreographers",
        }
    }

    /// Parse from identifier (accepts kebab-case as well)
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().replace('-', "_").as_str() {
            "most_liked" => Some(Self::MostLiked),
            "competition_champions" => Some(Self::CompetitionChampions),
            "top_teachers" => Some(Self::TopTeachers),
            "most_followed" => Some(Self::MostFollowed),
            "most_active" => Some(Self::MostActive),
            "rising_stars" => Some(Self::RisingStars),
            "top_event_hosts" => Some(Self::TopEventHosts),
            "top_choreographers" => Some(Self::TopChoreographers),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Error returned when a category identifier is unknown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown leaderboard category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ============================================================================
// Rankings and snapshots
// ============================================================================

/// One subject's position in a leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub subject_id: SubjectId,
    /// 1-based, dense and unique within a snapshot
    pub rank: u32,
    pub score: i64,
}

/// Immutable, timestamped ordering of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub category: Category,
    pub taken_at: DateTime<Utc>,
    /// Sorted ascending by rank
    pub rankings: Vec<RankingEntry>,
}

impl Snapshot {
    pub fn new(category: Category, taken_at: DateTime<Utc>, rankings: Vec<RankingEntry>) -> Self {
        Self {
            category,
            taken_at,
            rankings,
        }
    }

    /// Number of ranked subjects
    pub fn len(&self) -> usize {
        self.rankings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rankings.is_empty()
    }

    /// Entries holding a podium position (rank 1-3)
    pub fn podium(&self) -> impl Iterator<Item = &RankingEntry> {
        self.rankings.iter().take_while(|e| e.rank <= 3)
    }

    /// Check that ranks are exactly 1..=N in order
    pub fn has_dense_ranks(&self) -> bool {
        self.rankings
            .iter()
            .enumerate()
            .all(|(i, entry)| entry.rank as usize == i + 1)
    }
}

// ============================================================================
// Run log
// ============================================================================

/// Aggregate outcome of one scheduler run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every category persisted
    Success,
    /// Some categories failed
    Partial,
    /// No category persisted
    Failed,
}

impl RunStatus {
    /// Derive the status from per-category counts
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => Self::Success,
            (0, _) => Self::Failed,
            _ => Self::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "success" => Self::Success,
            "partial" => Self::Partial,
            _ => Self::Failed,
        })
    }
}

/// Observability record for a named task, upserted every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub task_name: String,
    pub last_run_at: DateTime<Utc>,
    pub last_run_by: String,
    pub status: RunStatus,
    /// Per-category breakdown (JSON)
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_ids() {
        for category in Category::all() {
            assert_eq!(Category::from_id(category.id()), Some(category));
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse_variants() {
        assert_eq!(Category::from_id("Most-Liked"), Some(Category::MostLiked));
        assert!(Category::from_id("most_loved").is_none());
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_ids() {
        let json = serde_json::to_string(&Category::RisingStars).unwrap();
        assert_eq!(json, "\"rising_stars\"");
    }

    #[test]
    fn test_run_status_from_counts() {
        assert_eq!(RunStatus::from_counts(8, 0), RunStatus::Success);
        assert_eq!(RunStatus::from_counts(7, 1), RunStatus::Partial);
        assert_eq!(RunStatus::from_counts(0, 8), RunStatus::Failed);
        assert_eq!(RunStatus::from_counts(0, 0), RunStatus::Success);
    }

    #[test]
    fn test_snapshot_podium_and_density() {
        let rankings = (1..=5)
            .map(|rank| RankingEntry {
                subject_id: SubjectId(rank as i64 * 10),
                rank,
                score: 100 - rank as i64,
            })
            .collect();
        let snapshot = Snapshot::new(Category::MostLiked, Utc::now(), rankings);

        assert!(snapshot.has_dense_ranks());
        assert_eq!(snapshot.podium().count(), 3);
        assert_eq!(snapshot.len(), 5);
    }
}
