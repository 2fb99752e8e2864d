//! Podium badges for a single subject
//!
//! The single-subject path (profile pages, the badge endpoint) reads storage
//! directly with one bounded query instead of loading a [`SnapshotCache`].
//!
//! [`SnapshotCache`]: crate::cache::SnapshotCache

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Category, RankingEntry, Snapshot, SubjectId};
use crate::storage::SharedSnapshotStore;

/// Default freshness window for badge queries
pub const DEFAULT_BADGE_WINDOW_DAYS: i64 = 7;

/// Medal awarded for a podium rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a rank, if it is on the podium
    pub fn from_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

/// A top-3 position held in a current snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub category: Category,
    pub rank: u32,
    pub medal: Medal,
    pub title: String,
    pub taken_at: DateTime<Utc>,
}

impl Badge {
    /// Build a badge from a ranking entry; `None` off the podium
    pub fn from_entry(
        category: Category,
        entry: &RankingEntry,
        taken_at: DateTime<Utc>,
    ) -> Option<Self> {
        let medal = Medal::from_rank(entry.rank)?;
        Some(Self {
            category,
            rank: entry.rank,
            medal,
            title: category.title().to_string(),
            taken_at,
        })
    }

    /// Badge held by `subject` in `snapshot`, if any
    pub fn from_snapshot(snapshot: &Snapshot, subject: SubjectId) -> Option<Self> {
        snapshot
            .podium()
            .find(|e| e.subject_id == subject)
            .and_then(|e| Self::from_entry(snapshot.category, e, snapshot.taken_at))
    }
}

/// Order badges by rank, then category order
pub fn sort_badges(badges: &mut [Badge]) {
    badges.sort_by_key(|b| (b.rank, b.category));
}

/// Extracts badges for one subject straight from storage
#[derive(Clone)]
pub struct BadgeExtractor {
    store: SharedSnapshotStore,
    window: Duration,
    categories: Vec<Category>,
}

impl BadgeExtractor {
    /// Create an extractor over every category with the default window
    pub fn new(store: SharedSnapshotStore) -> Self {
        Self {
            store,
            window: Duration::days(DEFAULT_BADGE_WINDOW_DAYS),
            categories: Category::all(),
        }
    }

    /// Override the freshness window
    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window = Duration::days(days);
        self
    }

    /// Restrict the categories considered; duplicates collapse
    pub fn with_categories(mut self, mut categories: Vec<Category>) -> Self {
        categories.sort();
        categories.dedup();
        self.categories = categories;
        self
    }

    /// Badges held by `subject` as of `now`
    ///
    /// Issues exactly one storage read. Categories whose latest snapshot is
    /// older than the window contribute nothing.
    pub fn badges_for(&self, subject: SubjectId, now: DateTime<Utc>) -> Result<Vec<Badge>> {
        crate::metrics::record_badge_query();

        let current = self
            .store
            .find_latest_in_window(&self.categories, self.window, now)?;

        let mut badges: Vec<Badge> = self
            .categories
            .iter()
            .filter_map(|c| current.get(c))
            .filter_map(|snapshot| Badge::from_snapshot(snapshot, subject))
            .collect();
        sort_badges(&mut badges);

        tracing::debug!(subject = %subject, badges = badges.len(), "Badges extracted");
        Ok(badges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySnapshotStore, SnapshotStore};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn ranking(ids: &[i64]) -> Vec<RankingEntry> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| RankingEntry {
                subject_id: SubjectId(id),
                rank: i as u32 + 1,
                score: 50 - i as i64,
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_medal_from_rank() {
        assert_eq!(Medal::from_rank(1), Some(Medal::Gold));
        assert_eq!(Medal::from_rank(3), Some(Medal::Bronze));
        assert_eq!(Medal::from_rank(4), None);
        assert_eq!(Medal::from_rank(0), None);
    }

    #[test]
    fn test_cold_start_returns_empty() {
        let store = Arc::new(MemorySnapshotStore::new());
        let extractor = BadgeExtractor::new(store.clone());

        assert!(extractor.badges_for(SubjectId(1), now()).unwrap().is_empty());
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn test_badges_ordered_by_rank_then_category() {
        let store = Arc::new(MemorySnapshotStore::new());
        let taken = now() - Duration::days(1);
        store.save(Category::MostLiked, &ranking(&[9, 7, 5]), taken).unwrap();
        store.save(Category::TopTeachers, &ranking(&[7, 1]), taken).unwrap();
        store.save(Category::MostActive, &ranking(&[3, 2, 1, 7]), taken).unwrap();
        store.save(Category::RisingStars, &ranking(&[7]), taken).unwrap();

        let extractor = BadgeExtractor::new(store.clone());
        let badges = extractor.badges_for(SubjectId(7), now()).unwrap();

        let got: Vec<(u32, Category)> = badges.iter().map(|b| (b.rank, b.category)).collect();
        assert_eq!(
            got,
            vec![
                (1, Category::TopTeachers),
                (1, Category::RisingStars),
                (2, Category::MostLiked),
            ]
        );
        assert_eq!(badges[2].medal, Medal::Silver);
        assert_eq!(badges[0].title, "Top Teachers");
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn test_repeated_categories_yield_one_badge_each() {
        let store = Arc::new(MemorySnapshotStore::new());
        let taken = now() - Duration::days(1);
        store.save(Category::MostLiked, &ranking(&[4, 1]), taken).unwrap();
        store.save(Category::TopTeachers, &ranking(&[1]), taken).unwrap();

        let extractor = BadgeExtractor::new(store).with_categories(vec![
            Category::TopTeachers,
            Category::MostLiked,
            Category::TopTeachers,
            Category::MostLiked,
        ]);
        let badges = extractor.badges_for(SubjectId(1), now()).unwrap();

        let got: Vec<(u32, Category)> = badges.iter().map(|b| (b.rank, b.category)).collect();
        assert_eq!(got, vec![(1, Category::TopTeachers), (2, Category::MostLiked)]);
    }

    #[test]
    fn test_stale_snapshots_ignored() {
        let store = Arc::new(MemorySnapshotStore::new());
        store
            .save(Category::MostLiked, &ranking(&[1]), now() - Duration::days(8))
            .unwrap();
        store
            .save(Category::MostFollowed, &ranking(&[1]), now() - Duration::days(2))
            .unwrap();

        let badges = BadgeExtractor::new(store)
            .badges_for(SubjectId(1), now())
            .unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].category, Category::MostFollowed);
    }

    #[test]
    fn test_custom_window() {
        let store = Arc::new(MemorySnapshotStore::new());
        store
            .save(Category::MostLiked, &ranking(&[1]), now() - Duration::days(10))
            .unwrap();

        let extractor = BadgeExtractor::new(store).with_window_days(14);
        assert_eq!(extractor.badges_for(SubjectId(1), now()).unwrap().len(), 1);
    }

    #[test]
    fn test_badge_serializes_camel_case() {
        let badge = Badge::from_entry(
            Category::MostLiked,
            &RankingEntry {
                subject_id: SubjectId(1),
                rank: 1,
                score: 10,
            },
            now(),
        )
        .unwrap();
        let json = serde_json::to_value(&badge).unwrap();
        assert_eq!(json["medal"], "gold");
        assert_eq!(json["category"], "most_liked");
        assert!(json.get("takenAt").is_some());
    }
}
