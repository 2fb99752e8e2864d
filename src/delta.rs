//! Rank movement between the previous and current snapshot
//!
//! Deltas are computed purely from a loaded [`SnapshotCache`]; this module
//! never touches storage.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheError, SnapshotCache};
use crate::models::{Category, RankingEntry, SubjectId};

/// A subject's rank change in one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankDelta {
    pub current_rank: Option<u32>,
    pub previous_rank: Option<u32>,
    /// Score in the current snapshot
    pub score: Option<i64>,
    /// `previous - current`; positive means the subject climbed. Zero unless
    /// both ranks are known.
    pub change: i64,
    pub improved: bool,
    pub is_new: bool,
    pub dropped_out: bool,
}

impl RankDelta {
    /// Delta between two optional entries
    pub fn between(current: Option<&RankingEntry>, previous: Option<&RankingEntry>) -> Self {
        let current_rank = current.map(|e| e.rank);
        let previous_rank = previous.map(|e| e.rank);

        let (change, improved) = match (current_rank, previous_rank) {
            (Some(now), Some(before)) => (i64::from(before) - i64::from(now), now < before),
            _ => (0, false),
        };

        Self {
            current_rank,
            previous_rank,
            score: current.map(|e| e.score),
            change,
            improved,
            is_new: current.is_some() && previous.is_none(),
            dropped_out: current.is_none() && previous.is_some(),
        }
    }

    /// Subject appears in neither snapshot
    pub fn is_absent(&self) -> bool {
        self.current_rank.is_none() && self.previous_rank.is_none()
    }

    /// Subject holds a position now or held one before
    pub fn has_activity(&self) -> bool {
        !self.is_absent()
    }
}

/// Per-category delta, tagged for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: Category,
    #[serde(flatten)]
    pub delta: RankDelta,
}

/// Computes rank deltas from a loaded cache
#[derive(Debug, Clone, Copy)]
pub struct RankDeltaEngine<'a> {
    cache: &'a SnapshotCache,
}

impl<'a> RankDeltaEngine<'a> {
    pub fn new(cache: &'a SnapshotCache) -> Self {
        Self { cache }
    }

    /// Delta for one subject in one category
    pub fn delta(&self, subject: SubjectId, category: Category) -> Result<RankDelta, CacheError> {
        let position = self.cache.lookup(subject, category)?;
        Ok(RankDelta::between(
            position.current.as_ref(),
            position.previous.as_ref(),
        ))
    }

    /// Deltas for every loaded category, in category order
    pub fn deltas_for(&self, subject: SubjectId) -> Result<Vec<CategoryDelta>, CacheError> {
        self.cache
            .loaded_categories()?
            .iter()
            .map(|&category| {
                self.delta(subject, category)
                    .map(|delta| CategoryDelta { category, delta })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySnapshotStore, SnapshotStore};
    use chrono::{Duration, TimeZone, Utc};

    fn entry(id: i64, rank: u32, score: i64) -> RankingEntry {
        RankingEntry {
            subject_id: SubjectId(id),
            rank,
            score,
        }
    }

    #[test]
    fn test_climb() {
        let delta = RankDelta::between(Some(&entry(1, 2, 90)), Some(&entry(1, 5, 40)));
        assert_eq!(delta.change, 3);
        assert!(delta.improved);
        assert_eq!(delta.score, Some(90));
        assert!(!delta.is_new);
        assert!(!delta.dropped_out);
    }

    #[test]
    fn test_fall() {
        let delta = RankDelta::between(Some(&entry(1, 4, 10)), Some(&entry(1, 1, 80)));
        assert_eq!(delta.change, -3);
        assert!(!delta.improved);
    }

    #[test]
    fn test_new_entry_has_zero_change() {
        let delta = RankDelta::between(Some(&entry(1, 1, 10)), None);
        assert!(delta.is_new);
        assert_eq!(delta.change, 0);
        assert!(!delta.improved);
    }

    #[test]
    fn test_dropped_out() {
        let delta = RankDelta::between(None, Some(&entry(1, 2, 10)));
        assert!(delta.dropped_out);
        assert_eq!(delta.change, 0);
        assert_eq!(delta.score, None);
    }

    #[test]
    fn test_absent_from_both() {
        let delta = RankDelta::between(None, None);
        assert_eq!(delta, RankDelta::default());
        assert!(delta.is_absent());
    }

    #[test]
    fn test_engine_reads_only_cache() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let store = MemorySnapshotStore::new();
        store
            .save(
                Category::MostLiked,
                &[entry(1, 1, 10), entry(2, 2, 5)],
                now - Duration::days(9),
            )
            .unwrap();
        store
            .save(
                Category::MostLiked,
                &[entry(2, 1, 30), entry(1, 2, 20)],
                now - Duration::days(1),
            )
            .unwrap();

        let cache = SnapshotCache::loaded(&store, &Category::all(), 7, now).unwrap();
        let reads = store.read_count();
        let engine = RankDeltaEngine::new(&cache);

        let up = engine.delta(SubjectId(2), Category::MostLiked).unwrap();
        assert_eq!(up.change, 1);
        assert!(up.improved);

        let all = engine.deltas_for(SubjectId(1)).unwrap();
        assert_eq!(all.len(), Category::all().len());
        assert_eq!(all[0].category, Category::MostLiked);
        assert_eq!(all[0].delta.change, -1);
        assert!(all[1..].iter().all(|d| d.delta.is_absent()));

        assert_eq!(store.read_count(), reads);
    }

    #[test]
    fn test_engine_propagates_cache_errors() {
        let cache = SnapshotCache::new();
        let engine = RankDeltaEngine::new(&cache);
        assert_eq!(
            engine.delta(SubjectId(1), Category::MostLiked),
            Err(CacheError::NotLoaded)
        );
    }
}
