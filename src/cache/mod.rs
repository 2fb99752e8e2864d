//! Batch-loaded snapshot cache
//!
//! Batch consumers (digests, bulk delta reports) build one [`SnapshotCache`]
//! per job. Loading costs exactly two storage reads no matter how many
//! categories or subjects follow; every lookup after that is a hash lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use podium::cache::SnapshotCache;
//!
//! let cache = SnapshotCache::loaded(store.as_ref(), &Category::all(), 7, Utc::now())?;
//! for subject in subjects {
//!     let position = cache.lookup(subject, Category::MostLiked)?;
//! }
//! ```
//!
//! The cache is an owned value threaded through the job. Lookups before a
//! load, or for a category the load did not cover, are errors rather than
//! empty answers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::badges::{sort_badges, Badge};
use crate::models::{Category, RankingEntry, Snapshot, SubjectId};
use crate::storage::SnapshotStore;

// ============================================================================
// Errors
// ============================================================================

/// Misuse of the cache by its caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("snapshot cache used before load()")]
    NotLoaded,

    #[error("category '{0}' was not included in the cache load")]
    CategoryNotLoaded(Category),
}

impl CacheError {
    /// Cache errors are caller bugs; retrying cannot help
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// A subject's entries in the current and previous snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachedPosition {
    pub current: Option<RankingEntry>,
    pub previous: Option<RankingEntry>,
}

/// Snapshot re-indexed by subject
#[derive(Debug, Clone)]
struct IndexedSnapshot {
    taken_at: DateTime<Utc>,
    entries: HashMap<SubjectId, RankingEntry>,
}

impl From<Snapshot> for IndexedSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        let entries = snapshot
            .rankings
            .into_iter()
            .map(|e| (e.subject_id, e))
            .collect();
        Self {
            taken_at: snapshot.taken_at,
            entries,
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedSnapshots {
    categories: Vec<Category>,
    loaded_at: DateTime<Utc>,
    current: HashMap<Category, IndexedSnapshot>,
    previous: HashMap<Category, IndexedSnapshot>,
}

/// Two-sided snapshot cache for one batch job
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    state: Option<LoadedSnapshots>,
}

impl SnapshotCache {
    /// Create an unloaded cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and load in one step
    pub fn loaded<S>(
        store: &S,
        categories: &[Category],
        window_days: i64,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Self>
    where
        S: SnapshotStore + ?Sized,
    {
        let mut cache = Self::new();
        cache.load(store, categories, window_days, now)?;
        Ok(cache)
    }

    /// Load current and previous snapshots for `categories`
    ///
    /// "Current" is the latest snapshot taken within `window_days` of `now`;
    /// "previous" is the latest one taken before that. Reloading replaces the
    /// whole cache.
    pub fn load<S>(
        &mut self,
        store: &S,
        categories: &[Category],
        window_days: i64,
        now: DateTime<Utc>,
    ) -> crate::error::Result<()>
    where
        S: SnapshotStore + ?Sized,
    {
        let latest =
            store.find_all_latest_per_category(categories, Duration::days(window_days), now)?;

        let index = |map: HashMap<Category, Snapshot>| -> HashMap<Category, IndexedSnapshot> {
            map.into_iter().map(|(c, s)| (c, s.into())).collect()
        };

        let mut categories = categories.to_vec();
        categories.sort();
        categories.dedup();

        let state = LoadedSnapshots {
            categories,
            loaded_at: now,
            current: index(latest.current),
            previous: index(latest.previous),
        };

        tracing::info!(
            categories = state.categories.len(),
            current = state.current.len(),
            previous = state.previous.len(),
            window_days,
            "Snapshot cache loaded"
        );
        crate::metrics::record_cache_load(state.categories.len());

        self.state = Some(state);
        Ok(())
    }

    /// Whether `load()` has completed
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Time the cache was loaded for
    pub fn loaded_at(&self) -> Result<DateTime<Utc>, CacheError> {
        Ok(self.state()?.loaded_at)
    }

    /// Categories covered by the load, in category order
    pub fn loaded_categories(&self) -> Result<&[Category], CacheError> {
        Ok(&self.state()?.categories)
    }

    fn state(&self) -> Result<&LoadedSnapshots, CacheError> {
        self.state.as_ref().ok_or(CacheError::NotLoaded)
    }

    fn checked(&self, category: Category) -> Result<&LoadedSnapshots, CacheError> {
        let state = self.state()?;
        if state.categories.binary_search(&category).is_err() {
            return Err(CacheError::CategoryNotLoaded(category));
        }
        Ok(state)
    }

    /// Current and previous entries for a subject
    pub fn lookup(
        &self,
        subject: SubjectId,
        category: Category,
    ) -> Result<CachedPosition, CacheError> {
        let state = self.checked(category)?;
        let find = |side: &HashMap<Category, IndexedSnapshot>| {
            side.get(&category)
                .and_then(|s| s.entries.get(&subject))
                .copied()
        };

        Ok(CachedPosition {
            current: find(&state.current),
            previous: find(&state.previous),
        })
    }

    /// Entry in the current snapshot
    pub fn lookup_current(
        &self,
        subject: SubjectId,
        category: Category,
    ) -> Result<Option<RankingEntry>, CacheError> {
        Ok(self.lookup(subject, category)?.current)
    }

    /// Entry in the previous snapshot
    pub fn lookup_previous(
        &self,
        subject: SubjectId,
        category: Category,
    ) -> Result<Option<RankingEntry>, CacheError> {
        Ok(self.lookup(subject, category)?.previous)
    }

    /// `taken_at` of the current snapshot, if one exists
    pub fn current_taken_at(&self, category: Category) -> Result<Option<DateTime<Utc>>, CacheError> {
        let state = self.checked(category)?;
        Ok(state.current.get(&category).map(|s| s.taken_at))
    }

    /// `taken_at` of the previous snapshot, if one exists
    pub fn previous_taken_at(
        &self,
        category: Category,
    ) -> Result<Option<DateTime<Utc>>, CacheError> {
        let state = self.checked(category)?;
        Ok(state.previous.get(&category).map(|s| s.taken_at))
    }

    /// Number of subjects ranked in the current snapshot
    pub fn current_len(&self, category: Category) -> Result<usize, CacheError> {
        let state = self.checked(category)?;
        Ok(state.current.get(&category).map_or(0, |s| s.entries.len()))
    }

    /// Podium badges from the current snapshots
    ///
    /// Agrees with [`BadgeExtractor`](crate::badges::BadgeExtractor) when both
    /// use the same window and `now`.
    pub fn badges_for(&self, subject: SubjectId) -> Result<Vec<Badge>, CacheError> {
        let state = self.state()?;
        let mut badges: Vec<Badge> = state
            .categories
            .iter()
            .filter_map(|c| {
                let snapshot = state.current.get(c)?;
                let entry = snapshot.entries.get(&subject)?;
                Badge::from_entry(*c, entry, snapshot.taken_at)
            })
            .collect();
        sort_badges(&mut badges);
        Ok(badges)
    }

    /// Subjects holding any current position, in id order
    pub fn current_subjects(&self) -> Result<Vec<SubjectId>, CacheError> {
        let state = self.state()?;
        let mut subjects: Vec<SubjectId> = state
            .current
            .values()
            .flat_map(|s| s.entries.keys().copied())
            .collect();
        subjects.sort();
        subjects.dedup();
        Ok(subjects)
    }
}
