//! Leaderboard ranking computation
//!
//! The [`RankingComputer`] turns one bulk read from a [`ScoringSource`] into a
//! dense, deterministic ranking per category using the registered
//! [`CategoryDescriptor`]s.
//!
//! # Modules
//!
//! - [`descriptor`] - Declarative per-category rules and the ordering contract
//! - [`source`] - Scoring data sources (SQLite activity log, static rows)
//! - [`error`] - Per-category scoring failures
//!
//! # Example
//!
//! ```rust,ignore
//! use podium::ranking::{RankingComputer, StaticActivitySource};
//!
//! let computer = RankingComputer::new(Arc::new(StaticActivitySource::new(rows)));
//! let ranking = computer.compute(Category::MostLiked, Utc::now())?;
//! ```

pub mod descriptor;
pub mod error;
pub mod source;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{Category, RankingEntry};

pub use descriptor::CategoryDescriptor;
pub use error::{ScoringError, ScoringResult};
pub use source::{
    ActivityKind, ScoringSource, SqliteActivitySource, StaticActivitySource, SubjectActivity,
};

/// Computes rankings for registered categories
#[derive(Clone)]
pub struct RankingComputer {
    source: Arc<dyn ScoringSource>,
    descriptors: BTreeMap<Category, CategoryDescriptor>,
}

impl RankingComputer {
    /// Create a computer with the built-in descriptor for every category
    pub fn new(source: Arc<dyn ScoringSource>) -> Self {
        let descriptors = Category::all()
            .into_iter()
            .map(|c| (c, CategoryDescriptor::for_category(c)))
            .collect();

        Self {
            source,
            descriptors,
        }
    }

    /// Register (or replace) the descriptor for its category
    pub fn with_descriptor(mut self, descriptor: CategoryDescriptor) -> Self {
        self.descriptors.insert(descriptor.category, descriptor);
        self
    }

    /// Restrict the computer to a subset of categories
    pub fn only(mut self, categories: &[Category]) -> Self {
        self.descriptors.retain(|c, _| categories.contains(c));
        self
    }

    /// Registered categories in category order
    pub fn categories(&self) -> Vec<Category> {
        self.descriptors.keys().copied().collect()
    }

    /// Descriptor registered for a category
    pub fn descriptor(&self, category: Category) -> Option<&CategoryDescriptor> {
        self.descriptors.get(&category)
    }

    /// Compute the ranking for one category
    ///
    /// Unregistered categories rank nobody.
    pub fn compute(
        &self,
        category: Category,
        as_of: DateTime<Utc>,
    ) -> ScoringResult<Vec<RankingEntry>> {
        let Some(descriptor) = self.descriptors.get(&category) else {
            tracing::warn!(category = %category, "No descriptor registered; empty ranking");
            return Ok(Vec::new());
        };

        let rows = self.source.fetch_activity(category, as_of)?;
        let candidates = rows.len();
        let ranking = descriptor.rank(rows)?;

        tracing::debug!(
            category = %category,
            candidates,
            ranked = ranking.len(),
            "Ranking computed"
        );
        Ok(ranking)
    }

    /// Compute every registered category independently
    ///
    /// A failing category yields an `Err` in its slot and does not affect
    /// the others.
    pub fn compute_all(
        &self,
        as_of: DateTime<Utc>,
    ) -> Vec<(Category, ScoringResult<Vec<RankingEntry>>)> {
        self.categories()
            .into_iter()
            .map(|category| (category, self.compute(category, as_of)))
            .collect()
    }
}
