//! Per-subject rank digests
//!
//! The batch consumer of the snapshot cache: one [`SnapshotCache`] load, then
//! a sequential pass over subjects building each subject's rank summary.
//! Subjects with no position in any current or previous snapshot are skipped.
//! Delivery is paced by a rate limiter; rendering and sending the digest
//! itself belongs to a [`DigestSink`].

use std::num::NonZeroU32;
use std::sync::Mutex;

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::{Deserialize, Serialize};

use crate::badges::Badge;
use crate::cache::{CacheError, SnapshotCache};
use crate::delta::{RankDelta, RankDeltaEngine};
use crate::models::{Category, SubjectId};

/// Default delivery pace
pub const DEFAULT_SUBJECTS_PER_SECOND: u32 = 5;

// ============================================================================
// Digest content
// ============================================================================

/// One leaderboard line in a digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestSection {
    pub category: Category,
    pub title: String,
    pub delta: RankDelta,
}

/// Everything one subject's digest says about their rankings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestEntry {
    pub subject_id: SubjectId,
    pub sections: Vec<DigestSection>,
    pub badges: Vec<Badge>,
}

/// Digests for a batch of subjects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestPlan {
    pub entries: Vec<DigestEntry>,
    /// Subjects with no ranked activity
    pub skipped: usize,
}

/// Builds digests from a loaded cache
pub struct DigestPlanner<'a> {
    cache: &'a SnapshotCache,
}

impl<'a> DigestPlanner<'a> {
    pub fn new(cache: &'a SnapshotCache) -> Self {
        Self { cache }
    }

    /// Digest for one subject; `None` when they hold no position anywhere
    pub fn entry_for(&self, subject: SubjectId) -> Result<Option<DigestEntry>, CacheError> {
        let engine = RankDeltaEngine::new(self.cache);

        let sections: Vec<DigestSection> = engine
            .deltas_for(subject)?
            .into_iter()
            .filter(|d| d.delta.has_activity())
            .map(|d| DigestSection {
                category: d.category,
                title: d.category.title().to_string(),
                delta: d.delta,
            })
            .collect();

        if sections.is_empty() {
            return Ok(None);
        }

        Ok(Some(DigestEntry {
            subject_id: subject,
            sections,
            badges: self.cache.badges_for(subject)?,
        }))
    }

    /// Build digests for `subjects` in order
    pub fn plan<I>(&self, subjects: I) -> Result<DigestPlan, CacheError>
    where
        I: IntoIterator<Item = SubjectId>,
    {
        let mut plan = DigestPlan::default();
        for subject in subjects {
            match self.entry_for(subject)? {
                Some(entry) => plan.entries.push(entry),
                None => plan.skipped += 1,
            }
        }

        tracing::info!(
            entries = plan.entries.len(),
            skipped = plan.skipped,
            "Digest plan built"
        );
        Ok(plan)
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Destination for finished digests
#[async_trait]
pub trait DigestSink: Send + Sync {
    async fn deliver(&self, entry: &DigestEntry) -> anyhow::Result<()>;
}

/// Writes each digest to the log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl DigestSink for LogSink {
    async fn deliver(&self, entry: &DigestEntry) -> anyhow::Result<()> {
        tracing::info!(
            subject = %entry.subject_id,
            sections = entry.sections.len(),
            badges = entry.badges.len(),
            "Digest ready"
        );
        Ok(())
    }
}

/// Keeps delivered digests in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<DigestEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digests delivered so far, in delivery order
    pub fn delivered(&self) -> Vec<DigestEntry> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait]
impl DigestSink for MemorySink {
    async fn deliver(&self, entry: &DigestEntry) -> anyhow::Result<()> {
        self.delivered
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink mutex poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Sends a digest plan through a sink at a bounded rate
pub struct DigestDispatcher {
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl DigestDispatcher {
    /// Create a dispatcher; zero falls back to one subject per second
    pub fn new(subjects_per_second: u32) -> Self {
        let rate = NonZeroU32::new(subjects_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
        }
    }

    /// Deliver every entry sequentially; a failed delivery does not stop the rest
    pub async fn dispatch<S>(&self, plan: &DigestPlan, sink: &S) -> DeliveryStats
    where
        S: DigestSink + ?Sized,
    {
        let mut stats = DeliveryStats {
            skipped: plan.skipped,
            ..Default::default()
        };

        for entry in &plan.entries {
            self.rate_limiter.until_ready().await;
            match sink.deliver(entry).await {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(
                        subject = %entry.subject_id,
                        error = %format!("{e:#}"),
                        "Digest delivery failed"
                    );
                }
            }
        }

        tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            skipped = stats.skipped,
            "Digest dispatch complete"
        );
        stats
    }
}

impl Default for DigestDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECTS_PER_SECOND)
    }
}
