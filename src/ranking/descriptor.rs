//! Declarative per-category ranking rules
//!
//! Each leaderboard is described once by a [`CategoryDescriptor`]: who
//! qualifies, how they are scored, and the score at or below which they are
//! dropped. [`CategoryDescriptor::rank`] applies any descriptor the same way.
//!
//! # Ordering contract
//!
//! Rankings sort by score descending, then by [`SubjectId`] ascending. The
//! secondary key is fixed for every category so equal scores never share a
//! rank and two runs over the same data produce identical snapshots, which
//! rank-delta comparisons depend on.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Category, RankingEntry, SubjectId};

use super::error::{ScoringError, ScoringResult};
use super::source::SubjectActivity;

/// Subjects who joined within this many days compete as rising stars
pub const RISING_STAR_MAX_AGE_DAYS: i64 = 180;

/// Window for "recent" likes used by the rising-stars board
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

/// Ranking rules for one leaderboard
#[derive(Clone, Copy)]
pub struct CategoryDescriptor {
    pub category: Category,
    /// Eligibility predicate; failing subjects are omitted entirely
    pub qualifies: fn(&SubjectActivity) -> bool,
    /// Score expression over the aggregated activity row; must not panic
    pub score: fn(&SubjectActivity) -> i64,
    /// Scores at or below this value are disqualified
    pub min_score: i64,
}

impl CategoryDescriptor {
    /// Create a descriptor with the default threshold (scores must be positive)
    pub fn new(
        category: Category,
        qualifies: fn(&SubjectActivity) -> bool,
        score: fn(&SubjectActivity) -> i64,
    ) -> Self {
        Self {
            category,
            qualifies,
            score,
            min_score: 0,
        }
    }

    /// Built-in rules for a category
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::MostLiked => Self::new(category, |a| a.is_active, |a| a.likes_received),
            Category::CompetitionChampions => Self::new(
                category,
                |a| a.is_active && (a.competition_wins > 0 || a.competition_podiums > 0),
                |a| {
                    a.competition_wins
                        .saturating_mul(3)
                        .saturating_add(a.competition_podiums)
                },
            ),
            Category::TopTeachers => Self::new(
                category,
                |a| a.is_active && a.is_teacher,
                |a| a.students_taught,
            ),
            Category::MostFollowed => Self::new(category, |a| a.is_active, |a| a.followers),
            Category::MostActive => Self::new(
                category,
                |a| a.is_active,
                |a| a.posts.saturating_add(a.comments),
            ),
            Category::RisingStars => Self::new(
                category,
                |a| a.is_active && a.account_age_days <= RISING_STAR_MAX_AGE_DAYS,
                |a| a.recent_likes_received,
            ),
            Category::TopEventHosts => Self::new(category, |a| a.is_active, |a| a.events_hosted),
            Category::TopChoreographers => Self::new(
                category,
                |a| a.is_active && a.choreographies_published > 0,
                |a| a.choreography_views,
            ),
        }
    }

    /// Override the disqualification threshold
    pub fn with_min_score(mut self, min_score: i64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Order the given activity rows into a dense ranking
    ///
    /// Non-qualifying subjects and subjects scoring at or below `min_score`
    /// are left out, so ranks always form exactly `1..=N`.
    pub fn rank<I>(&self, rows: I) -> ScoringResult<Vec<RankingEntry>>
    where
        I: IntoIterator<Item = SubjectActivity>,
    {
        let mut seen = HashSet::new();
        let mut scored: Vec<(SubjectId, i64)> = Vec::new();

        for row in rows {
            if !seen.insert(row.subject_id) {
                return Err(ScoringError::DuplicateSubject {
                    category: self.category,
                    subject_id: row.subject_id,
                });
            }
            if !(self.qualifies)(&row) {
                continue;
            }
            let score = (self.score)(&row);
            if score > self.min_score {
                scored.push((row.subject_id, score));
            }
        }

        scored.sort_by(|a, b| compare_scored(*a, *b));

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (subject_id, score))| RankingEntry {
                subject_id,
                rank: i as u32 + 1,
                score,
            })
            .collect())
    }
}

impl std::fmt::Debug for CategoryDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryDescriptor")
            .field("category", &self.category)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

/// Score descending, then subject id ascending
fn compare_scored(a: (SubjectId, i64), b: (SubjectId, i64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn liked(id: i64, likes: i64) -> SubjectActivity {
        SubjectActivity {
            likes_received: likes,
            ..SubjectActivity::new(SubjectId(id))
        }
    }

    #[test]
    fn test_ties_broken_by_subject_id() {
        let descriptor = CategoryDescriptor::for_category(Category::MostLiked);
        let ranking = descriptor
            .rank(vec![liked(9, 40), liked(3, 40), liked(5, 50)])
            .unwrap();

        let order: Vec<_> = ranking.iter().map(|e| (e.subject_id.0, e.rank)).collect();
        assert_eq!(order, vec![(5, 1), (3, 2), (9, 3)]);
    }

    #[test]
    fn test_zero_scores_excluded() {
        let descriptor = CategoryDescriptor::for_category(Category::MostLiked);
        let ranking = descriptor
            .rank(vec![liked(1, 0), liked(2, 7), liked(3, -2)])
            .unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].subject_id, SubjectId(2));
        assert_eq!(ranking[0].rank, 1);
    }

    #[test]
    fn test_inactive_subjects_do_not_qualify() {
        let descriptor = CategoryDescriptor::for_category(Category::MostLiked);
        let inactive = SubjectActivity {
            is_active: false,
            ..liked(1, 500)
        };
        let ranking = descriptor.rank(vec![inactive, liked(2, 3)]).unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].subject_id, SubjectId(2));
    }

    #[test]
    fn test_top_teachers_requires_teacher_flag() {
        let descriptor = CategoryDescriptor::for_category(Category::TopTeachers);
        let student = SubjectActivity {
            students_taught: 30,
            ..SubjectActivity::new(SubjectId(1))
        };
        let teacher = SubjectActivity {
            is_teacher: true,
            students_taught: 12,
            ..SubjectActivity::new(SubjectId(2))
        };
        let ranking = descriptor.rank(vec![student, teacher]).unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].subject_id, SubjectId(2));
        assert_eq!(ranking[0].score, 12);
    }

    #[test]
    fn test_competition_score_weights_wins() {
        let descriptor = CategoryDescriptor::for_category(Category::CompetitionChampions);
        let champion = SubjectActivity {
            competition_wins: 2,
            competition_podiums: 1,
            ..SubjectActivity::new(SubjectId(1))
        };
        let finalist = SubjectActivity {
            competition_podiums: 6,
            ..SubjectActivity::new(SubjectId(2))
        };
        let ranking = descriptor.rank(vec![finalist, champion]).unwrap();

        assert_eq!(ranking[0].subject_id, SubjectId(1));
        assert_eq!(ranking[0].score, 7);
        assert_eq!(ranking[1].score, 6);
    }

    #[test]
    fn test_rising_stars_age_cutoff() {
        let descriptor = CategoryDescriptor::for_category(Category::RisingStars);
        let veteran = SubjectActivity {
            account_age_days: RISING_STAR_MAX_AGE_DAYS + 1,
            recent_likes_received: 90,
            ..SubjectActivity::new(SubjectId(1))
        };
        let newcomer = SubjectActivity {
            account_age_days: 20,
            recent_likes_received: 15,
            ..SubjectActivity::new(SubjectId(2))
        };
        let ranking = descriptor.rank(vec![veteran, newcomer]).unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].subject_id, SubjectId(2));
    }

    #[test]
    fn test_custom_min_score() {
        let descriptor = CategoryDescriptor::for_category(Category::MostLiked).with_min_score(10);
        let ranking = descriptor
            .rank(vec![liked(1, 10), liked(2, 11)])
            .unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].subject_id, SubjectId(2));
    }

    #[test]
    fn test_duplicate_subject_rejected() {
        let descriptor = CategoryDescriptor::for_category(Category::MostLiked);
        let result = descriptor.rank(vec![liked(1, 5), liked(1, 6)]);

        assert!(matches!(
            result,
            Err(ScoringError::DuplicateSubject { subject_id: SubjectId(1), .. })
        ));
    }

    #[test]
    fn test_extreme_counts_saturate() {
        let busy = SubjectActivity {
            posts: i64::MAX,
            comments: 1,
            competition_wins: i64::MAX / 2,
            competition_podiums: i64::MAX,
            ..SubjectActivity::new(SubjectId(1))
        };
        let quiet = SubjectActivity {
            posts: 3,
            competition_podiums: 1,
            ..SubjectActivity::new(SubjectId(2))
        };

        for category in [Category::MostActive, Category::CompetitionChampions] {
            let ranking = CategoryDescriptor::for_category(category)
                .rank(vec![quiet.clone(), busy.clone()])
                .unwrap();
            assert_eq!(ranking[0].subject_id, SubjectId(1), "{category}");
            assert_eq!(ranking[0].score, i64::MAX, "{category}");
            assert_eq!(ranking[1].subject_id, SubjectId(2), "{category}");
        }
    }
}
