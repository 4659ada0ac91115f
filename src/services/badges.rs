//! Badge evaluation against aggregate user stats, plus the award
//! orchestration that persists new unlocks exactly once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::catalog::{level_for_points, BadgeCatalog};
use crate::error::CoreResult;
use crate::models::{Badge, CriteriaKind, UserStats};
use crate::store::BadgeStore;

pub struct BadgeEvaluator<'a> {
    catalog: &'a BadgeCatalog,
}

impl<'a> BadgeEvaluator<'a> {
    pub fn new(catalog: &'a BadgeCatalog) -> Self {
        Self { catalog }
    }

    /// Badges whose criteria the stats now satisfy and that are not already
    /// earned, in catalog order. Pure: earned-state is never mutated here.
    pub fn evaluate(&self, stats: &UserStats, earned_ids: &HashSet<String>) -> Vec<&'a Badge> {
        self.catalog
            .iter()
            .filter(|badge| !earned_ids.contains(badge.id))
            .filter(|badge| Self::qualifies(badge, stats))
            .collect()
    }

    fn qualifies(badge: &Badge, stats: &UserStats) -> bool {
        let threshold = badge.criteria.threshold;
        match badge.criteria.kind {
            // Either counter triggers: a streak badge earned at the peak is
            // kept even after the streak drops.
            CriteriaKind::Streak => {
                stats.current_streak as i64 >= threshold
                    || stats.longest_streak as i64 >= threshold
            }
            CriteriaKind::TotalCompletions => stats.total_completions >= threshold,
            CriteriaKind::Points => stats.points >= threshold,
            // Level is derived from points at evaluation time, never stored.
            CriteriaKind::Level => level_for_points(stats.points) as i64 >= threshold,
            // These need tracking dimensions (challenge wins, per-theme
            // counts) the core does not model; callers with that data must
            // extend evaluation themselves.
            CriteriaKind::PartnerChallenge | CriteriaKind::ThemeMastery | CriteriaKind::Special => {
                false
            }
        }
    }

    /// Evaluates against the stored earned set and persists every new unlock.
    /// `BadgeStore::award_badge` is idempotent, so a concurrent award of the
    /// same badge is reported by exactly one caller.
    pub async fn award_new<S: BadgeStore>(
        &self,
        store: &S,
        stats: &UserStats,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<&'a Badge>> {
        let earned_ids = store.earned_badge_ids(stats.user_id).await?;
        let mut unlocked = Vec::new();
        for badge in self.evaluate(stats, &earned_ids) {
            if store.award_badge(stats.user_id, badge.id, now).await? {
                tracing::info!(
                    user_id = %stats.user_id,
                    badge_id = badge.id,
                    bonus_points = badge.bonus_points,
                    "badge unlocked"
                );
                unlocked.push(badge);
            }
        }
        Ok(unlocked)
    }
}
