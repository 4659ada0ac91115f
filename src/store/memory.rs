//! In-memory store: the reference implementation of the store traits. A
//! single `RwLock` write guard plays the role of the database transaction, so
//! the multi-record ledger writes are atomic by construction. Used by the
//! test suite and suitable for embedding in previews or offline mode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CoreResult, Error};
use crate::models::{
    Completion, Goal, GoalPatch, GoalStatsPatch, UserBadge, UserStats, UserStatsPatch,
};
use crate::store::{BadgeStore, CompletionStore, GoalStore, LedgerStore, UserStatsStore};

#[derive(Default)]
struct Inner {
    goals: HashMap<Uuid, Goal>,
    completions: HashMap<Uuid, Completion>,
    stats: HashMap<Uuid, UserStats>,
    // keyed by (user, badge) — the at-most-once invariant is the key itself
    badges: HashMap<(Uuid, String), UserBadge>,
}

impl Inner {
    fn goal_mut(&mut self, user_id: Uuid, goal_id: Uuid) -> CoreResult<&mut Goal> {
        match self.goals.get_mut(&goal_id) {
            Some(goal) if goal.user_id == user_id => Ok(goal),
            _ => Err(Error::goal_not_found(goal_id)),
        }
    }

    fn stats_entry(&mut self, user_id: Uuid) -> &mut UserStats {
        self.stats
            .entry(user_id)
            .or_insert_with(|| UserStats::new(user_id, Utc::now()))
    }

    fn conflicting_completion(&self, goal_id: Uuid, period_start: DateTime<Utc>) -> bool {
        self.completions
            .values()
            .any(|c| c.goal_id == goal_id && c.period_start == period_start)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GoalStore for MemoryStore {
    async fn goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Option<Goal>> {
        let inner = self.inner.read().await;
        Ok(inner
            .goals
            .get(&goal_id)
            .filter(|g| g.user_id == user_id)
            .cloned())
    }

    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn apply_goal_patch(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patch: GoalPatch,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        let goal = inner.goal_mut(user_id, goal_id)?;
        patch.apply(goal, Utc::now());
        Ok(())
    }

    async fn active_goals(&self, user_id: Uuid) -> CoreResult<Vec<Goal>> {
        let inner = self.inner.read().await;
        let mut goals: Vec<Goal> = inner
            .goals
            .values()
            .filter(|g| g.user_id == user_id && g.is_active)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn find_in_period(
        &self,
        goal_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Option<Completion>> {
        let inner = self.inner.read().await;
        Ok(inner
            .completions
            .values()
            .find(|c| c.goal_id == goal_id && c.period_start >= start && c.period_start < end)
            .cloned())
    }

    async fn completions_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<Completion>> {
        let inner = self.inner.read().await;
        let mut completions: Vec<Completion> = inner
            .completions
            .values()
            .filter(|c| c.user_id == user_id && c.completed_at >= start && c.completed_at < end)
            .cloned()
            .collect();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(completions)
    }
}

#[async_trait]
impl UserStatsStore for MemoryStore {
    async fn user_stats(&self, user_id: Uuid) -> CoreResult<UserStats> {
        let mut inner = self.inner.write().await;
        Ok(inner.stats_entry(user_id).clone())
    }

    async fn apply_stats_patch(&self, user_id: Uuid, patch: UserStatsPatch) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        patch.apply(inner.stats_entry(user_id), now);
        Ok(())
    }
}

#[async_trait]
impl BadgeStore for MemoryStore {
    async fn earned_badge_ids(&self, user_id: Uuid) -> CoreResult<HashSet<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .badges
            .keys()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, badge_id)| badge_id.clone())
            .collect())
    }

    async fn earned_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>> {
        let inner = self.inner.read().await;
        let mut earned: Vec<UserBadge> = inner
            .badges
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|(_, b)| b.clone())
            .collect();
        earned.sort_by(|a, b| a.earned_at.cmp(&b.earned_at));
        Ok(earned)
    }

    async fn award_badge(
        &self,
        user_id: Uuid,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut inner = self.inner.write().await;
        let key = (user_id, badge_id.to_string());
        if inner.badges.contains_key(&key) {
            return Ok(false);
        }
        inner.badges.insert(
            key,
            UserBadge {
                badge_id: badge_id.to_string(),
                earned_at,
                notified: false,
            },
        );
        Ok(true)
    }

    async fn mark_notified(&self, user_id: Uuid, badge_id: &str) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(badge) = inner.badges.get_mut(&(user_id, badge_id.to_string())) {
            badge.notified = true;
        }
        Ok(())
    }

    async fn unnotified_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>> {
        let inner = self.inner.read().await;
        Ok(inner
            .badges
            .iter()
            .filter(|((uid, _), b)| *uid == user_id && !b.notified)
            .map(|(_, b)| b.clone())
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn commit_completion(
        &self,
        completion: &Completion,
        goal_patch: &GoalStatsPatch,
        stats_patch: UserStatsPatch,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.conflicting_completion(completion.goal_id, completion.period_start) {
            return Err(Error::AlreadyCompleted);
        }
        // All three writes happen under the one guard.
        let now = Utc::now();
        {
            let goal = inner.goal_mut(completion.user_id, completion.goal_id)?;
            goal_patch.apply(goal, now);
        }
        stats_patch.apply(inner.stats_entry(completion.user_id), now);
        inner.completions.insert(completion.id, completion.clone());
        Ok(())
    }

    async fn revert_completion(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        completion_id: Uuid,
        goal_patch: &GoalStatsPatch,
        stats_patch: UserStatsPatch,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .completions
            .get(&completion_id)
            .map_or(false, |c| c.user_id == user_id && c.goal_id == goal_id);
        if !owned {
            return Err(Error::NothingToUndo);
        }
        inner.completions.remove(&completion_id);
        let now = Utc::now();
        {
            let goal = inner.goal_mut(user_id, goal_id)?;
            goal_patch.apply(goal, now);
        }
        stats_patch.apply(inner.stats_entry(user_id), now);
        Ok(())
    }
}
