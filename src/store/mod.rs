//! Collaborator interfaces the core is written against. The surrounding
//! application supplies a backing store; [`memory::MemoryStore`] is the
//! reference implementation and [`postgres::PgStore`] the production one.
//!
//! Everything is scoped to a single user's subtree; no cross-user locking is
//! ever required.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{Completion, Goal, GoalPatch, GoalStatsPatch, UserBadge, UserStats, UserStatsPatch};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Option<Goal>>;

    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()>;

    /// User-initiated edit (title, theme, recurrence, soft delete, ...).
    async fn apply_goal_patch(&self, user_id: Uuid, goal_id: Uuid, patch: GoalPatch)
        -> CoreResult<()>;

    /// Active (not soft-deleted) goals, newest first.
    async fn active_goals(&self, user_id: Uuid) -> CoreResult<Vec<Goal>>;
}

#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// The completion whose period starts within `[start, end)`, if any.
    async fn find_in_period(
        &self,
        goal_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Option<Completion>>;

    /// Completion history for a user across all goals, newest first.
    async fn completions_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<Completion>>;
}

#[async_trait]
pub trait UserStatsStore: Send + Sync {
    /// Aggregates for a user, creating a zeroed row on first sight.
    async fn user_stats(&self, user_id: Uuid) -> CoreResult<UserStats>;

    /// Delta update, clamped at zero. Outside the ledger this exists for
    /// app-layer adjustments such as badge bonus points.
    async fn apply_stats_patch(&self, user_id: Uuid, patch: UserStatsPatch) -> CoreResult<()>;
}

#[async_trait]
pub trait BadgeStore: Send + Sync {
    async fn earned_badge_ids(&self, user_id: Uuid) -> CoreResult<HashSet<String>>;

    async fn earned_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>>;

    /// Records the badge as earned. Idempotent: returns `true` only for the
    /// call that actually created the record, so concurrent award attempts
    /// cannot double-count.
    async fn award_badge(
        &self,
        user_id: Uuid,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> CoreResult<bool>;

    async fn mark_notified(&self, user_id: Uuid, badge_id: &str) -> CoreResult<()>;

    async fn unnotified_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>>;
}

/// The ledger's view of the store: the per-record interfaces plus the two
/// multi-record writes that must be atomic (completion row, goal counters,
/// user aggregates all land or none do).
#[async_trait]
pub trait LedgerStore: GoalStore + CompletionStore + UserStatsStore + BadgeStore {
    /// Inserts the completion and applies both counter updates as one unit.
    ///
    /// Fails with `Error::AlreadyCompleted` when a completion already exists
    /// for the goal at `completion.period_start` — this is the race-safe form
    /// of the ledger's guard, enforced by the store's uniqueness key.
    async fn commit_completion(
        &self,
        completion: &Completion,
        goal_patch: &GoalStatsPatch,
        stats_patch: UserStatsPatch,
    ) -> CoreResult<()>;

    /// Deletes the completion and applies both counter updates as one unit.
    /// Fails with `Error::NothingToUndo` when the completion is already gone.
    async fn revert_completion(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        completion_id: Uuid,
        goal_patch: &GoalStatsPatch,
        stats_patch: UserStatsPatch,
    ) -> CoreResult<()>;
}
