//! Postgres store. The multi-record ledger writes run inside one sqlx
//! transaction; the `uq_completions_goal_period` unique index carries the
//! one-completion-per-period guard, so a racing insert surfaces as
//! `AlreadyCompleted` instead of a double award.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreResult, Error};
use crate::models::{
    Completion, Goal, GoalPatch, GoalStatsPatch, UserBadge, UserStats, UserStatsPatch,
};
use crate::store::{BadgeStore, CompletionStore, GoalStore, LedgerStore, UserStatsStore};

pub async fn create_pool(database_url: &str) -> CoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> CoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Store(e.into()))?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl GoalStore for PgStore {
    async fn goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(goal)
    }

    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO goals (
                id, user_id, title, description, theme_id, recurrence,
                custom_deadline, is_active, current_streak, longest_streak,
                total_completions, points_per_completion, last_completed_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(goal.id)
        .bind(goal.user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(&goal.theme_id)
        .bind(goal.recurrence)
        .bind(goal.custom_deadline)
        .bind(goal.is_active)
        .bind(goal.current_streak)
        .bind(goal.longest_streak)
        .bind(goal.total_completions)
        .bind(goal.points_per_completion)
        .bind(goal.last_completed_at)
        .bind(goal.created_at)
        .bind(goal.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn apply_goal_patch(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patch: GoalPatch,
    ) -> CoreResult<()> {
        // Read-modify-write keeps the recurrence -> points_per_completion
        // derivation in one place (GoalPatch::apply).
        let mut goal = self
            .goal(user_id, goal_id)
            .await?
            .ok_or_else(|| Error::goal_not_found(goal_id))?;
        patch.apply(&mut goal, Utc::now());

        sqlx::query(
            r#"
            UPDATE goals SET
                title = $3,
                description = $4,
                theme_id = $5,
                recurrence = $6,
                custom_deadline = $7,
                is_active = $8,
                points_per_completion = $9,
                updated_at = $10
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(&goal.theme_id)
        .bind(goal.recurrence)
        .bind(goal.custom_deadline)
        .bind(goal.is_active)
        .bind(goal.points_per_completion)
        .bind(goal.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_goals(&self, user_id: Uuid) -> CoreResult<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            "SELECT * FROM goals WHERE user_id = $1 AND is_active = TRUE ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(goals)
    }
}

#[async_trait]
impl CompletionStore for PgStore {
    async fn find_in_period(
        &self,
        goal_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Option<Completion>> {
        let completion = sqlx::query_as::<_, Completion>(
            r#"
            SELECT * FROM completions
            WHERE goal_id = $1 AND period_start >= $2 AND period_start < $3
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(goal_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;
        Ok(completion)
    }

    async fn completions_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<Completion>> {
        let completions = sqlx::query_as::<_, Completion>(
            r#"
            SELECT * FROM completions
            WHERE user_id = $1 AND completed_at >= $2 AND completed_at < $3
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(completions)
    }
}

#[async_trait]
impl UserStatsStore for PgStore {
    async fn user_stats(&self, user_id: Uuid) -> CoreResult<UserStats> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            INSERT INTO user_stats (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = user_stats.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn apply_stats_patch(&self, user_id: Uuid, patch: UserStatsPatch) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE user_stats SET
                points = GREATEST(0, points + $2),
                total_completions = GREATEST(0, total_completions + $3),
                current_streak = GREATEST(0, current_streak + $4),
                longest_streak = GREATEST(longest_streak, GREATEST(0, current_streak + $4)),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(patch.points_delta)
        .bind(patch.completions_delta)
        .bind(patch.streak_delta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BadgeStore for PgStore {
    async fn earned_badge_ids(&self, user_id: Uuid) -> CoreResult<HashSet<String>> {
        let ids =
            sqlx::query_scalar::<_, String>("SELECT badge_id FROM user_badges WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    async fn earned_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>> {
        let badges = sqlx::query_as::<_, UserBadge>(
            "SELECT badge_id, earned_at, notified FROM user_badges WHERE user_id = $1 ORDER BY earned_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(badges)
    }

    async fn award_badge(
        &self,
        user_id: Uuid,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        // Conditional create: the primary key makes a second award a no-op.
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id, earned_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(earned_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_notified(&self, user_id: Uuid, badge_id: &str) -> CoreResult<()> {
        sqlx::query("UPDATE user_badges SET notified = TRUE WHERE user_id = $1 AND badge_id = $2")
            .bind(user_id)
            .bind(badge_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unnotified_badges(&self, user_id: Uuid) -> CoreResult<Vec<UserBadge>> {
        let badges = sqlx::query_as::<_, UserBadge>(
            "SELECT badge_id, earned_at, notified FROM user_badges WHERE user_id = $1 AND notified = FALSE",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(badges)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn commit_completion(
        &self,
        completion: &Completion,
        goal_patch: &GoalStatsPatch,
        stats_patch: UserStatsPatch,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO completions (
                id, goal_id, user_id, completed_at, period_start, period_end,
                points_earned, streak_at_completion
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (goal_id, period_start) DO NOTHING
            "#,
        )
        .bind(completion.id)
        .bind(completion.goal_id)
        .bind(completion.user_id)
        .bind(completion.completed_at)
        .bind(completion.period_start)
        .bind(completion.period_end)
        .bind(completion.points_earned)
        .bind(completion.streak_at_completion)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // A concurrent complete won; nothing was written.
            tx.rollback().await?;
            return Err(Error::AlreadyCompleted);
        }

        sqlx::query(
            r#"
            UPDATE goals SET
                current_streak = $3,
                longest_streak = GREATEST(longest_streak, $4),
                total_completions = $5,
                last_completed_at = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(completion.goal_id)
        .bind(completion.user_id)
        .bind(goal_patch.current_streak)
        .bind(goal_patch.longest_streak)
        .bind(goal_patch.total_completions)
        .bind(goal_patch.last_completed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, points, total_completions, current_streak, longest_streak)
            VALUES ($1, GREATEST(0, $2), GREATEST(0, $3), GREATEST(0, $4), GREATEST(0, $4))
            ON CONFLICT (user_id) DO UPDATE SET
                points = GREATEST(0, user_stats.points + $2),
                total_completions = GREATEST(0, user_stats.total_completions + $3),
                current_streak = GREATEST(0, user_stats.current_streak + $4),
                longest_streak = GREATEST(user_stats.longest_streak,
                                          GREATEST(0, user_stats.current_streak + $4)),
                updated_at = NOW()
            "#,
        )
        .bind(completion.user_id)
        .bind(stats_patch.points_delta)
        .bind(stats_patch.completions_delta)
        .bind(stats_patch.streak_delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
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
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM completions WHERE id = $1 AND goal_id = $2 AND user_id = $3",
        )
        .bind(completion_id)
        .bind(goal_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::NothingToUndo);
        }

        sqlx::query(
            r#"
            UPDATE goals SET
                current_streak = $3,
                longest_streak = GREATEST(longest_streak, $4),
                total_completions = $5,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(goal_patch.current_streak)
        .bind(goal_patch.longest_streak)
        .bind(goal_patch.total_completions)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE user_stats SET
                points = GREATEST(0, points + $2),
                total_completions = GREATEST(0, total_completions + $3),
                current_streak = GREATEST(0, current_streak + $4),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(stats_patch.points_delta)
        .bind(stats_patch.completions_delta)
        .bind(stats_patch.streak_delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
