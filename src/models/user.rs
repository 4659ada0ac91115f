use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Denormalized per-user aggregates, mutated only by the completion ledger.
///
/// `current_streak`/`longest_streak` here are the *global* counters; each goal
/// carries its own pair. They are intentionally distinct accumulators that
/// happen to follow the same update rules.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStats {
    pub user_id: Uuid,
    pub points: i64,
    pub total_completions: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            points: 0,
            total_completions: 0,
            current_streak: 0,
            longest_streak: 0,
            updated_at: now,
        }
    }
}

/// Delta update to the aggregates. Applying clamps `points` and
/// `total_completions` at zero so an undo against inconsistent prior state
/// never goes negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserStatsPatch {
    pub points_delta: i64,
    pub completions_delta: i64,
    pub streak_delta: i32,
}

impl UserStatsPatch {
    pub fn apply(&self, stats: &mut UserStats, now: DateTime<Utc>) {
        stats.points = (stats.points + self.points_delta).max(0);
        stats.total_completions = (stats.total_completions + self.completions_delta).max(0);
        stats.current_streak = (stats.current_streak + self.streak_delta).max(0);
        stats.longest_streak = stats.longest_streak.max(stats.current_streak);
        stats.updated_at = now;
    }
}
