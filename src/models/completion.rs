use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable ledger entry: one goal completed within one period.
///
/// At most one row exists per (goal, period_start); the store enforces this
/// and the ledger leans on it as the idempotence guard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Completion {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub points_earned: i64,
    pub streak_at_completion: i32,
}

/// What `complete()` reports back to the caller.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub points_earned: i64,
    pub new_streak: i32,
}
