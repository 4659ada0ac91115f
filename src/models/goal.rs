use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tracked resolution: one user-owned recurring objective.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub theme_id: String,
    pub recurrence: Recurrence,
    pub custom_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_completions: i64,
    /// Base point value for one completion, derived from the recurrence type
    /// at create/update time. Display only; the awarded amount also carries
    /// the streak multiplier.
    pub points_per_completion: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How often a goal comes due, i.e. how its accounting period is computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "recurrence", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Custom,
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::Daily
    }
}

impl Recurrence {
    /// Base points awarded for one completion, before the streak multiplier.
    pub fn base_points(self) -> i64 {
        match self {
            Self::Daily => 10,
            Self::Weekly => 50,
            Self::Monthly => 200,
            Self::Quarterly => 500,
            Self::Custom => 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub theme_id: String,
    pub recurrence: Recurrence,
    pub custom_deadline: Option<NaiveDate>,
}

impl Goal {
    pub fn new(user_id: Uuid, input: NewGoal, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description,
            theme_id: input.theme_id,
            recurrence: input.recurrence,
            custom_deadline: input.custom_deadline,
            is_active: true,
            current_streak: 0,
            longest_streak: 0,
            total_completions: 0,
            points_per_completion: input.recurrence.base_points(),
            last_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User-initiated edits. A soft delete is `is_active: Some(false)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub theme_id: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub custom_deadline: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

impl GoalPatch {
    /// Applies the edit in place. Changing the recurrence re-derives
    /// `points_per_completion`, mirroring goal updates in the app layer.
    pub fn apply(self, goal: &mut Goal, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            goal.title = title;
        }
        if let Some(description) = self.description {
            goal.description = description;
        }
        if let Some(theme_id) = self.theme_id {
            goal.theme_id = theme_id;
        }
        if let Some(recurrence) = self.recurrence {
            goal.recurrence = recurrence;
            goal.points_per_completion = recurrence.base_points();
        }
        if let Some(custom_deadline) = self.custom_deadline {
            goal.custom_deadline = custom_deadline;
        }
        if let Some(is_active) = self.is_active {
            goal.is_active = is_active;
        }
        goal.updated_at = now;
    }
}

/// Counter update written by the completion ledger, never by user edits.
/// Values are absolute (the ledger computed them from the goal it read); the
/// one-completion-per-period guard keeps concurrent writers from clobbering
/// each other within a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalStatsPatch {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_completions: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl GoalStatsPatch {
    pub fn apply(&self, goal: &mut Goal, now: DateTime<Utc>) {
        goal.current_streak = self.current_streak;
        // Longest streak is a historical maximum and never decreases.
        goal.longest_streak = goal.longest_streak.max(self.longest_streak);
        goal.total_completions = self.total_completions;
        goal.last_completed_at = self.last_completed_at;
        goal.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn new_goal_derives_points_from_recurrence() {
        let input = NewGoal {
            title: "Run 5k".into(),
            description: None,
            theme_id: "health".into(),
            recurrence: Recurrence::Weekly,
            custom_deadline: None,
        };
        let goal = Goal::new(Uuid::new_v4(), input, now());
        assert_eq!(goal.points_per_completion, 50);
        assert!(goal.is_active);
        assert_eq!(goal.current_streak, 0);
    }

    #[test]
    fn patch_rederives_points_on_recurrence_change() {
        let input = NewGoal {
            title: "Read".into(),
            description: None,
            theme_id: "education".into(),
            recurrence: Recurrence::Daily,
            custom_deadline: None,
        };
        let mut goal = Goal::new(Uuid::new_v4(), input, now());
        let patch = GoalPatch {
            recurrence: Some(Recurrence::Monthly),
            ..Default::default()
        };
        patch.apply(&mut goal, now());
        assert_eq!(goal.points_per_completion, 200);
    }

    #[test]
    fn soft_delete_flags_inactive() {
        let input = NewGoal {
            title: "Save".into(),
            description: None,
            theme_id: "finance".into(),
            recurrence: Recurrence::Monthly,
            custom_deadline: None,
        };
        let mut goal = Goal::new(Uuid::new_v4(), input, now());
        let patch = GoalPatch {
            is_active: Some(false),
            ..Default::default()
        };
        patch.apply(&mut goal, now());
        assert!(!goal.is_active);
    }

    #[test]
    fn stats_patch_never_lowers_longest_streak() {
        let input = NewGoal {
            title: "Meditate".into(),
            description: None,
            theme_id: "mindfulness".into(),
            recurrence: Recurrence::Daily,
            custom_deadline: None,
        };
        let mut goal = Goal::new(Uuid::new_v4(), input, now());
        goal.longest_streak = 30;
        let patch = GoalStatsPatch {
            current_streak: 4,
            longest_streak: 4,
            total_completions: 40,
            last_completed_at: Some(now()),
        };
        patch.apply(&mut goal, now());
        assert_eq!(goal.longest_streak, 30);
        assert_eq!(goal.current_streak, 4);
    }

    #[test]
    fn recurrence_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Recurrence::Quarterly).unwrap(),
            "\"quarterly\""
        );
        let parsed: Recurrence = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(parsed, Recurrence::Weekly);
    }
}
