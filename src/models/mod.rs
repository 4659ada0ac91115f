pub mod badge;
pub mod completion;
pub mod goal;
pub mod user;

pub use badge::{Badge, BadgeCategory, BadgeCriteria, BadgeRarity, CriteriaKind, UserBadge};
pub use completion::{Completion, CompletionOutcome};
pub use goal::{Goal, GoalPatch, GoalStatsPatch, NewGoal, Recurrence};
pub use user::{UserStats, UserStatsPatch};
