pub mod badges;
pub mod ledger;
pub mod period;
pub mod points;
pub mod streak;

pub use badges::BadgeEvaluator;
pub use ledger::CompletionLedger;
pub use period::{current_period, Period};
pub use points::{multiplier_for, points_for};
