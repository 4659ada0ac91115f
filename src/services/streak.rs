//! Streak arithmetic. The ledger guarantees it only calls these for the
//! current period; there is no gap detection, so a skipped period leaves the
//! streak untouched and only an explicit undo lowers it.

/// Counters after recording a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakAdvance {
    pub current: i32,
    pub longest: i32,
}

/// Counters after undoing a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRetreat {
    pub current: i32,
    pub total_completions: i64,
}

/// One more consecutive period completed.
pub fn advance(current: i32, longest: i32) -> StreakAdvance {
    let current = current + 1;
    StreakAdvance {
        current,
        longest: longest.max(current),
    }
}

/// Undo of the most recent completion. The longest streak is a historical
/// maximum and is not an input here: it never decreases.
pub fn retreat(current: i32, total_completions: i64) -> StreakRetreat {
    StreakRetreat {
        current: (current - 1).max(0),
        total_completions: (total_completions - 1).max(0),
    }
}
