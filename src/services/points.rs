//! Points awarded per completion: base value for the recurrence type times a
//! streak multiplier, floored.

use crate::models::Recurrence;

/// Streak-length thresholds mapped to multipliers in hundredths. Lookup takes
/// the largest threshold at or below the streak. Must stay sorted ascending
/// and monotone in both columns.
const STREAK_MULTIPLIERS: [(i32, i64); 7] = [
    (0, 100),
    (3, 125),
    (7, 150),
    (14, 175),
    (30, 200),
    (60, 250),
    (90, 300),
];

/// Multiplier in hundredths for a streak length (e.g. 150 = 1.5x).
fn multiplier_hundredths(streak: i32) -> i64 {
    STREAK_MULTIPLIERS
        .iter()
        .rev()
        .find(|&&(threshold, _)| streak >= threshold)
        .map(|&(_, mult)| mult)
        .unwrap_or(100)
}

/// Points for one completion at the given streak length.
///
/// Integer arithmetic in hundredths gives the same results as
/// multiply-then-floor on every table entry, with no float rounding.
pub fn points_for(recurrence: Recurrence, streak: i32) -> i64 {
    recurrence.base_points() * multiplier_hundredths(streak) / 100
}

/// The streak multiplier as a display value (1.0, 1.25, ... 3.0).
pub fn multiplier_for(streak: i32) -> f64 {
    multiplier_hundredths(streak) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_points_vectors() {
        assert_eq!(points_for(Recurrence::Daily, 0), 10);
        assert_eq!(points_for(Recurrence::Daily, 7), 15);
        assert_eq!(points_for(Recurrence::Weekly, 30), 100);
        assert_eq!(points_for(Recurrence::Quarterly, 90), 1500);
    }

    #[test]
    fn lookup_takes_largest_threshold_at_or_below() {
        assert_eq!(multiplier_for(0), 1.0);
        assert_eq!(multiplier_for(2), 1.0);
        assert_eq!(multiplier_for(3), 1.25);
        assert_eq!(multiplier_for(6), 1.25);
        assert_eq!(multiplier_for(13), 1.5);
        assert_eq!(multiplier_for(89), 2.5);
        assert_eq!(multiplier_for(10_000), 3.0);
    }

    #[test]
    fn fractional_products_floor() {
        // 10 * 1.25 = 12.5 -> 12
        assert_eq!(points_for(Recurrence::Daily, 3), 12);
        // 100 * 1.75 = 175, custom base
        assert_eq!(points_for(Recurrence::Custom, 14), 175);
    }

    #[test]
    fn multiplier_table_is_monotone() {
        for pair in STREAK_MULTIPLIERS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "thresholds must ascend");
            assert!(pair[0].1 <= pair[1].1, "multipliers must not decrease");
        }
    }
}
