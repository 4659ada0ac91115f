//! Static catalogs: badge definitions, resolution themes, and the
//! points-to-level table. Built once at process start and passed by reference
//! into the evaluator and app layer; nothing here mutates at runtime.

use serde::Serialize;

use crate::models::{Badge, BadgeCategory, BadgeCriteria, BadgeRarity, CriteriaKind};

/// Streak lengths the UI celebrates; also the thresholds of the streak badges.
pub const STREAK_MILESTONES: [i32; 7] = [7, 14, 30, 60, 90, 180, 365];

/// The next milestone strictly above `streak`, if any remain.
pub fn next_streak_milestone(streak: i32) -> Option<i32> {
    STREAK_MILESTONES.iter().copied().find(|&m| m > streak)
}

const fn criteria(kind: CriteriaKind, threshold: i64) -> BadgeCriteria {
    BadgeCriteria {
        kind,
        threshold,
        theme_id: None,
    }
}

/// The built-in badge set, ordered by `sort_order` within each category block.
const BADGES: &[Badge] = &[
    // Streak badges
    Badge {
        id: "streak_7",
        name: "1 Week Strong",
        description: "Maintain a 7-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 7),
        rarity: BadgeRarity::Common,
        bonus_points: 50,
        sort_order: 1,
    },
    Badge {
        id: "streak_14",
        name: "2 Weeks Solid",
        description: "Maintain a 14-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 14),
        rarity: BadgeRarity::Common,
        bonus_points: 100,
        sort_order: 2,
    },
    Badge {
        id: "streak_30",
        name: "1 Month Champion",
        description: "Maintain a 30-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 30),
        rarity: BadgeRarity::Rare,
        bonus_points: 200,
        sort_order: 3,
    },
    Badge {
        id: "streak_60",
        name: "2 Months Strong",
        description: "Maintain a 60-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 60),
        rarity: BadgeRarity::Rare,
        bonus_points: 400,
        sort_order: 4,
    },
    Badge {
        id: "streak_90",
        name: "3 Months Legend",
        description: "Maintain a 90-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 90),
        rarity: BadgeRarity::Epic,
        bonus_points: 600,
        sort_order: 5,
    },
    Badge {
        id: "streak_180",
        name: "6 Months Elite",
        description: "Maintain a 180-day streak",
        icon: "flame",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 180),
        rarity: BadgeRarity::Epic,
        bonus_points: 1000,
        sort_order: 6,
    },
    Badge {
        id: "streak_365",
        name: "Year of Dedication",
        description: "Maintain a 365-day streak",
        icon: "trophy",
        category: BadgeCategory::Streak,
        criteria: criteria(CriteriaKind::Streak, 365),
        rarity: BadgeRarity::Legendary,
        bonus_points: 2000,
        sort_order: 7,
    },
    // Completion milestones
    Badge {
        id: "complete_10",
        name: "Getting Started",
        description: "Complete 10 goals",
        icon: "checkmark-circle",
        category: BadgeCategory::Completion,
        criteria: criteria(CriteriaKind::TotalCompletions, 10),
        rarity: BadgeRarity::Common,
        bonus_points: 25,
        sort_order: 10,
    },
    Badge {
        id: "complete_50",
        name: "Consistent",
        description: "Complete 50 goals",
        icon: "checkmark-circle",
        category: BadgeCategory::Completion,
        criteria: criteria(CriteriaKind::TotalCompletions, 50),
        rarity: BadgeRarity::Common,
        bonus_points: 75,
        sort_order: 11,
    },
    Badge {
        id: "complete_100",
        name: "Century Club",
        description: "Complete 100 goals",
        icon: "ribbon",
        category: BadgeCategory::Completion,
        criteria: criteria(CriteriaKind::TotalCompletions, 100),
        rarity: BadgeRarity::Rare,
        bonus_points: 150,
        sort_order: 12,
    },
    Badge {
        id: "complete_500",
        name: "High Achiever",
        description: "Complete 500 goals",
        icon: "star",
        category: BadgeCategory::Completion,
        criteria: criteria(CriteriaKind::TotalCompletions, 500),
        rarity: BadgeRarity::Epic,
        bonus_points: 400,
        sort_order: 13,
    },
    Badge {
        id: "complete_1000",
        name: "Goal Master",
        description: "Complete 1000 goals",
        icon: "trophy",
        category: BadgeCategory::Completion,
        criteria: criteria(CriteriaKind::TotalCompletions, 1000),
        rarity: BadgeRarity::Legendary,
        bonus_points: 1000,
        sort_order: 14,
    },
    // Partner badges (criteria need challenge tracking the core does not model;
    // they never qualify here but stay listed for the app layer)
    Badge {
        id: "partner_link",
        name: "Accountability Buddy",
        description: "Link with a partner",
        icon: "people",
        category: BadgeCategory::Partner,
        criteria: criteria(CriteriaKind::PartnerChallenge, 1),
        rarity: BadgeRarity::Common,
        bonus_points: 50,
        sort_order: 20,
    },
    Badge {
        id: "partner_win_1",
        name: "First Victory",
        description: "Win your first partner challenge",
        icon: "medal",
        category: BadgeCategory::Partner,
        criteria: criteria(CriteriaKind::PartnerChallenge, 1),
        rarity: BadgeRarity::Common,
        bonus_points: 75,
        sort_order: 21,
    },
    Badge {
        id: "partner_win_5",
        name: "Competitive Spirit",
        description: "Win 5 partner challenges",
        icon: "medal",
        category: BadgeCategory::Partner,
        criteria: criteria(CriteriaKind::PartnerChallenge, 5),
        rarity: BadgeRarity::Rare,
        bonus_points: 150,
        sort_order: 22,
    },
    // Special badges
    Badge {
        id: "streak_protected",
        name: "Streak Saver",
        description: "Use points to protect your streak",
        icon: "shield",
        category: BadgeCategory::Special,
        criteria: criteria(CriteriaKind::Special, 1),
        rarity: BadgeRarity::Common,
        bonus_points: 25,
        sort_order: 30,
    },
];

/// The immutable badge catalog.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    badges: Vec<Badge>,
}

/// A catalog entry paired with its earned status, for display.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeWithStatus {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned: bool,
}

impl BadgeCatalog {
    /// A catalog over the given badges; callers own the ordering.
    pub fn new(badges: Vec<Badge>) -> Self {
        Self { badges }
    }

    /// The built-in badge set.
    pub fn builtin() -> Self {
        Self::new(BADGES.to_vec())
    }

    pub fn get(&self, badge_id: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.id == badge_id)
    }

    /// All badges in catalog (sort) order.
    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter()
    }

    pub fn by_category(&self, category: BadgeCategory) -> Vec<&Badge> {
        self.badges
            .iter()
            .filter(|b| b.category == category)
            .collect()
    }

    /// Full catalog with earned flags, earned badges first, then sort order.
    pub fn with_status<'a, I>(&self, earned_ids: I) -> Vec<BadgeWithStatus>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let earned: std::collections::HashSet<&str> = earned_ids.into_iter().collect();
        let mut listed: Vec<BadgeWithStatus> = self
            .badges
            .iter()
            .map(|b| BadgeWithStatus {
                earned: earned.contains(b.id),
                badge: b.clone(),
            })
            .collect();
        listed.sort_by_key(|b| (!b.earned, b.badge.sort_order));
        listed
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}

/// A resolution theme grouping goals by life area.
#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub sort_order: i32,
}

/// Theme table, already in display order.
pub const THEMES: &[Theme] = &[
    Theme {
        id: "health",
        name: "Health & Fitness",
        icon: "heart",
        description: "Exercise, nutrition, sleep, and wellness goals",
        sort_order: 1,
    },
    Theme {
        id: "finance",
        name: "Finance",
        icon: "dollar-sign",
        description: "Saving, investing, budgeting, and financial goals",
        sort_order: 2,
    },
    Theme {
        id: "career",
        name: "Career",
        icon: "briefcase",
        description: "Professional development and work goals",
        sort_order: 3,
    },
    Theme {
        id: "personal",
        name: "Personal Growth",
        icon: "user",
        description: "Self-improvement and personal development",
        sort_order: 4,
    },
    Theme {
        id: "relationships",
        name: "Relationships",
        icon: "users",
        description: "Family, friends, and social connections",
        sort_order: 5,
    },
    Theme {
        id: "education",
        name: "Education",
        icon: "book-open",
        description: "Learning, courses, and skill development",
        sort_order: 6,
    },
    Theme {
        id: "creativity",
        name: "Creativity",
        icon: "palette",
        description: "Art, music, writing, and creative pursuits",
        sort_order: 7,
    },
    Theme {
        id: "mindfulness",
        name: "Mindfulness",
        icon: "sun",
        description: "Meditation, journaling, and mental wellness",
        sort_order: 8,
    },
];

pub fn theme(theme_id: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.id == theme_id)
}

/// Points required to reach each level; index 0 is level 1. Level is always
/// derived from points on demand, never persisted.
const LEVEL_THRESHOLDS: [i64; 10] = [0, 100, 250, 500, 1000, 2000, 3500, 5500, 8000, 11000];

/// Display level for a points total, from 1 to `LEVEL_THRESHOLDS.len()`.
pub fn level_for_points(points: i64) -> i32 {
    LEVEL_THRESHOLDS
        .iter()
        .rposition(|&min| points >= min)
        .map(|i| i as i32 + 1)
        .unwrap_or(1)
}

/// Fraction of the way from the current level to the next, in `0.0..=1.0`.
/// Max level reports 1.0.
pub fn progress_to_next_level(points: i64) -> f64 {
    let level = level_for_points(points) as usize;
    if level >= LEVEL_THRESHOLDS.len() {
        return 1.0;
    }
    let floor = LEVEL_THRESHOLDS[level - 1];
    let ceil = LEVEL_THRESHOLDS[level];
    (points - floor) as f64 / (ceil - floor) as f64
}
