use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Static catalog entry. Badges are defined once at process start and never
/// mutated at runtime; see `catalog::BadgeCatalog`.
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
    pub criteria: BadgeCriteria,
    pub rarity: BadgeRarity,
    /// Bonus points granted by the app layer when the badge unlocks.
    pub bonus_points: i64,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Streak,
    Completion,
    Points,
    Partner,
    Special,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeCriteria {
    #[serde(rename = "type")]
    pub kind: CriteriaKind,
    pub threshold: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaKind {
    Streak,
    TotalCompletions,
    Points,
    Level,
    PartnerChallenge,
    ThemeMastery,
    Special,
}

/// An earned badge. One per (user, badge), never revoked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBadge {
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
    /// Whether the UI has shown the unlock to the user.
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CriteriaKind::TotalCompletions).unwrap(),
            "\"total_completions\""
        );
        assert_eq!(
            serde_json::to_string(&CriteriaKind::PartnerChallenge).unwrap(),
            "\"partner_challenge\""
        );
    }

    #[test]
    fn criteria_uses_type_key() {
        let criteria = BadgeCriteria {
            kind: CriteriaKind::Streak,
            threshold: 7,
            theme_id: None,
        };
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json["type"], "streak");
        assert_eq!(json["threshold"], 7);
    }
}
