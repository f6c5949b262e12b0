use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Savings,
    Purchase,
    Debt,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

/// A savings target. `current_amount_cents` only moves through explicit
/// contributions, never by wholesale overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub target_amount_cents: i64,
    pub current_amount_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub priority: GoalPriority,
    pub kind: GoalKind,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Completion ratio in whole percent, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.target_amount_cents <= 0 {
            return 0;
        }
        let pct = (self.current_amount_cents.max(0) as i128 * 100
            + self.target_amount_cents as i128 / 2)
            / self.target_amount_cents as i128;
        pct.min(100) as u8
    }
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub target_amount_cents: i64,
    pub deadline: Option<NaiveDate>,
    pub priority: GoalPriority,
    pub kind: GoalKind,
}
