use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{Domain, EntryKind};

/// Template that materializes one concrete ledger entry per calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    /// 1..=31; clamped to the month's last day at generation time.
    pub day_of_month: u32,
    pub kind: EntryKind,
    pub domain: Domain,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated_at: Option<NaiveDate>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringRule {
    /// Whether the rule is due on `today`: its day has arrived and no entry
    /// has been generated for the current month yet.
    pub fn due_on(&self, today: NaiveDate) -> bool {
        use chrono::Datelike;
        if !self.active || today.day() < self.day_of_month {
            return false;
        }
        match self.last_generated_at {
            None => true,
            Some(last) => last.month() != today.month() || last.year() != today.year(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRecurringRule {
    pub description: String,
    pub amount_cents: i64,
    pub day_of_month: u32,
    pub kind: EntryKind,
    pub domain: Domain,
}
