use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::Domain;

/// Percentage-based budget slice, keyed uniquely by `(category, domain)`.
///
/// The engine stores whatever percentage it is given; keeping the per-domain
/// sum at 100 is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: Uuid,
    pub category: String,
    /// 0..=100.
    pub percentage: u8,
    pub domain: Domain,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetAllocation {
    pub fn matches(&self, category: &str, domain: Domain) -> bool {
        self.domain == domain && self.category.eq_ignore_ascii_case(category)
    }
}
