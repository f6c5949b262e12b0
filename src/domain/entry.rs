use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry's cash-flow impact. Amounts are stored
/// unsigned; the sign is always derived from the kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

/// Partition tag separating two independent sets of entries sharing the
/// same engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Personal,
    Business,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Paid,
    Pending,
}

/// Links the entries generated from one split purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallmentTag {
    pub purchase_id: Uuid,
    pub index: u32,
    pub total: u32,
}

/// A single financial transaction in the local ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    /// Non-negative minor units; see [`EntryKind`] for the sign convention.
    pub amount_cents: i64,
    pub description: String,
    pub occurs_at: DateTime<Utc>,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<Uuid>,
    pub settlement: Settlement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_origin: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<InstallmentTag>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signed cash-flow impact in minor units.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            EntryKind::Income => self.amount_cents,
            EntryKind::Expense => -self.amount_cents,
        }
    }
}

/// Caller-supplied fields for creating an entry. Identifier, owner, and
/// timestamps are assigned by the service.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub kind: EntryKind,
    pub amount_cents: i64,
    pub description: String,
    pub occurs_at: DateTime<Utc>,
    pub domain: Domain,
    pub partner_id: Option<Uuid>,
    pub settlement: Settlement,
    pub classification: Option<String>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
}

impl NewEntry {
    pub fn new(
        kind: EntryKind,
        amount_cents: i64,
        description: impl Into<String>,
        occurs_at: DateTime<Utc>,
        domain: Domain,
    ) -> Self {
        Self {
            kind,
            amount_cents,
            description: description.into(),
            occurs_at,
            domain,
            partner_id: None,
            settlement: Settlement::Pending,
            classification: None,
            category_id: None,
            account_id: None,
        }
    }
}
