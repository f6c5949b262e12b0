//! Pure mapping of income and categorized spend onto percentage-based
//! allocation status. Safe to call repeatedly from any read path.

use crate::domain::{BudgetAllocation, Domain, EntryKind, LedgerEntry};

/// Planned and actual position of one allocation category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationStatus {
    pub category: String,
    pub domain: Domain,
    pub percentage: u8,
    pub planned_cents: i64,
    pub spent_cents: i64,
    /// Spend as whole percent of plan, capped at 100; 0 when nothing is
    /// planned.
    pub progress: u8,
}

/// `round_half_up(income * percentage / 100)` in integer math.
pub fn planned_amount(income_cents: i64, percentage: u8) -> i64 {
    if income_cents <= 0 || percentage == 0 {
        return 0;
    }
    let product = income_cents as i128 * percentage as i128;
    ((product + 50) / 100) as i64
}

/// Sums expense entries whose classification matches `category` within
/// `domain`, case-insensitively.
pub fn spent_for_category(entries: &[LedgerEntry], category: &str, domain: Domain) -> i64 {
    entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Expense && entry.domain == domain)
        .filter(|entry| {
            entry
                .classification
                .as_deref()
                .map(|c| c.eq_ignore_ascii_case(category))
                .unwrap_or(false)
        })
        .map(|entry| entry.amount_cents)
        .sum()
}

/// Computes the allocation status for every allocation of `domain`.
pub fn allocation_report(
    allocations: &[BudgetAllocation],
    entries: &[LedgerEntry],
    income_cents: i64,
    domain: Domain,
) -> Vec<AllocationStatus> {
    allocations
        .iter()
        .filter(|allocation| allocation.domain == domain)
        .map(|allocation| {
            let planned = planned_amount(income_cents, allocation.percentage);
            let spent = spent_for_category(entries, &allocation.category, domain);
            AllocationStatus {
                category: allocation.category.clone(),
                domain,
                percentage: allocation.percentage,
                planned_cents: planned,
                spent_cents: spent,
                progress: progress_percent(spent, planned),
            }
        })
        .collect()
}

fn progress_percent(spent_cents: i64, planned_cents: i64) -> u8 {
    if planned_cents <= 0 {
        return 0;
    }
    let pct = (spent_cents.max(0) as i128 * 100 + planned_cents as i128 / 2)
        / planned_cents as i128;
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewEntry, Settlement};
    use chrono::Utc;
    use uuid::Uuid;

    fn expense(category: &str, amount_cents: i64, domain: Domain) -> LedgerEntry {
        let input = NewEntry::new(
            EntryKind::Expense,
            amount_cents,
            "test",
            Utc::now(),
            domain,
        );
        LedgerEntry {
            id: Uuid::new_v4(),
            kind: input.kind,
            amount_cents: input.amount_cents,
            description: input.description,
            occurs_at: input.occurs_at,
            domain: input.domain,
            partner_id: None,
            settlement: Settlement::Paid,
            classification: Some(category.to_string()),
            category_id: None,
            account_id: None,
            recurring_origin: None,
            installment: None,
            owner: "tester".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn allocation(category: &str, percentage: u8, domain: Domain) -> BudgetAllocation {
        BudgetAllocation {
            id: Uuid::new_v4(),
            category: category.to_string(),
            percentage,
            domain,
            owner: "tester".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn planned_amount_rounds_half_up() {
        assert_eq!(planned_amount(100_00, 33), 33_00);
        assert_eq!(planned_amount(101, 50), 51); // 50.5 rounds up
        assert_eq!(planned_amount(0, 50), 0);
    }

    #[test]
    fn zero_percentage_yields_zero_plan_and_progress() {
        let allocations = vec![allocation("fun", 0, Domain::Personal)];
        let entries = vec![expense("fun", 5_000, Domain::Personal)];
        let report = allocation_report(&allocations, &entries, 100_000, Domain::Personal);
        assert_eq!(report[0].planned_cents, 0);
        assert_eq!(report[0].progress, 0);
    }

    #[test]
    fn spend_with_zero_plan_does_not_divide_by_zero() {
        assert_eq!(progress_percent(10_000, 0), 0);
    }

    #[test]
    fn progress_caps_at_one_hundred() {
        let allocations = vec![allocation("rent", 30, Domain::Personal)];
        let entries = vec![expense("rent", 90_000, Domain::Personal)];
        let report = allocation_report(&allocations, &entries, 100_000, Domain::Personal);
        assert_eq!(report[0].planned_cents, 30_000);
        assert_eq!(report[0].progress, 100);
    }

    #[test]
    fn spend_ignores_other_domains_and_income() {
        let entries = vec![
            expense("food", 2_000, Domain::Personal),
            expense("food", 9_000, Domain::Business),
        ];
        assert_eq!(spent_for_category(&entries, "Food", Domain::Personal), 2_000);
    }
}
