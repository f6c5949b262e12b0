mod common;

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use ledger_core::domain::{Domain, EntryKind, NewRecurringRule, Settlement};
use ledger_core::services::{EntryService, RecurringService};
use ledger_core::sync::{EntityTable, OperationKind};

use common::{harness, sample_entry};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rent_rule() -> NewRecurringRule {
    NewRecurringRule {
        description: "Rent".into(),
        amount_cents: 120_000,
        day_of_month: 10,
        kind: EntryKind::Expense,
        domain: Domain::Personal,
    }
}

#[test]
fn generator_materializes_once_per_month() {
    let h = harness(false);
    let rules = RecurringService::new(h.ctx.clone());
    let rule = rules.create(rent_rule()).unwrap();

    let today = date(2024, 3, 15);
    let generated = rules.generate_due(today).unwrap();
    assert_eq!(generated.len(), 1);
    let entry = &generated[0];
    assert_eq!(entry.occurs_at.date_naive(), date(2024, 3, 10));
    assert_eq!(entry.settlement, Settlement::Pending);
    assert_eq!(entry.recurring_origin, Some(rule.id));

    // a second run in the same month observes the claim and does nothing
    let again = rules.generate_due(today).unwrap();
    assert!(again.is_empty());
    let later_in_month = rules.generate_due(date(2024, 3, 28)).unwrap();
    assert!(later_in_month.is_empty());
    assert_eq!(h.ctx.entries.len(), 1);
}

#[test]
fn generator_waits_for_the_rule_day() {
    let h = harness(false);
    let rules = RecurringService::new(h.ctx.clone());
    rules.create(rent_rule()).unwrap();

    assert!(rules.generate_due(date(2024, 3, 9)).unwrap().is_empty());
    assert_eq!(rules.generate_due(date(2024, 3, 10)).unwrap().len(), 1);
}

#[test]
fn generator_resumes_next_month() {
    let h = harness(false);
    let rules = RecurringService::new(h.ctx.clone());
    rules.create(rent_rule()).unwrap();

    assert_eq!(rules.generate_due(date(2024, 3, 15)).unwrap().len(), 1);
    assert_eq!(rules.generate_due(date(2024, 4, 12)).unwrap().len(), 1);
    assert_eq!(h.ctx.entries.len(), 2);

    let months: Vec<u32> = h
        .ctx
        .entries
        .snapshot()
        .iter()
        .map(|entry| entry.occurs_at.date_naive().month())
        .collect();
    assert!(months.contains(&3) && months.contains(&4));
}

#[test]
fn inactive_rules_are_skipped() {
    let h = harness(false);
    let rules = RecurringService::new(h.ctx.clone());
    let rule = rules.create(rent_rule()).unwrap();
    rules.update(rule.id, |r| r.active = false).unwrap();

    assert!(rules.generate_due(date(2024, 3, 15)).unwrap().is_empty());
}

#[test]
fn generation_queues_entry_insert_and_rule_update() {
    let h = harness(false);
    let rules = RecurringService::new(h.ctx.clone());
    rules.create(rent_rule()).unwrap();
    let before = h.ctx.outbox().operations().len();

    rules.generate_due(date(2024, 3, 15)).unwrap();

    let ops = h.ctx.outbox().operations();
    let new_ops = &ops[before..];
    assert!(new_ops
        .iter()
        .any(|op| op.table == EntityTable::RecurringRules && op.kind == OperationKind::Update));
    assert!(new_ops
        .iter()
        .any(|op| op.table == EntityTable::Entries && op.kind == OperationKind::Insert));
}

#[test]
fn installment_purchase_splits_exactly() {
    let h = harness(false);
    let entries = EntryService::new(h.ctx.clone());

    let plan = entries
        .create_installments(sample_entry("Laptop", 100), 3, None)
        .unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.iter().map(|e| e.amount_cents).sum::<i64>(), 100);
    assert_eq!(plan[0].amount_cents, 34);
    assert_eq!(plan[0].settlement, Settlement::Paid);
    assert!(plan[1..]
        .iter()
        .all(|e| e.settlement == Settlement::Pending));

    let tag = plan[0].installment.as_ref().unwrap();
    assert_eq!(tag.index, 1);
    assert_eq!(tag.total, 3);
    assert!(plan
        .iter()
        .all(|e| e.installment.as_ref().unwrap().purchase_id == tag.purchase_id));

    // one insert per generated entry, in plan order
    let ops = h.ctx.outbox().operations();
    assert_eq!(ops.len(), 3);
    assert!(ops
        .iter()
        .zip(&plan)
        .all(|(op, entry)| op.payload["id"] == entry.id.to_string().as_str()));
}

#[test]
fn installment_dates_clamp_at_month_end() {
    let h = harness(false);
    let entries = EntryService::new(h.ctx.clone());

    let mut input = sample_entry("Sofa", 90_000);
    input.occurs_at = Utc.with_ymd_and_hms(2023, 1, 31, 10, 0, 0).unwrap();
    let plan = entries.create_installments(input, 3, None).unwrap();

    assert_eq!(plan[0].occurs_at.date_naive(), date(2023, 1, 31));
    assert_eq!(plan[1].occurs_at.date_naive(), date(2023, 2, 28));
    assert_eq!(plan[2].occurs_at.date_naive(), date(2023, 3, 31));
}
