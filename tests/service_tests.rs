mod common;

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use ledger_core::context::LedgerContext;
use ledger_core::domain::{Domain, GoalKind, GoalPriority, NewGoal, NewPartner, Settlement};
use ledger_core::identity::{NoIdentity, StaticIdentity};
use ledger_core::services::{
    AllocationService, EntryService, GoalService, PartnerService, ServiceError,
};
use ledger_core::store::MemoryStore;
use ledger_core::sync::{connectivity_channel, EntityTable, OperationKind};

use common::{harness, sample_entry, StubRemote, ACTOR};

#[test]
fn create_is_visible_immediately_while_offline() {
    let h = harness(false);
    let service = EntryService::new(h.ctx.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.ctx.entries.subscribe(move |items| {
        sink.lock().unwrap().push(items.len());
    });

    let entry = service.create(sample_entry("Groceries", 12_50)).unwrap();

    // subscriber fired synchronously with the optimistic insert
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert_eq!(service.list()[0].id, entry.id);
    assert_eq!(entry.owner, ACTOR);
    // nothing went over the wire
    assert_eq!(h.remote.attempts(), 0);
    assert_eq!(h.ctx.sync_status().pending, 1);
}

#[test]
fn create_requires_identity() {
    let (_connectivity, online_rx) = connectivity_channel(false);
    let ctx = LedgerContext::bootstrap(
        Arc::new(MemoryStore::new()),
        Arc::new(NoIdentity),
        Arc::new(StubRemote::new()),
        online_rx,
    )
    .unwrap();
    let service = EntryService::new(ctx.clone());

    let err = service
        .create(sample_entry("Groceries", 100))
        .expect_err("mutation without identity must fail");
    assert!(matches!(err, ServiceError::Ledger(_)));
    assert!(ctx.sync_status().is_idle());
}

#[test]
fn validation_failures_queue_nothing() {
    let h = harness(false);
    let service = EntryService::new(h.ctx.clone());

    assert!(service.create(sample_entry("  ", 100)).is_err());
    assert!(service.create(sample_entry("Refund", -5)).is_err());

    assert!(h.ctx.entries.is_empty());
    assert!(h.ctx.sync_status().is_idle());
}

#[test]
fn update_and_delete_queue_matching_operations() {
    let h = harness(false);
    let service = EntryService::new(h.ctx.clone());

    let entry = service.create(sample_entry("Dinner", 40_00)).unwrap();
    let updated = service
        .update(entry.id, |e| e.amount_cents = 45_00)
        .unwrap();
    assert_eq!(updated.amount_cents, 45_00);

    let settled = service.settle(entry.id).unwrap();
    assert_eq!(settled.settlement, Settlement::Paid);

    service.delete(entry.id).unwrap();
    assert!(h.ctx.entries.is_empty());

    let kinds: Vec<OperationKind> = h
        .ctx
        .outbox()
        .operations()
        .iter()
        .map(|op| op.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            OperationKind::Insert,
            OperationKind::Update,
            OperationKind::Update,
            OperationKind::Delete
        ]
    );
}

#[test]
fn update_of_unknown_entry_fails() {
    let h = harness(false);
    let service = EntryService::new(h.ctx.clone());
    assert!(service.update(uuid::Uuid::new_v4(), |_| {}).is_err());
}

#[test]
fn goal_contributions_move_the_balance() {
    let h = harness(false);
    let service = GoalService::new(h.ctx.clone());

    let goal = service
        .create(NewGoal {
            title: "Emergency fund".into(),
            target_amount_cents: 500_000,
            deadline: NaiveDate::from_ymd_opt(2025, 12, 31),
            priority: GoalPriority::High,
            kind: GoalKind::Savings,
        })
        .unwrap();
    assert_eq!(goal.current_amount_cents, 0);

    let goal = service.contribute(goal.id, 150_000).unwrap();
    assert_eq!(goal.current_amount_cents, 150_000);
    assert_eq!(goal.progress_percent(), 30);

    let goal = service.contribute(goal.id, -50_000).unwrap();
    assert_eq!(goal.current_amount_cents, 100_000);

    let err = service
        .contribute(goal.id, -200_000)
        .expect_err("balance must not go negative");
    assert!(matches!(err, ServiceError::Invalid(_)));
}

#[test]
fn goal_update_preserves_the_accumulated_amount() {
    let h = harness(false);
    let service = GoalService::new(h.ctx.clone());
    let goal = service
        .create(NewGoal {
            title: "Trip".into(),
            target_amount_cents: 10_000,
            deadline: None,
            priority: GoalPriority::Low,
            kind: GoalKind::Purchase,
        })
        .unwrap();
    service.contribute(goal.id, 4_000).unwrap();

    let updated = service
        .update(goal.id, |g| {
            g.title = "Trip to the coast".into();
            // attempts to overwrite the balance are ignored
            g.current_amount_cents = 0;
        })
        .unwrap();
    assert_eq!(updated.title, "Trip to the coast");
    assert_eq!(updated.current_amount_cents, 4_000);
}

#[test]
fn partner_crud_roundtrip() {
    let h = harness(false);
    let service = PartnerService::new(h.ctx.clone());

    let partner = service
        .create(NewPartner {
            name: "Acme Corp".into(),
            contact: Some("billing@acme.example".into()),
            notes: None,
        })
        .unwrap();

    let renamed = service
        .update(partner.id, |p| p.name = "Acme Corporation".into())
        .unwrap();
    assert_eq!(renamed.name, "Acme Corporation");

    service.delete(partner.id).unwrap();
    assert!(h.ctx.partners.is_empty());
}

#[test]
fn allocations_upsert_by_category_and_domain() {
    let h = harness(false);
    let service = AllocationService::new(h.ctx.clone());

    let first = service.set("Housing", Domain::Personal, 30).unwrap();
    let second = service.set("housing", Domain::Personal, 35).unwrap();
    assert_eq!(first.id, second.id, "same key must upsert, not duplicate");
    assert_eq!(service.list().len(), 1);

    // same category in the other domain is an independent allocation
    let business = service.set("Housing", Domain::Business, 10).unwrap();
    assert_ne!(business.id, first.id);
    assert_eq!(service.list().len(), 2);

    assert!(service.set("Housing", Domain::Personal, 101).is_err());
}

#[test]
fn allocation_report_handles_boundaries() {
    let h = harness(false);
    let allocations = AllocationService::new(h.ctx.clone());
    let entries = EntryService::new(h.ctx.clone());

    allocations.set("Fun", Domain::Personal, 0).unwrap();
    allocations.set("Rent", Domain::Personal, 40).unwrap();
    let mut rent = sample_entry("Rent march", 90_000);
    rent.classification = Some("Rent".into());
    entries.create(rent).unwrap();

    let report = allocations.report(100_000, Domain::Personal);
    let fun = report.iter().find(|s| s.category == "Fun").unwrap();
    assert_eq!(fun.planned_cents, 0);
    assert_eq!(fun.progress, 0);

    let rent = report.iter().find(|s| s.category == "Rent").unwrap();
    assert_eq!(rent.planned_cents, 40_000);
    assert_eq!(rent.spent_cents, 90_000);
    assert_eq!(rent.progress, 100);
}

#[test]
fn collections_and_outbox_survive_restart() {
    let store = Arc::new(MemoryStore::new());
    {
        let (_connectivity, online_rx) = connectivity_channel(false);
        let ctx = LedgerContext::bootstrap(
            store.clone(),
            Arc::new(StaticIdentity::new(ACTOR)),
            Arc::new(StubRemote::new()),
            online_rx,
        )
        .unwrap();
        let service = EntryService::new(ctx.clone());
        service.create(sample_entry("Before restart", 10_00)).unwrap();
        assert_eq!(ctx.sync_status().pending, 1);
    }

    let (_connectivity, online_rx) = connectivity_channel(false);
    let reopened = LedgerContext::bootstrap(
        store,
        Arc::new(StaticIdentity::new(ACTOR)),
        Arc::new(StubRemote::new()),
        online_rx,
    )
    .unwrap();
    assert_eq!(reopened.entries.len(), 1);
    assert_eq!(reopened.entries.snapshot()[0].description, "Before restart");
    assert_eq!(reopened.sync_status().pending, 1);
    assert_eq!(
        reopened.outbox().operations()[0].table,
        EntityTable::Entries
    );
}
