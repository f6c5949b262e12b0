//! CRUD and installment splitting for ledger entries.

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::context::LedgerContext;
use crate::domain::{InstallmentTag, LedgerEntry, NewEntry, Settlement};
use crate::errors::LedgerError;
use crate::split::split_installments;
use crate::store::keys;
use crate::sync::{EntityTable, OperationKind};

use super::{ServiceError, ServiceResult};

pub struct EntryService {
    ctx: Arc<LedgerContext>,
}

impl EntryService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    /// Creates an entry: optimistic local apply, cache persist, then an
    /// insert queued for the remote. Returns the fully-formed entity without
    /// waiting on any network round-trip.
    pub fn create(&self, input: NewEntry) -> ServiceResult<LedgerEntry> {
        let actor = self.ctx.current_actor()?;
        validate_input(&input)?;

        let now = Utc::now();
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            kind: input.kind,
            amount_cents: input.amount_cents,
            description: input.description.trim().to_string(),
            occurs_at: input.occurs_at,
            domain: input.domain,
            partner_id: input.partner_id,
            settlement: input.settlement,
            classification: input.classification,
            category_id: input.category_id,
            account_id: input.account_id,
            recurring_origin: None,
            installment: None,
            owner: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.ctx.entries.mutate(|items| items.insert(0, entry.clone()));
        self.ctx.persist_collection(keys::ENTRIES, &self.ctx.entries);
        self.ctx.outbox().enqueue(
            EntityTable::Entries,
            OperationKind::Insert,
            serde_json::to_value(&entry).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(entry)
    }

    /// Splits a purchase into `count` installment entries sharing one
    /// purchase id. The first keeps the caller's date and settlement; the
    /// rest land on following months, always pending.
    pub fn create_installments(
        &self,
        input: NewEntry,
        count: u32,
        target_day: Option<u32>,
    ) -> ServiceResult<Vec<LedgerEntry>> {
        let actor = self.ctx.current_actor()?;
        validate_input(&input)?;

        let slices = split_installments(
            input.amount_cents,
            count,
            input.occurs_at.date_naive(),
            target_day,
            input.settlement,
        )?;
        let purchase_id = Uuid::new_v4();
        let now = Utc::now();

        let entries: Vec<LedgerEntry> = slices
            .into_iter()
            .map(|slice| {
                let occurs_at = if slice.index == 1 {
                    input.occurs_at
                } else {
                    slice.due_date.and_time(NaiveTime::MIN).and_utc()
                };
                LedgerEntry {
                    id: Uuid::new_v4(),
                    kind: input.kind,
                    amount_cents: slice.amount_cents,
                    description: format!(
                        "{} ({}/{})",
                        input.description.trim(),
                        slice.index,
                        count
                    ),
                    occurs_at,
                    domain: input.domain,
                    partner_id: input.partner_id,
                    settlement: slice.settlement,
                    classification: input.classification.clone(),
                    category_id: input.category_id,
                    account_id: input.account_id,
                    recurring_origin: None,
                    installment: Some(InstallmentTag {
                        purchase_id,
                        index: slice.index,
                        total: count,
                    }),
                    owner: actor.as_str().to_string(),
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        self.ctx.entries.mutate(|items| {
            for entry in entries.iter().rev() {
                items.insert(0, entry.clone());
            }
        });
        self.ctx.persist_collection(keys::ENTRIES, &self.ctx.entries);
        for entry in &entries {
            self.ctx.outbox().enqueue(
                EntityTable::Entries,
                OperationKind::Insert,
                serde_json::to_value(entry).map_err(LedgerError::from)?,
                actor.as_str(),
            );
        }
        tracing::info!(
            purchase = %purchase_id,
            count,
            total_cents = input.amount_cents,
            "created installment plan"
        );
        Ok(entries)
    }

    /// Applies `mutate` to the entry identified by `id`, re-validates, and
    /// queues the update.
    pub fn update(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut LedgerEntry),
    ) -> ServiceResult<LedgerEntry> {
        let actor = self.ctx.current_actor()?;
        let mut updated = self
            .ctx
            .entries
            .snapshot()
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| LedgerError::UnknownEntity(format!("entry {id}")))?;
        mutate(&mut updated);
        updated.id = id;
        if updated.amount_cents < 0 {
            return Err(ServiceError::invalid("amount must not be negative"));
        }
        if updated.description.trim().is_empty() {
            return Err(ServiceError::invalid("description is required"));
        }
        updated.updated_at = Utc::now();

        self.ctx.entries.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|entry| entry.id == id) {
                *slot = updated.clone();
            }
        });
        self.ctx.persist_collection(keys::ENTRIES, &self.ctx.entries);
        self.ctx.outbox().enqueue(
            EntityTable::Entries,
            OperationKind::Update,
            serde_json::to_value(&updated).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(updated)
    }

    /// Marks a pending entry as paid.
    pub fn settle(&self, id: Uuid) -> ServiceResult<LedgerEntry> {
        self.update(id, |entry| entry.settlement = Settlement::Paid)
    }

    /// Removes the entry locally and queues the remote delete. A delete for
    /// an entity whose insert has not been delivered yet is still queued;
    /// the remote treats delete-of-nonexistent as success.
    pub fn delete(&self, id: Uuid) -> ServiceResult<LedgerEntry> {
        let actor = self.ctx.current_actor()?;
        let removed = self.ctx.entries.mutate(|items| {
            items
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| items.remove(index))
        });
        let removed = removed.ok_or_else(|| LedgerError::UnknownEntity(format!("entry {id}")))?;
        self.ctx.persist_collection(keys::ENTRIES, &self.ctx.entries);
        self.ctx.outbox().enqueue(
            EntityTable::Entries,
            OperationKind::Delete,
            json!({ "id": id }),
            actor.as_str(),
        );
        Ok(removed)
    }

    pub fn list(&self) -> Vec<LedgerEntry> {
        self.ctx.entries.snapshot()
    }
}

fn validate_input(input: &NewEntry) -> ServiceResult<()> {
    if input.description.trim().is_empty() {
        return Err(ServiceError::invalid("description is required"));
    }
    if input.amount_cents < 0 {
        return Err(ServiceError::invalid("amount must not be negative"));
    }
    Ok(())
}
