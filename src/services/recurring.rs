//! Recurring-rule CRUD and the idempotent monthly generator.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::context::LedgerContext;
use crate::domain::{LedgerEntry, NewRecurringRule, RecurringRule, Settlement};
use crate::errors::LedgerError;
use crate::split::clamped_date;
use crate::store::keys;
use crate::sync::{EntityTable, OperationKind};

use super::{ServiceError, ServiceResult};

pub struct RecurringService {
    ctx: Arc<LedgerContext>,
}

impl RecurringService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, input: NewRecurringRule) -> ServiceResult<RecurringRule> {
        let actor = self.ctx.current_actor()?;
        validate_rule(&input.description, input.amount_cents, input.day_of_month)?;

        let now = Utc::now();
        let rule = RecurringRule {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            amount_cents: input.amount_cents,
            day_of_month: input.day_of_month,
            kind: input.kind,
            domain: input.domain,
            active: true,
            last_generated_at: None,
            owner: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.ctx
            .recurring_rules
            .mutate(|items| items.insert(0, rule.clone()));
        self.ctx
            .persist_collection(keys::RECURRING_RULES, &self.ctx.recurring_rules);
        self.ctx.outbox().enqueue(
            EntityTable::RecurringRules,
            OperationKind::Insert,
            serde_json::to_value(&rule).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(rule)
    }

    pub fn update(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut RecurringRule),
    ) -> ServiceResult<RecurringRule> {
        let actor = self.ctx.current_actor()?;
        let mut updated = self
            .ctx
            .recurring_rules
            .snapshot()
            .into_iter()
            .find(|rule| rule.id == id)
            .ok_or_else(|| LedgerError::UnknownEntity(format!("recurring rule {id}")))?;
        mutate(&mut updated);
        updated.id = id;
        validate_rule(&updated.description, updated.amount_cents, updated.day_of_month)?;
        updated.updated_at = Utc::now();

        self.ctx.recurring_rules.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|rule| rule.id == id) {
                *slot = updated.clone();
            }
        });
        self.ctx
            .persist_collection(keys::RECURRING_RULES, &self.ctx.recurring_rules);
        self.ctx.outbox().enqueue(
            EntityTable::RecurringRules,
            OperationKind::Update,
            serde_json::to_value(&updated).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(updated)
    }

    pub fn delete(&self, id: Uuid) -> ServiceResult<RecurringRule> {
        let actor = self.ctx.current_actor()?;
        let removed = self.ctx.recurring_rules.mutate(|items| {
            items
                .iter()
                .position(|rule| rule.id == id)
                .map(|index| items.remove(index))
        });
        let removed =
            removed.ok_or_else(|| LedgerError::UnknownEntity(format!("recurring rule {id}")))?;
        self.ctx
            .persist_collection(keys::RECURRING_RULES, &self.ctx.recurring_rules);
        self.ctx.outbox().enqueue(
            EntityTable::RecurringRules,
            OperationKind::Delete,
            json!({ "id": id }),
            actor.as_str(),
        );
        Ok(removed)
    }

    pub fn list(&self) -> Vec<RecurringRule> {
        self.ctx.recurring_rules.snapshot()
    }

    /// Materializes one entry for every active rule that is due on `today`.
    ///
    /// The due check and the `last_generated_at` claim happen inside a single
    /// collection mutation, so a repeated run in the same calendar month
    /// observes the claim and generates nothing (idempotent per rule per
    /// month).
    pub fn generate_due(&self, today: NaiveDate) -> ServiceResult<Vec<LedgerEntry>> {
        let actor = self.ctx.current_actor()?;

        let claimed: Vec<RecurringRule> = self.ctx.recurring_rules.mutate(|rules| {
            let mut due = Vec::new();
            for rule in rules.iter_mut() {
                if rule.due_on(today) {
                    rule.last_generated_at = Some(today);
                    rule.updated_at = Utc::now();
                    due.push(rule.clone());
                }
            }
            due
        });
        if claimed.is_empty() {
            return Ok(Vec::new());
        }

        self.ctx
            .persist_collection(keys::RECURRING_RULES, &self.ctx.recurring_rules);
        for rule in &claimed {
            self.ctx.outbox().enqueue(
                EntityTable::RecurringRules,
                OperationKind::Update,
                serde_json::to_value(rule).map_err(LedgerError::from)?,
                actor.as_str(),
            );
        }

        let now = Utc::now();
        let generated: Vec<LedgerEntry> = claimed
            .iter()
            .map(|rule| {
                let occurs_on = clamped_date(today.year(), today.month(), rule.day_of_month);
                LedgerEntry {
                    id: Uuid::new_v4(),
                    kind: rule.kind,
                    amount_cents: rule.amount_cents,
                    description: rule.description.clone(),
                    occurs_at: occurs_on.and_time(NaiveTime::MIN).and_utc(),
                    domain: rule.domain,
                    partner_id: None,
                    settlement: Settlement::Pending,
                    classification: None,
                    category_id: None,
                    account_id: None,
                    recurring_origin: Some(rule.id),
                    installment: None,
                    owner: actor.as_str().to_string(),
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        self.ctx.entries.mutate(|items| {
            for entry in generated.iter().rev() {
                items.insert(0, entry.clone());
            }
        });
        self.ctx.persist_collection(keys::ENTRIES, &self.ctx.entries);
        for entry in &generated {
            self.ctx.outbox().enqueue(
                EntityTable::Entries,
                OperationKind::Insert,
                serde_json::to_value(entry).map_err(LedgerError::from)?,
                actor.as_str(),
            );
        }
        tracing::info!(generated = generated.len(), %today, "materialized recurring entries");
        Ok(generated)
    }
}

fn validate_rule(description: &str, amount_cents: i64, day_of_month: u32) -> ServiceResult<()> {
    if description.trim().is_empty() {
        return Err(ServiceError::invalid("description is required"));
    }
    if amount_cents < 0 {
        return Err(ServiceError::invalid("amount must not be negative"));
    }
    if !(1..=31).contains(&day_of_month) {
        return Err(ServiceError::invalid("day of month must be within 1..=31"));
    }
    Ok(())
}
