//! Budget allocation upserts and reporting.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::budget::{allocation_report, AllocationStatus};
use crate::context::LedgerContext;
use crate::domain::{BudgetAllocation, Domain};
use crate::errors::LedgerError;
use crate::store::keys;
use crate::sync::{EntityTable, OperationKind};

use super::{ServiceError, ServiceResult};

pub struct AllocationService {
    ctx: Arc<LedgerContext>,
}

impl AllocationService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    /// Creates or updates the allocation keyed by `(category, domain)`.
    /// Whether the per-domain percentages sum to 100 is left to the caller.
    pub fn set(
        &self,
        category: &str,
        domain: Domain,
        percentage: u8,
    ) -> ServiceResult<BudgetAllocation> {
        let actor = self.ctx.current_actor()?;
        if category.trim().is_empty() {
            return Err(ServiceError::invalid("category is required"));
        }
        if percentage > 100 {
            return Err(ServiceError::invalid("percentage must be within 0..=100"));
        }

        let now = Utc::now();
        let existing = self
            .ctx
            .allocations
            .snapshot()
            .into_iter()
            .find(|allocation| allocation.matches(category, domain));

        let (allocation, kind) = match existing {
            Some(mut allocation) => {
                allocation.percentage = percentage;
                allocation.updated_at = now;
                (allocation, OperationKind::Update)
            }
            None => (
                BudgetAllocation {
                    id: Uuid::new_v4(),
                    category: category.trim().to_string(),
                    percentage,
                    domain,
                    owner: actor.as_str().to_string(),
                    created_at: now,
                    updated_at: now,
                },
                OperationKind::Insert,
            ),
        };

        self.ctx.allocations.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|a| a.id == allocation.id) {
                *slot = allocation.clone();
            } else {
                items.insert(0, allocation.clone());
            }
        });
        self.ctx
            .persist_collection(keys::ALLOCATIONS, &self.ctx.allocations);
        self.ctx.outbox().enqueue(
            EntityTable::Allocations,
            kind,
            serde_json::to_value(&allocation).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(allocation)
    }

    pub fn remove(&self, category: &str, domain: Domain) -> ServiceResult<BudgetAllocation> {
        let actor = self.ctx.current_actor()?;
        let removed = self.ctx.allocations.mutate(|items| {
            items
                .iter()
                .position(|allocation| allocation.matches(category, domain))
                .map(|index| items.remove(index))
        });
        let removed = removed.ok_or_else(|| {
            LedgerError::UnknownEntity(format!("allocation {category} ({domain:?})"))
        })?;
        self.ctx
            .persist_collection(keys::ALLOCATIONS, &self.ctx.allocations);
        self.ctx.outbox().enqueue(
            EntityTable::Allocations,
            OperationKind::Delete,
            json!({ "id": removed.id }),
            actor.as_str(),
        );
        Ok(removed)
    }

    pub fn list(&self) -> Vec<BudgetAllocation> {
        self.ctx.allocations.snapshot()
    }

    /// Allocation status for `domain` against the given income figure,
    /// computed from the current entry snapshot.
    pub fn report(&self, income_cents: i64, domain: Domain) -> Vec<AllocationStatus> {
        allocation_report(
            &self.ctx.allocations.snapshot(),
            &self.ctx.entries.snapshot(),
            income_cents,
            domain,
        )
    }
}
