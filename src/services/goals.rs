//! Goal CRUD and contribution tracking.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::context::LedgerContext;
use crate::domain::{Goal, NewGoal};
use crate::errors::LedgerError;
use crate::store::keys;
use crate::sync::{EntityTable, OperationKind};

use super::{ServiceError, ServiceResult};

pub struct GoalService {
    ctx: Arc<LedgerContext>,
}

impl GoalService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, input: NewGoal) -> ServiceResult<Goal> {
        let actor = self.ctx.current_actor()?;
        if input.title.trim().is_empty() {
            return Err(ServiceError::invalid("title is required"));
        }
        if input.target_amount_cents <= 0 {
            return Err(ServiceError::invalid("target amount must be positive"));
        }

        let now = Utc::now();
        let goal = Goal {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            target_amount_cents: input.target_amount_cents,
            current_amount_cents: 0,
            deadline: input.deadline,
            priority: input.priority,
            kind: input.kind,
            owner: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.ctx.goals.mutate(|items| items.insert(0, goal.clone()));
        self.ctx.persist_collection(keys::GOALS, &self.ctx.goals);
        self.ctx.outbox().enqueue(
            EntityTable::Goals,
            OperationKind::Insert,
            serde_json::to_value(&goal).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(goal)
    }

    /// Applies `mutate` to the goal's descriptive fields. The accumulated
    /// amount is preserved across the mutation; it only moves through
    /// [`GoalService::contribute`].
    pub fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Goal)) -> ServiceResult<Goal> {
        let actor = self.ctx.current_actor()?;
        let mut updated = self
            .ctx
            .goals
            .snapshot()
            .into_iter()
            .find(|goal| goal.id == id)
            .ok_or_else(|| LedgerError::UnknownEntity(format!("goal {id}")))?;
        let accumulated = updated.current_amount_cents;
        mutate(&mut updated);
        updated.id = id;
        updated.current_amount_cents = accumulated;
        if updated.title.trim().is_empty() {
            return Err(ServiceError::invalid("title is required"));
        }
        if updated.target_amount_cents <= 0 {
            return Err(ServiceError::invalid("target amount must be positive"));
        }
        updated.updated_at = Utc::now();

        self.apply_and_queue(updated, actor.as_str())
    }

    /// Moves the accumulated amount by `amount_cents` (negative to withdraw).
    /// The balance can never go below zero.
    pub fn contribute(&self, id: Uuid, amount_cents: i64) -> ServiceResult<Goal> {
        let actor = self.ctx.current_actor()?;
        let mut updated = self
            .ctx
            .goals
            .snapshot()
            .into_iter()
            .find(|goal| goal.id == id)
            .ok_or_else(|| LedgerError::UnknownEntity(format!("goal {id}")))?;
        let next = updated
            .current_amount_cents
            .checked_add(amount_cents)
            .ok_or_else(|| ServiceError::invalid("contribution overflows the balance"))?;
        if next < 0 {
            return Err(ServiceError::invalid(
                "contribution would make the goal balance negative",
            ));
        }
        updated.current_amount_cents = next;
        updated.updated_at = Utc::now();

        self.apply_and_queue(updated, actor.as_str())
    }

    pub fn delete(&self, id: Uuid) -> ServiceResult<Goal> {
        let actor = self.ctx.current_actor()?;
        let removed = self.ctx.goals.mutate(|items| {
            items
                .iter()
                .position(|goal| goal.id == id)
                .map(|index| items.remove(index))
        });
        let removed = removed.ok_or_else(|| LedgerError::UnknownEntity(format!("goal {id}")))?;
        self.ctx.persist_collection(keys::GOALS, &self.ctx.goals);
        self.ctx.outbox().enqueue(
            EntityTable::Goals,
            OperationKind::Delete,
            json!({ "id": id }),
            actor.as_str(),
        );
        Ok(removed)
    }

    pub fn list(&self) -> Vec<Goal> {
        self.ctx.goals.snapshot()
    }

    fn apply_and_queue(&self, updated: Goal, actor: &str) -> ServiceResult<Goal> {
        self.ctx.goals.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|goal| goal.id == updated.id) {
                *slot = updated.clone();
            }
        });
        self.ctx.persist_collection(keys::GOALS, &self.ctx.goals);
        self.ctx.outbox().enqueue(
            EntityTable::Goals,
            OperationKind::Update,
            serde_json::to_value(&updated).map_err(LedgerError::from)?,
            actor,
        );
        Ok(updated)
    }
}
