//! Partner (counterparty) CRUD.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::context::LedgerContext;
use crate::domain::{NewPartner, Partner};
use crate::errors::LedgerError;
use crate::store::keys;
use crate::sync::{EntityTable, OperationKind};

use super::{ServiceError, ServiceResult};

pub struct PartnerService {
    ctx: Arc<LedgerContext>,
}

impl PartnerService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, input: NewPartner) -> ServiceResult<Partner> {
        let actor = self.ctx.current_actor()?;
        if input.name.trim().is_empty() {
            return Err(ServiceError::invalid("name is required"));
        }

        let now = Utc::now();
        let partner = Partner {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            contact: input.contact,
            notes: input.notes,
            owner: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.ctx
            .partners
            .mutate(|items| items.insert(0, partner.clone()));
        self.ctx.persist_collection(keys::PARTNERS, &self.ctx.partners);
        self.ctx.outbox().enqueue(
            EntityTable::Partners,
            OperationKind::Insert,
            serde_json::to_value(&partner).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(partner)
    }

    pub fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Partner)) -> ServiceResult<Partner> {
        let actor = self.ctx.current_actor()?;
        let mut updated = self
            .ctx
            .partners
            .snapshot()
            .into_iter()
            .find(|partner| partner.id == id)
            .ok_or_else(|| LedgerError::UnknownEntity(format!("partner {id}")))?;
        mutate(&mut updated);
        updated.id = id;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::invalid("name is required"));
        }
        updated.updated_at = Utc::now();

        self.ctx.partners.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|partner| partner.id == id) {
                *slot = updated.clone();
            }
        });
        self.ctx.persist_collection(keys::PARTNERS, &self.ctx.partners);
        self.ctx.outbox().enqueue(
            EntityTable::Partners,
            OperationKind::Update,
            serde_json::to_value(&updated).map_err(LedgerError::from)?,
            actor.as_str(),
        );
        Ok(updated)
    }

    pub fn delete(&self, id: Uuid) -> ServiceResult<Partner> {
        let actor = self.ctx.current_actor()?;
        let removed = self.ctx.partners.mutate(|items| {
            items
                .iter()
                .position(|partner| partner.id == id)
                .map(|index| items.remove(index))
        });
        let removed =
            removed.ok_or_else(|| LedgerError::UnknownEntity(format!("partner {id}")))?;
        self.ctx.persist_collection(keys::PARTNERS, &self.ctx.partners);
        self.ctx.outbox().enqueue(
            EntityTable::Partners,
            OperationKind::Delete,
            json!({ "id": id }),
            actor.as_str(),
        );
        Ok(removed)
    }

    pub fn list(&self) -> Vec<Partner> {
        self.ctx.partners.snapshot()
    }
}
