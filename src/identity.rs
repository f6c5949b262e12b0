//! Current-actor identity boundary. Authentication itself lives outside the
//! engine; services only need a stable identifier to stamp onto entities and
//! outbox payloads.

/// Stable identifier of the current actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Supplies the current actor. Returning `None` makes every mutation a hard
/// precondition failure.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Option<ActorId>;
}

/// Fixed identity for tests and single-user deployments.
pub struct StaticIdentity {
    actor: ActorId,
}

impl StaticIdentity {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: ActorId::new(actor),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Option<ActorId> {
        Some(self.actor.clone())
    }
}

/// Identity provider that never yields an actor; useful for exercising the
/// precondition failure path.
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_actor(&self) -> Option<ActorId> {
        None
    }
}
