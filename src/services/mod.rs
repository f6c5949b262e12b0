//! Entity services: validate, normalize, apply optimistically to the
//! reactive collections, persist, and enqueue the matching remote operation.
//! Callers never wait on network I/O.

pub mod allocations;
pub mod entries;
pub mod goals;
pub mod partners;
pub mod recurring;

pub use allocations::AllocationService;
pub use entries::EntryService;
pub use goals::GoalService;
pub use partners::PartnerService;
pub use recurring::RecurringService;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Invalid(String),
}

impl ServiceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
