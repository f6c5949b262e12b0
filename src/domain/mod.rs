//! Ledger domain models shared by the cache, the reactive collections, and
//! the sync queue.

pub mod allocation;
pub mod entry;
pub mod goal;
pub mod partner;
pub mod recurring;

pub use allocation::BudgetAllocation;
pub use entry::{Domain, EntryKind, InstallmentTag, LedgerEntry, NewEntry, Settlement};
pub use goal::{Goal, GoalKind, GoalPriority, NewGoal};
pub use partner::{NewPartner, Partner};
pub use recurring::{NewRecurringRule, RecurringRule};
