#![doc(test(attr(deny(warnings))))]

//! Ledger Core is an offline-first ledger engine: mutations apply to local
//! state immediately, a durable outbox carries them to the remote system of
//! record, and derived entries (installments, recurring charges) are
//! generated idempotently.

pub mod budget;
pub mod context;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod money;
pub mod reactive;
pub mod services;
pub mod split;
pub mod store;
pub mod sync;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("ledger_core=info".parse().expect("valid directive"));
        fmt().with_env_filter(filter).init();
        tracing::info!("Ledger Core tracing initialized.");
    });
}
