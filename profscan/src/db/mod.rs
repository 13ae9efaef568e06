//! Persistence ledger
//!
//! The ledger owns resolved records and the skip set. The scheduler and
//! pipeline receive it as `Arc<dyn Ledger>` so tests can swap in
//! [`MemoryLedger`].

pub mod ledger;
pub mod memory;
pub mod retry;

pub use ledger::{Ledger, LedgerSummary, SqliteLedger};
pub use memory::MemoryLedger;
