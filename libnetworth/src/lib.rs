//! Networth - A dated ledger of account balances
//! ---
//!
//! Keeps a chronological series of snapshots, each holding balances for a
//! user-extensible set of accounts, and derives the total and the
//! period-over-period gain for every snapshot.
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Ledger state and its mutations.
///
/// The main structure is [`Ledger`][ledger::Ledger], which owns the record set and the
/// [`KeyRegistry`][registry::KeyRegistry] and keeps both consistent. Every change to the
/// record set goes through [`recalculate`][recalc::recalculate] before it becomes visible.
pub mod ledger;

/// Import sources, and a delimited-sheet importer built on pest.
pub mod import;

pub mod recalc;
pub mod record;
pub mod registry;

/// Persistence collaborators.
pub mod store;

pub use import::{ImportBatch, ImportSource, SheetImport};
pub use ledger::{Confirm, Ledger, LedgerSnapshot, PendingKeyDeletion};
pub use recalc::recalculate;
pub use record::{Assets, Record, RecordId};
pub use registry::KeyRegistry;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
