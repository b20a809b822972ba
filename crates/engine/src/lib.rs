//! Wallet ledger engine.
//!
//! The engine owns the ledger consistency invariant: an account's balance is
//! always the signed sum of its recorded entries, and every mutation
//! (credit, debit, transfer) is applied inside a single database transaction
//! so that either every write lands or none does.

pub use accounts::Account;
pub use commands::{CreditCmd, DebitCmd, TransferCmd};
pub use entries::{EntryKind, LedgerEntry};
pub use error::EngineError;
pub use money::Money;
pub use ops::{
    DEFAULT_PAGE_SIZE, Engine, EngineBuilder, EntriesPage, MAX_PAGE_SIZE, PostedEntry,
    TransferReceipt, TransferStatus, TransferView,
};

mod accounts;
mod commands;
mod entries;
mod error;
mod money;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;
