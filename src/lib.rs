// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! ledger-effects: scoped, paged and streamed reads of ledger effect history.
//!
//! Control flow: `ScopeResolver` -> `EffectPageLoader` -> `LedgerCache` ->
//! `ResourceAssembler` -> page or stream responder. Storage, resource shape and
//! transport are traits implemented by the host.

pub mod config;
pub mod error;
pub mod types;
pub mod scope;
pub mod page;
pub mod store;
pub mod ledger_cache;
pub mod loader;
pub mod assemble;
pub mod responder;

pub use error::{AssemblyError, EffectsError, EffectsResult, StorageError};
pub use page::{Cursor, Order, PageSpec};
pub use scope::{ScopeFilter, ScopeParams, ScopeResolver};

#[cfg(test)]
pub mod tests;
