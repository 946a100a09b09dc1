// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Storage collaborator interfaces.
//!
//! The history store owns query execution. This crate only describes what it
//! asks for: a scoped, paged effect query, a batched ledger lookup and the
//! retained history range.

use crate::error::StorageResult;
use crate::page::PageSpec;
use crate::scope::ScopeFilter;
use crate::types::effect::EffectRecord;
use crate::types::id::{AccountId, LedgerSeq, OperationId, TxHash};
use crate::types::ledger::LedgerMeta;
use rustc_hash::FxHashMap;

pub type LedgerMap = FxHashMap<LedgerSeq, LedgerMeta>;

/// Effect query under construction. Each `for_*` call replaces the previous
/// filter, so at most one foreign key is ever applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectQuery {
    filter: ScopeFilter,
    page: Option<PageSpec>,
}

impl EffectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, id: AccountId) -> Self {
        self.filter = ScopeFilter::Account(id);
        self
    }

    pub fn for_ledger(mut self, seq: LedgerSeq) -> Self {
        self.filter = ScopeFilter::Ledger(seq);
        self
    }

    pub fn for_operation(mut self, id: OperationId) -> Self {
        self.filter = ScopeFilter::Operation(id);
        self
    }

    pub fn for_transaction(mut self, hash: TxHash) -> Self {
        self.filter = ScopeFilter::Transaction(hash);
        self
    }

    pub fn scoped(self, scope: &ScopeFilter) -> Self {
        match scope {
            ScopeFilter::None => self,
            ScopeFilter::Account(id) => self.for_account(id.clone()),
            ScopeFilter::Ledger(seq) => self.for_ledger(*seq),
            ScopeFilter::Operation(id) => self.for_operation(*id),
            ScopeFilter::Transaction(hash) => self.for_transaction(hash.clone()),
        }
    }

    pub fn page(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    pub fn filter(&self) -> &ScopeFilter {
        &self.filter
    }

    pub fn page_spec(&self) -> Option<&PageSpec> {
        self.page.as_ref()
    }
}

pub trait EffectStore {
    /// Runs the query. Rows come back ordered by paging token in the page's
    /// order, strictly after the cursor, at most `limit` of them.
    fn select(&self, query: &EffectQuery) -> StorageResult<Vec<EffectRecord>>;
}

pub trait LedgerSource {
    /// One batched lookup. Sequences that do not exist are simply absent from the map.
    fn ledgers_by_sequence(&self, sequences: &[LedgerSeq]) -> StorageResult<LedgerMap>;
}

/// Ledgers currently retained by the store, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryRange {
    pub oldest: LedgerSeq,
    pub latest: LedgerSeq,
}

pub trait HistoryBounds {
    fn history_range(&self) -> StorageResult<HistoryRange>;
}

/// Everything the effect pipeline needs from one store.
pub trait HistoryStore: EffectStore + LedgerSource + HistoryBounds {}

impl<T: EffectStore + LedgerSource + HistoryBounds + ?Sized> HistoryStore for T {}
