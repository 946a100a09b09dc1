// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-test history store, assembler and sink.

use crate::assemble::{AssemblyContext, Resource, ResourceAssembler};
use crate::error::{AssemblyError, StorageError, StorageResult};
use crate::page::{Cursor, Order};
use crate::responder::{EventSink, StreamEvent};
use crate::store::{EffectQuery, EffectStore, HistoryBounds, HistoryRange, LedgerMap, LedgerSource};
use crate::types::effect::EffectRecord;
use crate::types::enums::EffectType;
use crate::types::id::{AccountId, LedgerSeq, OperationId, TxHash};
use crate::types::ledger::LedgerMeta;
use crate::types::paging::PagingToken;
use chrono::DateTime;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

pub fn account(c: char) -> AccountId {
    AccountId(format!("G{}", c.to_string().repeat(55)))
}

pub fn tx_hash(n: u64) -> TxHash {
    TxHash(format!("{:064x}", n))
}

pub fn op_id(ledger: u32, tx: u32, op: u32) -> OperationId {
    OperationId((i64::from(ledger) << 32) | (i64::from(tx) << 12) | i64::from(op))
}

pub fn effect(ledger: u32, tx: u32, op: u32, order: u32, who: char) -> EffectRecord {
    EffectRecord {
        paging_token: PagingToken::new(op_id(ledger, tx, op), order),
        account: account(who),
        transaction_hash: tx_hash(u64::from(ledger) * 1000 + u64::from(tx)),
        kind: EffectType::AccountCredited,
        details: serde_json::json!({ "amount": "10.0000000", "asset_type": "native" }),
    }
}

pub fn ledger(seq: u32) -> LedgerMeta {
    LedgerMeta {
        sequence: LedgerSeq(seq),
        hash: format!("{:064x}", seq),
        prev_hash: None,
        closed_at: DateTime::from_timestamp(1_700_000_000 + i64::from(seq) * 5, 0).unwrap(),
        transaction_count: 1,
        operation_count: 1,
    }
}

#[derive(Default)]
pub struct FixtureStore {
    effects: RefCell<Vec<EffectRecord>>,
    ledgers: RefCell<BTreeMap<LedgerSeq, LedgerMeta>>,
    pub oldest: Cell<u32>,
    pub ledger_calls: Cell<usize>,
    pub requested: RefCell<Vec<Vec<LedgerSeq>>>,
    pub select_calls: Cell<usize>,
    pub fail_select: Cell<bool>,
    pub hide_ledger: Cell<Option<u32>>,
}

impl FixtureStore {
    pub fn with(effects: Vec<EffectRecord>) -> Self {
        let store = FixtureStore::default();
        store.oldest.set(1);
        for e in effects {
            store.push(e);
        }
        store
    }

    /// Appends an effect and makes sure its ledger exists.
    pub fn push(&self, e: EffectRecord) {
        let seq = e.ledger_sequence();
        self.ledgers.borrow_mut().entry(seq).or_insert_with(|| ledger(seq.0));
        let mut effects = self.effects.borrow_mut();
        effects.push(e);
        effects.sort_by_key(|e| e.paging_token);
    }

    /// Drops every ledger before `oldest` and its effects, as retention does.
    pub fn reap_before(&self, oldest: u32) {
        self.effects.borrow_mut().retain(|e| e.ledger_sequence().0 >= oldest);
        self.ledgers.borrow_mut().retain(|seq, _| seq.0 >= oldest);
        self.oldest.set(oldest);
    }
}

impl EffectStore for FixtureStore {
    fn select(&self, query: &EffectQuery) -> StorageResult<Vec<EffectRecord>> {
        self.select_calls.set(self.select_calls.get() + 1);
        if self.fail_select.get() {
            return Err(StorageError::Unavailable("fixture offline".into()));
        }
        let page = query.page_spec().copied().expect("query without page");
        let effects = self.effects.borrow();
        let matching = effects.iter().filter(|e| query.filter().matches(e));
        let cursor = match page.cursor() {
            Cursor::After(token) => Some(token),
            Cursor::Start => None,
            Cursor::Now => panic!("now must be pinned before select"),
        };
        let rows: Vec<EffectRecord> = match page.order() {
            Order::Ascending => matching
                .filter(|e| cursor.map_or(true, |c| e.paging_token > c))
                .take(page.limit() as usize)
                .cloned()
                .collect(),
            Order::Descending => {
                let mut all: Vec<&EffectRecord> = matching
                    .filter(|e| cursor.map_or(true, |c| e.paging_token < c))
                    .collect();
                all.reverse();
                all.into_iter().take(page.limit() as usize).cloned().collect()
            }
        };
        Ok(rows)
    }
}

impl LedgerSource for FixtureStore {
    fn ledgers_by_sequence(&self, sequences: &[LedgerSeq]) -> StorageResult<LedgerMap> {
        self.ledger_calls.set(self.ledger_calls.get() + 1);
        self.requested.borrow_mut().push(sequences.to_vec());
        let ledgers = self.ledgers.borrow();
        Ok(sequences
            .iter()
            .filter(|seq| Some(seq.0) != self.hide_ledger.get())
            .filter_map(|seq| ledgers.get(seq).map(|l| (*seq, l.clone())))
            .collect())
    }
}

impl HistoryBounds for FixtureStore {
    fn history_range(&self) -> StorageResult<HistoryRange> {
        let latest = self.ledgers.borrow().keys().next_back().copied().unwrap_or_default();
        Ok(HistoryRange {
            oldest: LedgerSeq(self.oldest.get()),
            latest,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestResource {
    pub token: String,
    pub ledger: u32,
    pub account: String,
    pub link: String,
}

impl Resource for TestResource {
    fn paging_token(&self) -> String {
        self.token.clone()
    }
}

#[derive(Default)]
pub struct TestAssembler {
    pub fail_on: Option<PagingToken>,
    pub calls: Cell<usize>,
}

impl ResourceAssembler for TestAssembler {
    type Resource = TestResource;

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        record: &EffectRecord,
        ledger: &LedgerMeta,
    ) -> Result<TestResource, AssemblyError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on == Some(record.paging_token) {
            return Err(AssemblyError::new("refused by fixture"));
        }
        Ok(TestResource {
            token: record.paging_token.to_string(),
            ledger: ledger.sequence.0,
            account: record.account.0.clone(),
            link: format!("{}/operations/{}", ctx.base_url, record.operation_id()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("sink closed")]
pub struct SinkClosed;

#[derive(Default)]
pub struct VecSink {
    pub events: Vec<StreamEvent<TestResource>>,
    pub prior: u64,
    pub limit: Option<u64>,
    pub accept: Option<usize>,
}

impl VecSink {
    pub fn ids(&self) -> Vec<String> {
        self.events.iter().map(|e| e.id.clone()).collect()
    }
}

impl EventSink<TestResource> for VecSink {
    type Error = SinkClosed;

    fn send(&mut self, event: StreamEvent<TestResource>) -> Result<(), SinkClosed> {
        if self.accept.is_some_and(|n| self.events.len() >= n) {
            return Err(SinkClosed);
        }
        self.events.push(event);
        Ok(())
    }

    fn sent_count(&self) -> u64 {
        self.prior + self.events.len() as u64
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }
}
