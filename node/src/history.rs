// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory ledger history.
//!
//! Effects are kept ordered by paging token and ledgers by sequence, so page
//! queries are range scans. Ingest only appends newer ledgers; reaping only
//! drops the oldest ones.

use crate::errors::NodeError;
use ledger_effects::page::{Cursor, Order};
use ledger_effects::store::{EffectQuery, EffectStore, HistoryBounds, HistoryRange, LedgerMap, LedgerSource};
use ledger_effects::types::effect::EffectRecord;
use ledger_effects::types::id::LedgerSeq;
use ledger_effects::types::ledger::LedgerMeta;
use ledger_effects::types::paging::PagingToken;
use ledger_effects::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// Seed file layout.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistorySeed {
    pub ledgers: Vec<LedgerMeta>,
    #[serde(default)]
    pub effects: Vec<EffectRecord>,
}

#[derive(Default)]
struct HistoryInner {
    effects: BTreeMap<PagingToken, EffectRecord>,
    ledgers: BTreeMap<LedgerSeq, LedgerMeta>,
}

pub struct MemoryHistory {
    inner: RwLock<HistoryInner>,
    tip: watch::Sender<LedgerSeq>,
    ledger_batches: AtomicU64,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        let (tip, _) = watch::channel(LedgerSeq(0));
        Self {
            inner: RwLock::new(HistoryInner::default()),
            tip,
            ledger_batches: AtomicU64::new(0),
        }
    }

    pub fn from_seed(seed: HistorySeed) -> Result<Self, NodeError> {
        let history = Self::new();
        let mut ledgers = seed.ledgers;
        ledgers.sort_by_key(|l| l.sequence);

        let mut by_ledger: BTreeMap<LedgerSeq, Vec<EffectRecord>> = BTreeMap::new();
        for effect in seed.effects {
            by_ledger.entry(effect.ledger_sequence()).or_default().push(effect);
        }

        for meta in ledgers {
            let effects = by_ledger.remove(&meta.sequence).unwrap_or_default();
            history.ingest_ledger(meta, effects)?;
        }
        if let Some(orphan) = by_ledger.keys().next() {
            return Err(NodeError::InvalidInput(format!(
                "seed has effects for ledger {orphan} but no ledger header"
            )));
        }
        Ok(history)
    }

    pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let data = std::fs::read(path.as_ref())?;
        let seed: HistorySeed = serde_json::from_slice(&data)?;
        Self::from_seed(seed)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HistoryInner>, StorageError> {
        self.inner
            .read()
            .map_err(|_| StorageError::Unavailable("history lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HistoryInner>, StorageError> {
        self.inner
            .write()
            .map_err(|_| StorageError::Unavailable("history lock poisoned".into()))
    }

    /// Appends a closed ledger and its effects, then wakes stream waiters.
    pub fn ingest_ledger(&self, meta: LedgerMeta, effects: Vec<EffectRecord>) -> Result<(), NodeError> {
        let seq = meta.sequence;
        {
            let mut inner = self.write()?;
            if let Some(latest) = inner.ledgers.keys().next_back() {
                if seq <= *latest {
                    return Err(NodeError::InvalidInput(format!(
                        "ledger {seq} is not newer than latest ledger {latest}"
                    )));
                }
            }
            if let Some(stray) = effects.iter().find(|e| e.ledger_sequence() != seq) {
                return Err(NodeError::InvalidInput(format!(
                    "effect {} belongs to ledger {}, not {seq}",
                    stray.paging_token,
                    stray.ledger_sequence()
                )));
            }

            let mut staged = BTreeMap::new();
            for effect in effects {
                if staged.insert(effect.paging_token, effect).is_some() {
                    return Err(NodeError::InvalidInput(format!("duplicate effect in ledger {seq}")));
                }
            }
            let count = staged.len();
            inner.effects.append(&mut staged);
            inner.ledgers.insert(seq, meta);
            tracing::debug!("Ingested ledger {} with {} effects", seq, count);
        }
        self.tip.send_replace(seq);
        Ok(())
    }

    /// Drops everything older than the newest `retain` ledgers. Returns the number of effects removed.
    pub fn reap(&self, retain: u32) -> Result<usize, NodeError> {
        let mut inner = self.write()?;
        let (Some(oldest), Some(latest)) = (
            inner.ledgers.keys().next().copied(),
            inner.ledgers.keys().next_back().copied(),
        ) else {
            return Ok(0);
        };
        let retain = retain.max(1);
        let keep_from = LedgerSeq(latest.0.saturating_sub(retain - 1));
        if keep_from <= oldest {
            return Ok(0);
        }

        inner.ledgers = inner.ledgers.split_off(&keep_from);
        let kept = inner.effects.split_off(&PagingToken::ledger_start(keep_from));
        let removed = inner.effects.len();
        inner.effects = kept;
        tracing::info!("Reaped history before ledger {}: {} effects removed", keep_from, removed);
        Ok(removed)
    }

    pub fn latest_ledger(&self) -> Option<LedgerSeq> {
        self.read().ok()?.ledgers.keys().next_back().copied()
    }

    pub fn oldest_ledger(&self) -> Option<LedgerSeq> {
        self.read().ok()?.ledgers.keys().next().copied()
    }

    pub fn effect_count(&self) -> usize {
        self.read().map(|inner| inner.effects.len()).unwrap_or(0)
    }

    /// Receiver that changes whenever a ledger is ingested.
    pub fn subscribe(&self) -> watch::Receiver<LedgerSeq> {
        self.tip.subscribe()
    }

    pub fn ledger_batch_loads(&self) -> u64 {
        self.ledger_batches.load(Ordering::Relaxed)
    }
}

impl EffectStore for MemoryHistory {
    fn select(&self, query: &EffectQuery) -> Result<Vec<EffectRecord>, StorageError> {
        let page = query
            .page_spec()
            .ok_or_else(|| StorageError::Query("effect query without page".into()))?;
        let cursor = match page.cursor() {
            Cursor::Start => None,
            Cursor::After(token) => Some(token),
            Cursor::Now => return Err(StorageError::Query("cursor \"now\" was not pinned".into())),
        };
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let filter = query.filter();
        let inner = self.read()?;

        let rows = match page.order() {
            Order::Ascending => {
                let lower = cursor.map_or(Bound::Unbounded, Bound::Excluded);
                inner
                    .effects
                    .range((lower, Bound::Unbounded))
                    .map(|(_, e)| e)
                    .filter(|e| filter.matches(e))
                    .take(limit)
                    .cloned()
                    .collect()
            }
            Order::Descending => {
                let upper = cursor.map_or(Bound::Unbounded, Bound::Excluded);
                inner
                    .effects
                    .range((Bound::Unbounded, upper))
                    .rev()
                    .map(|(_, e)| e)
                    .filter(|e| filter.matches(e))
                    .take(limit)
                    .cloned()
                    .collect()
            }
        };
        Ok(rows)
    }
}

impl LedgerSource for MemoryHistory {
    fn ledgers_by_sequence(&self, sequences: &[LedgerSeq]) -> Result<LedgerMap, StorageError> {
        self.ledger_batches.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(crate::telemetry::LEDGER_BATCH_LOADS, 1);
        let inner = self.read()?;
        Ok(sequences
            .iter()
            .filter_map(|seq| inner.ledgers.get(seq).map(|meta| (*seq, meta.clone())))
            .collect())
    }
}

impl HistoryBounds for MemoryHistory {
    fn history_range(&self) -> Result<HistoryRange, StorageError> {
        let inner = self.read()?;
        let oldest = inner.ledgers.keys().next().copied().unwrap_or_default();
        let latest = inner.ledgers.keys().next_back().copied().unwrap_or_default();
        Ok(HistoryRange { oldest, latest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ledger_effects::config::PageLimits;
    use ledger_effects::page::PageSpec;
    use ledger_effects::scope::ScopeFilter;
    use ledger_effects::types::enums::EffectType;
    use ledger_effects::types::id::{AccountId, OperationId, TxHash};

    fn meta(seq: u32) -> LedgerMeta {
        LedgerMeta {
            sequence: LedgerSeq(seq),
            hash: format!("{:064x}", seq),
            prev_hash: None,
            closed_at: DateTime::from_timestamp(1_700_000_000 + i64::from(seq) * 5, 0).unwrap(),
            transaction_count: 1,
            operation_count: 1,
        }
    }

    fn effect(seq: u32, op: i64, order: u32) -> EffectRecord {
        EffectRecord {
            paging_token: PagingToken::new(OperationId((i64::from(seq) << 32) | op), order),
            account: AccountId(format!("G{}", "A".repeat(55))),
            transaction_hash: TxHash(format!("{:064x}", seq)),
            kind: EffectType::AccountCreated,
            details: serde_json::json!({ "starting_balance": "100.0000000" }),
        }
    }

    fn page(cursor: Cursor, order: Order, limit: u64) -> EffectQuery {
        EffectQuery::new().page(PageSpec::new(cursor, order, limit, &PageLimits::default()).unwrap())
    }

    #[test]
    fn test_ingest_rejects_stale_and_stray() {
        let history = MemoryHistory::new();
        history.ingest_ledger(meta(5), vec![effect(5, 4097, 1)]).unwrap();

        assert!(history.ingest_ledger(meta(5), vec![]).is_err());
        assert!(history.ingest_ledger(meta(6), vec![effect(7, 4097, 1)]).is_err());
        assert!(history
            .ingest_ledger(meta(6), vec![effect(6, 4097, 1), effect(6, 4097, 1)])
            .is_err());
        assert_eq!(history.latest_ledger(), Some(LedgerSeq(5)));
        assert_eq!(history.effect_count(), 1);
    }

    #[test]
    fn test_select_ranges_both_orders() {
        let history = MemoryHistory::new();
        history.ingest_ledger(meta(5), vec![effect(5, 4097, 1), effect(5, 4097, 2)]).unwrap();
        history.ingest_ledger(meta(6), vec![effect(6, 4097, 1)]).unwrap();

        let asc = history.select(&page(Cursor::Start, Order::Ascending, 10)).unwrap();
        assert_eq!(asc.len(), 3);
        assert!(asc.windows(2).all(|w| w[0].paging_token < w[1].paging_token));

        let after = history
            .select(&page(Cursor::After(asc[0].paging_token), Order::Ascending, 1))
            .unwrap();
        assert_eq!(after, vec![asc[1].clone()]);

        let desc = history
            .select(&page(Cursor::After(asc[2].paging_token), Order::Descending, 10))
            .unwrap();
        assert_eq!(desc.len(), 2);
        assert_eq!(desc[0].paging_token, asc[1].paging_token);

        let ledger6 = history
            .select(&page(Cursor::Start, Order::Ascending, 10).for_ledger(LedgerSeq(6)))
            .unwrap();
        assert_eq!(ledger6.len(), 1);
        assert!(ScopeFilter::Ledger(LedgerSeq(6)).matches(&ledger6[0]));

        assert!(history.select(&page(Cursor::Now, Order::Ascending, 10)).is_err());
    }

    #[test]
    fn test_ledger_batch_counts_calls() {
        let history = MemoryHistory::new();
        history.ingest_ledger(meta(5), vec![]).unwrap();
        let found = history.ledgers_by_sequence(&[LedgerSeq(5), LedgerSeq(9)]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(history.ledger_batch_loads(), 1);
    }

    #[test]
    fn test_reap_moves_oldest_forward() {
        let history = MemoryHistory::new();
        for seq in 1..=5 {
            history.ingest_ledger(meta(seq), vec![effect(seq, 4097, 1)]).unwrap();
        }
        assert_eq!(history.reap(2).unwrap(), 3);
        assert_eq!(history.oldest_ledger(), Some(LedgerSeq(4)));
        assert_eq!(history.effect_count(), 2);
        assert_eq!(
            history.history_range().unwrap(),
            HistoryRange { oldest: LedgerSeq(4), latest: LedgerSeq(5) }
        );
        assert_eq!(history.reap(2).unwrap(), 0);
    }

    #[test]
    fn test_seed_requires_ledger_headers() {
        let seed = HistorySeed {
            ledgers: vec![meta(3)],
            effects: vec![effect(3, 4097, 1), effect(4, 4097, 1)],
        };
        assert!(MemoryHistory::from_seed(seed).is_err());

        let seed = HistorySeed {
            ledgers: vec![meta(4), meta(3)],
            effects: vec![effect(4, 4097, 1), effect(3, 4097, 1)],
        };
        let history = MemoryHistory::from_seed(seed).unwrap();
        assert_eq!(history.latest_ledger(), Some(LedgerSeq(4)));
        assert_eq!(history.effect_count(), 2);
    }

    #[tokio::test]
    async fn test_ingest_wakes_subscribers() {
        let history = MemoryHistory::new();
        let mut rx = history.subscribe();
        history.ingest_ledger(meta(8), vec![]).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), LedgerSeq(8));
    }
}
