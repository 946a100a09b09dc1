// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Batched ledger metadata lookup.
//!
//! # Flow
//! 1. `queue()` every ledger sequence a set of effects references
//! 2. `load()` once: one storage call for the distinct sequences
//!
//! The cache lives for one page or one stream poll and is never shared.

use crate::error::{StorageError, StorageResult};
use crate::store::{LedgerMap, LedgerSource};
use crate::types::effect::EffectRecord;
use crate::types::id::LedgerSeq;
use rustc_hash::FxHashSet;

#[derive(Clone, Debug, Default)]
pub struct LedgerCache {
    queued: FxHashSet<LedgerSeq>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records interest in `sequence`. Duplicates are free.
    pub fn queue(&mut self, sequence: LedgerSeq) {
        self.queued.insert(sequence);
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Resolves every queued sequence with a single batched call.
    ///
    /// Nothing queued means no call at all. A ledger missing from the
    /// store's answer fails the whole load.
    pub fn load<S: LedgerSource + ?Sized>(self, source: &S) -> StorageResult<LedgerMap> {
        if self.queued.is_empty() {
            return Ok(LedgerMap::default());
        }

        let mut sequences: Vec<LedgerSeq> = self.queued.into_iter().collect();
        sequences.sort_unstable();

        let mut found = source.ledgers_by_sequence(&sequences)?;

        let missing: Vec<u32> = sequences
            .iter()
            .filter(|seq| !found.contains_key(seq))
            .map(|seq| seq.0)
            .collect();
        if !missing.is_empty() {
            return Err(StorageError::MissingLedgers(missing));
        }

        found.retain(|seq, _| sequences.binary_search(seq).is_ok());
        Ok(found)
    }
}

/// Queues the ledger of every record and loads them in one batch.
pub fn load_effect_ledgers<S: LedgerSource + ?Sized>(
    source: &S,
    records: &[EffectRecord],
) -> StorageResult<LedgerMap> {
    let mut cache = LedgerCache::new();
    for record in records {
        cache.queue(record.ledger_sequence());
    }
    cache.load(source)
}
