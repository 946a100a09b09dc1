// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Page and stream responders.

pub mod page;
pub mod stream;

pub use page::{build_page, effects_page, Page, PageLinks};
pub use stream::{
    unsent_tail, CloseReason, EventSink, PollOutcome, StreamCursor, StreamEvent, StreamResponder,
    StreamState,
};

use crate::assemble::{AssemblyContext, ResourceAssembler};
use crate::error::{EffectsError, EffectsResult, StorageError};
use crate::store::LedgerMap;
use crate::types::effect::EffectRecord;

/// Assembles every record or none: the first failure aborts the batch.
pub(crate) fn assemble_records<A: ResourceAssembler + ?Sized>(
    ctx: &AssemblyContext,
    records: &[EffectRecord],
    ledgers: &LedgerMap,
    assembler: &A,
) -> EffectsResult<Vec<A::Resource>> {
    records
        .iter()
        .map(|record| {
            let seq = record.ledger_sequence();
            let ledger = ledgers.get(&seq).ok_or_else(|| {
                EffectsError::storage("resolving effect ledger", StorageError::MissingLedgers(vec![seq.0]))
            })?;
            assembler
                .assemble(ctx, record, ledger)
                .map_err(|source| EffectsError::Assembly {
                    paging_token: record.paging_token,
                    source,
                })
        })
        .collect()
}
