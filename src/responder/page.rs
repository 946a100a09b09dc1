// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! One-shot page responses.

use crate::assemble::{AssemblyContext, ResourceAssembler};
use crate::error::{EffectsError, EffectsResult};
use crate::ledger_cache::load_effect_ledgers;
use crate::loader::EffectPageLoader;
use crate::page::{Cursor, Order, PageSpec};
use crate::responder::assemble_records;
use crate::scope::ScopeFilter;
use crate::store::{HistoryStore, LedgerMap};
use crate::types::effect::EffectRecord;

/// Navigation for a page. Each link is the page spec a client would request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLinks {
    pub self_: PageSpec,
    pub next: PageSpec,
    pub prev: PageSpec,
}

#[derive(Clone, Debug)]
pub struct Page<R> {
    /// The cursor exactly as requested.
    pub cursor: String,
    pub order: Order,
    pub limit: u64,
    pub items: Vec<R>,
    pub links: PageLinks,
}

impl<R> Page<R> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Assembles `effects` (already ordered) into a page. Any assembly failure
/// discards the whole page.
///
/// `requested_cursor` is the cursor text the client sent; it is echoed as is.
pub fn build_page<A: ResourceAssembler + ?Sized>(
    ctx: &AssemblyContext,
    effects: &[EffectRecord],
    ledgers: &LedgerMap,
    assembler: &A,
    page: &PageSpec,
    requested_cursor: &str,
) -> EffectsResult<Page<A::Resource>> {
    let items = assemble_records(ctx, effects, ledgers, assembler)?;

    let next = match effects.last() {
        Some(last) => page.with_cursor(Cursor::After(last.paging_token)),
        None => *page,
    };
    let prev = match effects.first() {
        Some(first) => page.with_cursor(Cursor::After(first.paging_token)).reversed(),
        None => page.reversed(),
    };

    Ok(Page {
        cursor: requested_cursor.to_string(),
        order: page.order(),
        limit: page.limit(),
        items,
        links: PageLinks {
            self_: *page,
            next,
            prev,
        },
    })
}

/// Full one-shot pipeline: load, batch ledgers, assemble.
pub fn effects_page<S, A>(
    store: &S,
    assembler: &A,
    ctx: &AssemblyContext,
    scope: &ScopeFilter,
    page: &PageSpec,
    requested_cursor: &str,
) -> EffectsResult<Page<A::Resource>>
where
    S: HistoryStore + ?Sized,
    A: ResourceAssembler + ?Sized,
{
    let records = EffectPageLoader::new(store).load(scope, page)?;
    let ledgers = load_effect_ledgers(store, &records)
        .map_err(|e| EffectsError::storage("loading ledgers", e))?;
    build_page(ctx, &records, &ledgers, assembler, page, requested_cursor)
}
