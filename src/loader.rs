// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Effect page loading.

use crate::error::{EffectsError, EffectsResult, StorageError};
use crate::page::{Cursor, PageSpec};
use crate::scope::ScopeFilter;
use crate::store::{EffectQuery, EffectStore, HistoryBounds};
use crate::types::effect::EffectRecord;

/// Fetches one ordered page of effects for a resolved scope.
pub struct EffectPageLoader<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> EffectPageLoader<'a, S>
where
    S: EffectStore + HistoryBounds + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validates the cursor against retained history and pins `now`.
    ///
    /// A stream calls this once when it opens so every poll reads from the
    /// same position.
    pub fn prepare(&self, page: &PageSpec) -> EffectsResult<PageSpec> {
        let range = self
            .store
            .history_range()
            .map_err(|e| EffectsError::storage("reading history range", e))?;

        if let Cursor::After(token) = page.cursor() {
            let ledger = token.ledger_sequence();
            if ledger < range.oldest {
                return Err(EffectsError::invalid(format!(
                    "cursor {token} is in ledger {ledger}, before the oldest retained ledger {}",
                    range.oldest
                )));
            }
        }

        Ok(page.resolve_now(range.latest))
    }

    pub fn load(&self, scope: &ScopeFilter, page: &PageSpec) -> EffectsResult<Vec<EffectRecord>> {
        let page = self.prepare(page)?;
        let query = EffectQuery::new().scoped(scope).page(page);

        let records = self
            .store
            .select(&query)
            .map_err(|e| EffectsError::storage("loading effect records", e))?;

        check_page_shape(&records, &page)
            .map_err(|e| EffectsError::storage("loading effect records", e))?;
        Ok(records)
    }
}

/// Rejects rows that break the page contract: too many, out of order, or not past the cursor.
fn check_page_shape(records: &[EffectRecord], page: &PageSpec) -> Result<(), StorageError> {
    if records.len() as u64 > page.limit() {
        return Err(StorageError::Query(format!(
            "store returned {} rows for limit {}",
            records.len(),
            page.limit()
        )));
    }

    let order = page.order();
    if let (Some(cursor), Some(first)) = (page.cursor().token(), records.first()) {
        if !order.in_order(&cursor, &first.paging_token) {
            return Err(StorageError::Query(format!(
                "row {} does not follow cursor {cursor}",
                first.paging_token
            )));
        }
    }
    for pair in records.windows(2) {
        if !order.in_order(&pair[0].paging_token, &pair[1].paging_token) {
            return Err(StorageError::Query(format!(
                "rows {} and {} are not in {order} order",
                pair[0].paging_token, pair[1].paging_token
            )));
        }
    }
    Ok(())
}
