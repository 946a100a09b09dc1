// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Scope resolution.
//!
//! A request may name at most one of account, operation, transaction or ledger.
//! Resolution is pure validation and happens before any storage access.

use crate::error::{EffectsError, EffectsResult};
use crate::types::effect::EffectRecord;
use crate::types::id::{AccountId, LedgerSeq, OperationId, TxHash};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ScopeFilter {
    /// Unscoped: the global effect feed.
    #[default]
    None,
    Account(AccountId),
    Ledger(LedgerSeq),
    Operation(OperationId),
    Transaction(TxHash),
}

impl ScopeFilter {
    /// Equality check on the foreign key this scope filters by.
    pub fn matches(&self, record: &EffectRecord) -> bool {
        match self {
            ScopeFilter::None => true,
            ScopeFilter::Account(id) => &record.account == id,
            ScopeFilter::Ledger(seq) => record.ledger_sequence() == *seq,
            ScopeFilter::Operation(id) => record.operation_id() == *id,
            ScopeFilter::Transaction(hash) => record.transaction_hash.0.eq_ignore_ascii_case(&hash.0),
        }
    }

    pub fn is_scoped(&self) -> bool {
        !matches!(self, ScopeFilter::None)
    }
}

/// Raw identifiers as supplied by the caller. Empty strings and zeros count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeParams {
    pub account_id: Option<String>,
    pub operation_id: Option<i64>,
    pub transaction_hash: Option<String>,
    pub ledger_id: Option<u32>,
}

impl ScopeParams {
    /// Number of identifiers actually supplied.
    pub fn count_non_empty(&self) -> usize {
        [
            self.account().is_some(),
            self.operation().is_some(),
            self.transaction().is_some(),
            self.ledger().is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    fn account(&self) -> Option<&str> {
        self.account_id.as_deref().filter(|s| !s.is_empty())
    }

    fn operation(&self) -> Option<i64> {
        self.operation_id.filter(|id| *id != 0)
    }

    fn transaction(&self) -> Option<&str> {
        self.transaction_hash.as_deref().filter(|s| !s.is_empty())
    }

    fn ledger(&self) -> Option<u32> {
        self.ledger_id.filter(|seq| *seq != 0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeResolver {
    allow_unscoped: bool,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self { allow_unscoped: true }
    }
}

impl ScopeResolver {
    pub fn new(allow_unscoped: bool) -> Self {
        Self { allow_unscoped }
    }

    pub fn allows_unscoped(&self) -> bool {
        self.allow_unscoped
    }

    pub fn resolve(&self, params: &ScopeParams) -> EffectsResult<ScopeFilter> {
        match params.count_non_empty() {
            0 if self.allow_unscoped => return Ok(ScopeFilter::None),
            0 => {
                return Err(EffectsError::invalid(
                    "one of account_id, op_id, tx_hash or ledger_id is required",
                ))
            }
            1 => {}
            _ => {
                return Err(EffectsError::invalid(
                    "only one of account_id, op_id, tx_hash or ledger_id may be supplied",
                ))
            }
        }

        if let Some(account) = params.account() {
            let id = AccountId(account.to_string());
            if !id.is_well_formed() {
                return Err(EffectsError::invalid(format!("malformed account id {account:?}")));
            }
            Ok(ScopeFilter::Account(id))
        } else if let Some(seq) = params.ledger() {
            Ok(ScopeFilter::Ledger(LedgerSeq(seq)))
        } else if let Some(op) = params.operation() {
            if op < 0 {
                return Err(EffectsError::invalid(format!("operation id {op} must be positive")));
            }
            Ok(ScopeFilter::Operation(OperationId(op)))
        } else if let Some(hash) = params.transaction() {
            let hash = TxHash(hash.to_ascii_lowercase());
            if !hash.is_well_formed() {
                return Err(EffectsError::invalid(format!("malformed transaction hash {:?}", hash.0)));
            }
            Ok(ScopeFilter::Transaction(hash))
        } else {
            Ok(ScopeFilter::None)
        }
    }
}
