// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Effect records as produced by the history store.

use crate::types::enums::EffectType;
use crate::types::id::{AccountId, LedgerSeq, OperationId, TxHash};
use crate::types::paging::PagingToken;
use serde::{Deserialize, Serialize};

/// One state change recorded against an account by an operation.
///
/// Records are read-only here: the store produces them and nothing downstream
/// mutates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub paging_token: PagingToken,
    pub account: AccountId,
    pub transaction_hash: TxHash,
    #[serde(rename = "type")]
    pub kind: EffectType,
    /// Type-specific fields, kept opaque.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl EffectRecord {
    pub fn id(&self) -> String {
        self.paging_token.effect_id()
    }

    pub fn operation_id(&self) -> OperationId {
        self.paging_token.operation_id
    }

    pub fn ledger_sequence(&self) -> LedgerSeq {
        self.paging_token.ledger_sequence()
    }
}
