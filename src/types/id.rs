// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account address (`G...` strkey).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct LedgerSeq(pub u32);

/// Total order id of an operation. The ledger sequence lives in the high 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct OperationId(pub i64);

/// Hex-encoded transaction hash.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

pub const ACCOUNT_ID_LEN: usize = 56;
pub const TX_HASH_LEN: usize = 64;

impl AccountId {
    /// Shape check only: 56 base32 characters starting with `G`.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ACCOUNT_ID_LEN
            && self.0.starts_with('G')
            && self.0.bytes().all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
    }
}

impl TxHash {
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == TX_HASH_LEN && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl LedgerSeq {
    pub fn next(&self) -> Self {
        LedgerSeq(self.0.saturating_add(1))
    }
}

impl OperationId {
    /// First operation id that can appear in `ledger`.
    pub fn ledger_start(ledger: LedgerSeq) -> Self {
        OperationId(i64::from(ledger.0) << 32)
    }

    pub fn ledger_sequence(&self) -> LedgerSeq {
        LedgerSeq((self.0 >> 32) as u32)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LedgerSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
