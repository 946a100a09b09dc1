// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Paging tokens.
//!
//! An effect is positioned by the operation that produced it and its order
//! within that operation. Tokens render as `"<operation id>-<order>"`.

use crate::types::id::{LedgerSeq, OperationId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PagingToken {
    pub operation_id: OperationId,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPagingToken(pub String);

impl fmt::Display for InvalidPagingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid paging token {:?}", self.0)
    }
}

impl std::error::Error for InvalidPagingToken {}

impl PagingToken {
    pub fn new(operation_id: OperationId, order: u32) -> Self {
        Self { operation_id, order }
    }

    /// Position sorting before every effect of `ledger` and after every effect of earlier ledgers.
    pub fn ledger_start(ledger: LedgerSeq) -> Self {
        Self::new(OperationId::ledger_start(ledger), 0)
    }

    pub fn ledger_sequence(&self) -> LedgerSeq {
        self.operation_id.ledger_sequence()
    }

    /// Zero-padded record id, sortable as a string.
    pub fn effect_id(&self) -> String {
        format!("{:019}-{:010}", self.operation_id.0, self.order)
    }
}

impl fmt::Display for PagingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.operation_id.0, self.order)
    }
}

impl FromStr for PagingToken {
    type Err = InvalidPagingToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || InvalidPagingToken(s.to_string());
        let (op, order) = match s.split_once('-') {
            Some((op, order)) => (op, order.parse::<u32>().map_err(|_| bad())?),
            None => (s, 0),
        };
        let op = op.parse::<i64>().map_err(|_| bad())?;
        if op < 0 {
            return Err(bad());
        }
        Ok(PagingToken::new(OperationId(op), order))
    }
}

impl Serialize for PagingToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PagingToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
