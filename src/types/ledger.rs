// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger header metadata.

use crate::types::id::LedgerSeq;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMeta {
    pub sequence: LedgerSeq,
    pub hash: String,
    #[serde(default)]
    pub prev_hash: Option<String>,
    pub closed_at: DateTime<Utc>,
    #[serde(default)]
    pub transaction_count: u32,
    #[serde(default)]
    pub operation_count: u32,
}
