// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![allow(dead_code)]

use chrono::DateTime;
use ledger_effects::types::effect::EffectRecord;
use ledger_effects::types::enums::EffectType;
use ledger_effects::types::id::{AccountId, LedgerSeq, OperationId, TxHash};
use ledger_effects::types::ledger::LedgerMeta;
use ledger_effects::types::paging::PagingToken;
use ledger_effects_node::config::NodeConfig;
use ledger_effects_node::history::{HistorySeed, MemoryHistory};
use ledger_effects_node::server::{build_router, AppState};
use std::sync::Arc;
use tempfile::TempDir;

pub fn alice() -> String {
    format!("G{}", "A".repeat(55))
}

pub fn bob() -> String {
    format!("G{}", "B".repeat(55))
}

pub fn meta(seq: u32) -> LedgerMeta {
    LedgerMeta {
        sequence: LedgerSeq(seq),
        hash: format!("{:064x}", seq),
        prev_hash: None,
        closed_at: DateTime::from_timestamp(1_700_000_000 + i64::from(seq) * 5, 0).unwrap(),
        transaction_count: 2,
        operation_count: 2,
    }
}

pub fn effect(seq: u32, op: i64, order: u32, account: &str) -> EffectRecord {
    EffectRecord {
        paging_token: PagingToken::new(OperationId((i64::from(seq) << 32) | op), order),
        account: AccountId(account.to_string()),
        transaction_hash: TxHash(format!("{:064x}", u64::from(seq) * 1000 + op as u64)),
        kind: EffectType::AccountCredited,
        details: serde_json::json!({ "amount": format!("{seq}.0000000") }),
    }
}

/// Ledgers 2..=4. Alice has four effects, Bob one.
pub fn seed() -> HistorySeed {
    let (a, b) = (alice(), bob());
    HistorySeed {
        ledgers: vec![meta(2), meta(3), meta(4)],
        effects: vec![
            effect(2, 4097, 1, &a),
            effect(3, 4097, 1, &a),
            effect(3, 4097, 2, &a),
            effect(3, 8193, 1, &b),
            effect(4, 4097, 1, &a),
        ],
    }
}

/// Writes the seed to disk and loads it the way the binary does.
pub fn seeded_history(dir: &TempDir) -> Arc<MemoryHistory> {
    let path = dir.path().join("seed.json");
    std::fs::write(&path, serde_json::to_vec(&seed()).unwrap()).unwrap();
    Arc::new(MemoryHistory::load_seed_file(&path).unwrap())
}

pub fn app(history: Arc<MemoryHistory>, config: NodeConfig) -> (axum::Router, AppState) {
    let state = AppState::new(history, config);
    (build_router(state.clone()), state)
}
