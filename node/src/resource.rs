// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! HAL-style effect resources.

use chrono::SecondsFormat;
use ledger_effects::assemble::{AssemblyContext, Resource, ResourceAssembler};
use ledger_effects::types::effect::EffectRecord;
use ledger_effects::types::ledger::LedgerMeta;
use ledger_effects::AssemblyError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn new(href: String) -> Self {
        Self { href }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectLinks {
    pub operation: Link,
    pub succeeds: Link,
    pub precedes: Link,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EffectResource {
    #[serde(rename = "_links")]
    pub links: EffectLinks,
    pub id: String,
    pub paging_token: String,
    pub account: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_i: u8,
    pub created_at: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Resource for EffectResource {
    fn paging_token(&self) -> String {
        self.paging_token.clone()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HalEffectAssembler;

/// Field names the resource owns; a payload may not shadow them.
const RESERVED_FIELDS: [&str; 7] = ["_links", "id", "paging_token", "account", "type", "type_i", "created_at"];

impl ResourceAssembler for HalEffectAssembler {
    type Resource = EffectResource;

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        record: &EffectRecord,
        ledger: &LedgerMeta,
    ) -> Result<EffectResource, AssemblyError> {
        if ledger.sequence != record.ledger_sequence() {
            return Err(AssemblyError::new(format!(
                "effect {} is in ledger {} but was given ledger {}",
                record.paging_token,
                record.ledger_sequence(),
                ledger.sequence
            )));
        }

        let details = match &record.details {
            serde_json::Value::Null => serde_json::Map::new(),
            serde_json::Value::Object(map) => map.clone(),
            other => {
                return Err(AssemblyError::new(format!(
                    "effect {} details must be an object, got {}",
                    record.paging_token, other
                )))
            }
        };
        if let Some(clash) = RESERVED_FIELDS.iter().find(|f| details.contains_key(**f)) {
            return Err(AssemblyError::new(format!(
                "effect {} details shadow field {clash:?}",
                record.paging_token
            )));
        }

        let token = record.paging_token.to_string();
        let base = &ctx.base_url;
        Ok(EffectResource {
            links: EffectLinks {
                operation: Link::new(format!("{base}/operations/{}", record.operation_id())),
                succeeds: Link::new(format!("{base}/effects?order=desc&cursor={token}")),
                precedes: Link::new(format!("{base}/effects?order=asc&cursor={token}")),
            },
            id: record.id(),
            paging_token: token,
            account: record.account.to_string(),
            type_name: record.kind.name().to_string(),
            type_i: record.kind.code(),
            created_at: ledger.closed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ledger_effects::types::enums::EffectType;
    use ledger_effects::types::id::{AccountId, LedgerSeq, OperationId, TxHash};
    use ledger_effects::types::paging::PagingToken;

    fn record(details: serde_json::Value) -> EffectRecord {
        EffectRecord {
            paging_token: PagingToken::new(OperationId((100i64 << 32) | 4097), 1),
            account: AccountId(format!("G{}", "Q".repeat(55))),
            transaction_hash: TxHash("ab".repeat(32)),
            kind: EffectType::AccountDebited,
            details,
        }
    }

    fn ledger(seq: u32) -> LedgerMeta {
        LedgerMeta {
            sequence: LedgerSeq(seq),
            hash: "00".repeat(32),
            prev_hash: None,
            closed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            transaction_count: 1,
            operation_count: 1,
        }
    }

    #[test]
    fn test_resource_shape() {
        let ctx = AssemblyContext::new("http://localhost:8000/");
        let res = HalEffectAssembler
            .assemble(&ctx, &record(serde_json::json!({ "amount": "5.0000000" })), &ledger(100))
            .unwrap();

        assert_eq!(res.paging_token, "429496733697-1");
        assert_eq!(res.id, "0000000429496733697-0000000001");
        assert_eq!(res.type_name, "account_debited");
        assert_eq!(res.type_i, 3);
        assert_eq!(res.created_at, "2023-11-14T22:13:20Z");
        assert_eq!(res.links.operation.href, "http://localhost:8000/operations/429496733697");
        assert_eq!(
            res.links.precedes.href,
            "http://localhost:8000/effects?order=asc&cursor=429496733697-1"
        );

        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["amount"], "5.0000000");
        assert_eq!(json["type"], "account_debited");
        assert!(json["_links"]["succeeds"]["href"].is_string());
    }

    #[test]
    fn test_rejects_bad_payloads() {
        let ctx = AssemblyContext::default();
        assert!(HalEffectAssembler
            .assemble(&ctx, &record(serde_json::json!([1, 2])), &ledger(100))
            .is_err());
        assert!(HalEffectAssembler
            .assemble(&ctx, &record(serde_json::json!({ "id": "x" })), &ledger(100))
            .is_err());
        assert!(HalEffectAssembler
            .assemble(&ctx, &record(serde_json::Value::Null), &ledger(101))
            .is_err());
        assert!(HalEffectAssembler
            .assemble(&ctx, &record(serde_json::Value::Null), &ledger(100))
            .is_ok());
    }
}
