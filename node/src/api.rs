// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::resource::{EffectResource, Link};
use headers::{Header, HeaderName, HeaderValue};
use ledger_effects::page::PageSpec;
use ledger_effects::responder::Page;
use ledger_effects::scope::ScopeParams;
use ledger_effects::Order;
use serde::{Deserialize, Serialize};

/// Query string accepted by every effects endpoint.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct EffectsParams {
    pub cursor: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub account_id: Option<String>,
    pub ledger_id: Option<u32>,
    pub op_id: Option<i64>,
    pub tx_hash: Option<String>,
}

impl EffectsParams {
    pub fn scope_params(&self) -> ScopeParams {
        ScopeParams {
            account_id: self.account_id.clone(),
            operation_id: self.op_id,
            transaction_hash: self.tx_hash.clone(),
            ledger_id: self.ledger_id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageLinksBody {
    #[serde(rename = "self")]
    pub self_: Link,
    pub next: Link,
    pub prev: Link,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Embedded<R> {
    pub records: Vec<R>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EffectsPageResponse {
    #[serde(rename = "_links")]
    pub links: PageLinksBody,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<EffectResource>,
    pub cursor: String,
    pub order: Order,
    pub limit: u64,
}

fn page_href(base_url: &str, path: &str, spec: &PageSpec) -> Link {
    Link {
        href: format!("{base_url}{path}?{}", spec.to_query()),
    }
}

impl EffectsPageResponse {
    pub fn from_page(page: Page<EffectResource>, base_url: &str, path: &str) -> Self {
        Self {
            links: PageLinksBody {
                self_: page_href(base_url, path, &page.links.self_),
                next: page_href(base_url, path, &page.links.next),
                prev: page_href(base_url, path, &page.links.prev),
            },
            embedded: Embedded { records: page.items },
            cursor: page.cursor,
            order: page.order,
            limit: page.limit,
        }
    }
}

static LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

/// `Last-Event-ID`, sent by SSE clients when they reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastEventId(pub String);

impl Header for LastEventId {
    fn name() -> &'static HeaderName {
        &LAST_EVENT_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        values
            .next()
            .and_then(|v| v.to_str().ok())
            .map(|v| LastEventId(v.trim().to_string()))
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}
