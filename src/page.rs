// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Page specifications: cursor, order and limit.

use crate::config::PageLimits;
use crate::error::{EffectsError, EffectsResult};
use crate::types::id::LedgerSeq;
use crate::types::paging::PagingToken;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl Order {
    pub fn parse(raw: &str) -> EffectsResult<Self> {
        match raw {
            "" | "asc" => Ok(Order::Ascending),
            "desc" => Ok(Order::Descending),
            other => Err(EffectsError::invalid(format!("order must be asc or desc, got {other:?}"))),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Order::Ascending => Order::Descending,
            Order::Descending => Order::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }

    /// True when `next` may directly follow `prev` in this order.
    pub fn in_order(&self, prev: &PagingToken, next: &PagingToken) -> bool {
        match self {
            Order::Ascending => prev < next,
            Order::Descending => prev > next,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resume position. Exclusive: a page starts strictly after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cursor {
    /// Start of history for ascending pages, end of history for descending ones.
    #[default]
    Start,
    /// The tip of history at the moment the request is resolved.
    Now,
    After(PagingToken),
}

impl Cursor {
    pub fn parse(raw: &str) -> EffectsResult<Self> {
        match raw {
            "" => Ok(Cursor::Start),
            "now" => Ok(Cursor::Now),
            token => token
                .parse::<PagingToken>()
                .map(Cursor::After)
                .map_err(|e| EffectsError::invalid(e.to_string())),
        }
    }

    pub fn token(&self) -> Option<PagingToken> {
        match self {
            Cursor::After(token) => Some(*token),
            _ => None,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Start => Ok(()),
            Cursor::Now => f.write_str("now"),
            Cursor::After(token) => write!(f, "{token}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageSpec {
    cursor: Cursor,
    order: Order,
    limit: u64,
}

impl PageSpec {
    pub fn new(cursor: Cursor, order: Order, limit: u64, limits: &PageLimits) -> EffectsResult<Self> {
        if limit == 0 {
            return Err(EffectsError::invalid("limit must be positive"));
        }
        if limit > limits.max {
            return Err(EffectsError::invalid(format!("limit {limit} exceeds maximum {}", limits.max)));
        }
        Ok(Self { cursor, order, limit })
    }

    /// Builds a page from raw query parameters, applying the default limit when absent.
    pub fn from_params(
        cursor: Option<&str>,
        order: Option<&str>,
        limit: Option<u64>,
        limits: &PageLimits,
    ) -> EffectsResult<Self> {
        let cursor = Cursor::parse(cursor.unwrap_or_default())?;
        let order = Order::parse(order.unwrap_or_default())?;
        Self::new(cursor, order, limit.unwrap_or(limits.default), limits)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Same order and limit, different cursor.
    pub fn with_cursor(&self, cursor: Cursor) -> Self {
        Self { cursor, ..*self }
    }

    /// Same cursor and limit, opposite order.
    pub fn reversed(&self) -> Self {
        Self { order: self.order.reversed(), ..*self }
    }

    /// Pins `now` to the first position after `latest`. Other cursors are unchanged.
    pub fn resolve_now(&self, latest: LedgerSeq) -> Self {
        match self.cursor {
            Cursor::Now => self.with_cursor(Cursor::After(PagingToken::ledger_start(latest.next()))),
            _ => *self,
        }
    }

    /// Query string carrying this page: `cursor=..&limit=..&order=..`.
    pub fn to_query(&self) -> String {
        format!("cursor={}&limit={}&order={}", self.cursor, self.limit, self.order)
    }
}
