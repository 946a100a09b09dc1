// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Resumable effect streams.
//!
//! # States
//! `Idle -> Polling -> Emitting -> (Polling | Closed)`
//!
//! Every poll re-reads the same page from the same cursor. The stream cursor
//! counts confirmed sends, and that prefix of each fetch is dropped before
//! assembly, so each record goes out once per stream.
//!
//! The cursor only moves after a send succeeds. Waiting between polls is the
//! caller's job; this type never blocks.
//!
//! Descending streams without a cursor start from the tip as it was at open,
//! so new ledgers never shift the rows already counted. If history does move
//! (retention drops the oldest rows) the stream fails instead of guessing;
//! the client reconnects with the id of the last event it saw.

use crate::assemble::{AssemblyContext, Resource, ResourceAssembler};
use crate::error::{EffectsError, EffectsResult, StorageError};
use crate::ledger_cache::load_effect_ledgers;
use crate::loader::EffectPageLoader;
use crate::page::{Cursor, Order, PageSpec};
use crate::responder::assemble_records;
use crate::scope::ScopeFilter;
use crate::store::HistoryStore;
use crate::types::effect::EffectRecord;
use crate::types::paging::PagingToken;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEvent<R> {
    pub id: String,
    pub payload: R,
}

/// Delivery channel for stream events.
pub trait EventSink<R> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&mut self, event: StreamEvent<R>) -> Result<(), Self::Error>;

    /// Events this sink has delivered so far, including ones from before a reconnect.
    fn sent_count(&self) -> u64;

    fn set_limit(&mut self, limit: u64);
}

/// Count of records confirmed sent on this stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StreamCursor(u64);

impl StreamCursor {
    pub fn resume(sent: u64) -> Self {
        StreamCursor(sent)
    }

    pub fn sent(&self) -> u64 {
        self.0
    }

    fn advance(&mut self, confirmed: u64) {
        self.0 += confirmed;
    }
}

/// The part of a fresh fetch that has not been sent yet.
pub fn unsent_tail<T>(records: &[T], cursor: StreamCursor) -> &[T] {
    let start = usize::try_from(cursor.sent()).unwrap_or(usize::MAX).min(records.len());
    &records[start..]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Cancelled,
    /// The sink has received `limit` events.
    LimitReached,
    /// The sink stopped accepting events.
    Disconnected,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Polling,
    Emitting,
    Closed(CloseReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Poll finished; this many new events went out. Zero is normal.
    Emitted(usize),
    Closed(CloseReason),
}

pub struct StreamResponder<A> {
    scope: ScopeFilter,
    page: PageSpec,
    ctx: AssemblyContext,
    assembler: A,
    cursor: StreamCursor,
    /// Token of the newest confirmed send on this connection.
    last_sent: Option<PagingToken>,
    state: StreamState,
}

impl<A: ResourceAssembler> StreamResponder<A> {
    /// Validates the request and binds the stream to `sink`.
    ///
    /// The page cursor is pinned here (`now` becomes a concrete position) and
    /// the stream cursor resumes from whatever the sink has already sent.
    pub fn open<S, K>(
        store: &S,
        sink: &mut K,
        assembler: A,
        ctx: AssemblyContext,
        scope: ScopeFilter,
        page: PageSpec,
    ) -> EffectsResult<Self>
    where
        S: HistoryStore + ?Sized,
        K: EventSink<A::Resource>,
    {
        let page = match (page.order(), page.cursor()) {
            (Order::Descending, Cursor::Start) => page.with_cursor(Cursor::Now),
            _ => page,
        };
        let page = EffectPageLoader::new(store).prepare(&page)?;
        sink.set_limit(page.limit());
        Ok(Self {
            scope,
            page,
            ctx,
            assembler,
            cursor: StreamCursor::resume(sink.sent_count()),
            last_sent: None,
            state: StreamState::Idle,
        })
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn cursor(&self) -> StreamCursor {
        self.cursor
    }

    pub fn page(&self) -> &PageSpec {
        &self.page
    }

    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, StreamState::Closed(_))
    }

    pub fn close(&mut self, reason: CloseReason) {
        if !self.is_closed() {
            self.state = StreamState::Closed(reason);
        }
    }

    /// One fetch-and-emit cycle.
    ///
    /// `is_cancelled` is consulted before the fetch and again before the first
    /// send; a cancelled poll emits nothing. Errors close the stream.
    pub fn poll<S, K, C>(&mut self, store: &S, sink: &mut K, is_cancelled: C) -> EffectsResult<PollOutcome>
    where
        S: HistoryStore + ?Sized,
        K: EventSink<A::Resource>,
        C: Fn() -> bool,
    {
        if let StreamState::Closed(reason) = self.state {
            return Ok(PollOutcome::Closed(reason));
        }
        if self.cursor.sent() >= self.page.limit() {
            self.close(CloseReason::LimitReached);
            return Ok(PollOutcome::Closed(CloseReason::LimitReached));
        }
        if is_cancelled() {
            self.close(CloseReason::Cancelled);
            return Ok(PollOutcome::Closed(CloseReason::Cancelled));
        }

        self.state = StreamState::Polling;
        let events = match self.fetch_unsent(store) {
            Ok(events) => events,
            Err(e) => {
                self.close(CloseReason::Failed);
                return Err(e);
            }
        };

        if is_cancelled() {
            self.close(CloseReason::Cancelled);
            return Ok(PollOutcome::Closed(CloseReason::Cancelled));
        }

        self.state = StreamState::Emitting;
        let mut confirmed = 0u64;
        for (token, event) in events {
            let event_id = event.id.clone();
            if let Err(source) = sink.send(event) {
                self.cursor.advance(confirmed);
                self.close(CloseReason::Disconnected);
                return Err(EffectsError::Delivery {
                    event_id,
                    source: Box::new(source),
                });
            }
            self.last_sent = Some(token);
            confirmed += 1;
        }
        self.cursor.advance(confirmed);

        if self.cursor.sent() >= self.page.limit() {
            self.close(CloseReason::LimitReached);
        } else {
            self.state = StreamState::Polling;
        }
        Ok(PollOutcome::Emitted(confirmed as usize))
    }

    /// Loads the page, batches ledgers over the whole fetch, then assembles only the unsent tail.
    fn fetch_unsent<S: HistoryStore + ?Sized>(
        &self,
        store: &S,
    ) -> EffectsResult<Vec<(PagingToken, StreamEvent<A::Resource>)>> {
        let records = EffectPageLoader::new(store).load(&self.scope, &self.page)?;
        self.check_sent_prefix(&records)
            .map_err(|e| EffectsError::storage("resuming effect stream", e))?;
        let ledgers = load_effect_ledgers(store, &records)
            .map_err(|e| EffectsError::storage("loading ledgers", e))?;

        let fresh = unsent_tail(&records, self.cursor);
        let resources = assemble_records(&self.ctx, fresh, &ledgers, &self.assembler)?;
        Ok(fresh
            .iter()
            .zip(resources)
            .map(|(record, payload)| {
                let event = StreamEvent {
                    id: payload.paging_token(),
                    payload,
                };
                (record.paging_token, event)
            })
            .collect())
    }

    /// The last row of the already-sent prefix must be the last row this
    /// connection sent; otherwise the prefix count no longer lines up.
    fn check_sent_prefix(&self, records: &[EffectRecord]) -> Result<(), StorageError> {
        let Some(last) = self.last_sent else {
            return Ok(());
        };
        let index = usize::try_from(self.cursor.sent()).unwrap_or(usize::MAX);
        let found = index.checked_sub(1).and_then(|i| records.get(i)).map(|r| r.paging_token);
        if found == Some(last) {
            return Ok(());
        }
        Err(StorageError::Moved(match found {
            Some(token) => format!("expected {last} at position {index}, found {token}"),
            None => format!("expected {last} at position {index}, found {} rows", records.len()),
        }))
    }
}
