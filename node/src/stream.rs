// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Server-sent event delivery for effect streams.
//!
//! One task per connection drives a `StreamResponder`: poll, then wait for the
//! next tick, a new ledger, client disconnect or shutdown, whichever is first.

use crate::history::MemoryHistory;
use crate::resource::{EffectResource, HalEffectAssembler};
use crate::telemetry::{STREAMS_CLOSED, STREAM_EVENTS_SENT};
use axum::response::sse::Event;
use ledger_effects::responder::{
    CloseReason, EventSink, PollOutcome, StreamEvent, StreamResponder, StreamState,
};
use ledger_effects::types::id::LedgerSeq;
use ledger_effects::EffectsError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("stream client disconnected")]
    Disconnected,
    #[error("could not encode event: {0}")]
    Encode(#[from] axum::Error),
}

/// Sink writing SSE frames into the response body channel.
pub struct SseSink {
    tx: mpsc::UnboundedSender<Event>,
    sent: u64,
    limit: Option<u64>,
}

impl SseSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, sent: 0, limit: None }, rx)
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Opening frame: reconnect delay plus a greeting. Not counted as a sent record.
    pub fn announce(&self, retry: Duration) {
        let _ = self.tx.send(Event::default().retry(retry).event("open").data("\"hello\""));
    }

    /// Final frame before the stream closes on an error.
    pub fn send_error(&self, err: &EffectsError) {
        let detail = if err.is_client_error() {
            err.to_string()
        } else {
            "An error occurred while streaming effects.".to_string()
        };
        let _ = self.tx.send(Event::default().event("error").data(detail));
    }

    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

impl EventSink<EffectResource> for SseSink {
    type Error = SinkError;

    fn send(&mut self, event: StreamEvent<EffectResource>) -> Result<(), SinkError> {
        let frame = Event::default().id(&event.id).json_data(&event.payload)?;
        self.tx.send(frame).map_err(|_| SinkError::Disconnected)?;
        self.sent += 1;
        metrics::counter!(STREAM_EVENTS_SENT, 1);
        Ok(())
    }

    fn sent_count(&self) -> u64 {
        self.sent
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }
}

/// Wakes a stream for its next poll.
pub struct PollTrigger {
    interval: Duration,
    tip: watch::Receiver<LedgerSeq>,
}

impl PollTrigger {
    pub fn new(interval: Duration, tip: watch::Receiver<LedgerSeq>) -> Self {
        Self { interval, tip }
    }

    pub async fn wait(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.interval) => {}
            changed = self.tip.changed() => {
                if changed.is_err() {
                    // Ledger feed gone; fall back to the interval.
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}

fn close_label(reason: CloseReason) -> &'static str {
    match reason {
        CloseReason::Cancelled => "cancelled",
        CloseReason::LimitReached => "limit_reached",
        CloseReason::Disconnected => "disconnected",
        CloseReason::Failed => "failed",
    }
}

fn finish(responder: &mut StreamResponder<HalEffectAssembler>, reason: CloseReason) {
    responder.close(reason);
    metrics::counter!(STREAMS_CLOSED, 1, "reason" => close_label(reason));
    tracing::debug!(
        "Stream: closed ({}) after {} events",
        close_label(reason),
        responder.cursor().sent()
    );
}

pub async fn run_effect_stream(
    history: Arc<MemoryHistory>,
    mut responder: StreamResponder<HalEffectAssembler>,
    mut sink: SseSink,
    mut trigger: PollTrigger,
    cancel: CancellationToken,
) {
    loop {
        match responder.poll(&*history, &mut sink, || cancel.is_cancelled()) {
            Ok(PollOutcome::Emitted(n)) => {
                if n > 0 {
                    tracing::debug!("Stream: sent {} events", n);
                }
            }
            Ok(PollOutcome::Closed(reason)) => {
                finish(&mut responder, reason);
                return;
            }
            Err(EffectsError::Delivery { event_id, .. }) => {
                tracing::debug!("Stream: client went away before event {}", event_id);
                finish(&mut responder, CloseReason::Disconnected);
                return;
            }
            Err(e) => {
                tracing::warn!("Stream: poll failed: {}", e);
                sink.send_error(&e);
                finish(&mut responder, CloseReason::Failed);
                return;
            }
        }

        if let StreamState::Closed(reason) = responder.state() {
            finish(&mut responder, reason);
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                finish(&mut responder, CloseReason::Cancelled);
                return;
            }
            _ = sink.closed() => {
                finish(&mut responder, CloseReason::Disconnected);
                return;
            }
            _ = trigger.wait() => {}
        }
    }
}
