// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const PAGES_SERVED: &str = "effects_pages_served_total";
pub const PAGE_LOAD_SECONDS: &str = "effects_page_load_duration_seconds";
pub const STREAMS_OPENED: &str = "effects_streams_opened_total";
pub const STREAMS_CLOSED: &str = "effects_streams_closed_total";
pub const STREAM_EVENTS_SENT: &str = "effects_stream_events_sent_total";
pub const LEDGER_BATCH_LOADS: &str = "effects_ledger_batch_loads_total";

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger_effects_node=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("Prometheus recorder not installed: {}", e);
            return;
        }
    };

    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(PAGES_SERVED, "Effect pages returned to clients");
    metrics::describe_histogram!(PAGE_LOAD_SECONDS, "Time taken to load and assemble one effect page");
    metrics::describe_counter!(STREAMS_OPENED, "Effect streams opened");
    metrics::describe_counter!(STREAMS_CLOSED, "Effect streams closed, labelled by reason");
    metrics::describe_counter!(STREAM_EVENTS_SENT, "Events pushed to effect streams");
    metrics::describe_counter!(LEDGER_BATCH_LOADS, "Batched ledger metadata lookups");

    metrics::gauge!("effects_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
