// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use ledger_effects::config::PageLimits;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    pub page_limits: PageLimits,
    /// Upper bound on the wait between stream polls. A newly ingested ledger wakes streams earlier.
    pub stream_poll_interval: Duration,
    /// Reconnect delay advertised to SSE clients.
    pub stream_retry: Duration,
    /// Serve `/effects` without a scope identifier.
    pub allow_unscoped: bool,
    /// JSON file with `{ledgers, effects}` loaded at startup.
    pub seed_path: Option<PathBuf>,
    /// Keep only this many most recent ledgers.
    pub history_retention: Option<u32>,
    pub reap_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            page_limits: PageLimits::default(),
            stream_poll_interval: Duration::from_secs(1),
            stream_retry: Duration::from_secs(1),
            allow_unscoped: true,
            seed_path: None,
            history_retention: None,
            reap_interval: Duration::from_secs(60),
        }
    }
}
