// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod api;
pub mod config;
pub mod errors;
pub mod history;
pub mod resource;
pub mod server;
pub mod stream;
pub mod telemetry;
