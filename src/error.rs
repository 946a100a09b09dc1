// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use crate::types::paging::PagingToken;
use thiserror::Error;

/// Failure reported by a storage collaborator (effect query or ledger batch load).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The query could not be executed or returned malformed rows.
    #[error("query failed: {0}")]
    Query(String),
    /// A batch load did not return every requested ledger.
    #[error("missing ledgers: {0:?}")]
    MissingLedgers(Vec<u32>),
    /// Rows an open stream already delivered are no longer where it left them.
    #[error("history moved under an open stream: {0}")]
    Moved(String),
    /// The store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure while turning one effect record into an output resource.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AssemblyError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AssemblyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Error, Debug)]
pub enum EffectsError {
    /// Ambiguous scope, malformed identifier, or cursor/limit out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("could not assemble effect {paging_token}")]
    Assembly {
        paging_token: PagingToken,
        #[source]
        source: AssemblyError,
    },

    /// The delivery sink refused an event (client went away).
    #[error("could not deliver event {event_id}")]
    Delivery {
        event_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EffectsError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EffectsError::InvalidRequest(msg.into())
    }

    pub fn storage(context: &'static str, source: StorageError) -> Self {
        EffectsError::Storage { context, source }
    }

    /// True for failures caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EffectsError::InvalidRequest(_))
    }
}

pub type StorageResult<T> = core::result::Result<T, StorageError>;
pub type EffectsResult<T> = core::result::Result<T, EffectsError>;
