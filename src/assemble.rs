// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Resource assembly interface.

use crate::error::AssemblyError;
use crate::types::effect::EffectRecord;
use crate::types::ledger::LedgerMeta;

/// Request-scoped data an assembler may need to render links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyContext {
    /// Scheme and host the client reached us on, without a trailing slash.
    pub base_url: String,
}

impl AssemblyContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

pub trait Resource {
    /// Cursor position of this resource; also the stream event id.
    fn paging_token(&self) -> String;
}

/// Turns a raw record plus the ledger it closed in into an output resource.
pub trait ResourceAssembler {
    type Resource: Resource;

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        record: &EffectRecord,
        ledger: &LedgerMeta,
    ) -> Result<Self::Resource, AssemblyError>;
}
