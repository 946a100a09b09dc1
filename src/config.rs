// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

/// Page size used when the caller does not pass `limit`.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest `limit` a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 200;

/// Bounds applied when building a `PageSpec` from request parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default: u64,
    pub max: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_LIMIT,
            max: MAX_PAGE_LIMIT,
        }
    }
}
