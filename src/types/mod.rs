// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger history types.

pub mod id;
pub mod paging;
pub mod enums;
pub mod effect;
pub mod ledger;
