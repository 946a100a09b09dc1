// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Effect kinds.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EffectType {
    AccountCreated = 0,
    AccountRemoved = 1,
    AccountCredited = 2,
    AccountDebited = 3,
    AccountThresholdsUpdated = 4,
    AccountHomeDomainUpdated = 5,
    AccountFlagsUpdated = 6,
    SignerCreated = 10,
    SignerRemoved = 11,
    SignerUpdated = 12,
    TrustlineCreated = 20,
    TrustlineRemoved = 21,
    TrustlineUpdated = 22,
    OfferCreated = 30,
    OfferRemoved = 31,
    OfferUpdated = 32,
    Trade = 33,
    DataCreated = 40,
    DataRemoved = 41,
    DataUpdated = 42,
    SequenceBumped = 43,
}

impl EffectType {
    pub fn from_u8(v: u8) -> Option<Self> {
        use EffectType::*;
        let kind = match v {
            0 => AccountCreated,
            1 => AccountRemoved,
            2 => AccountCredited,
            3 => AccountDebited,
            4 => AccountThresholdsUpdated,
            5 => AccountHomeDomainUpdated,
            6 => AccountFlagsUpdated,
            10 => SignerCreated,
            11 => SignerRemoved,
            12 => SignerUpdated,
            20 => TrustlineCreated,
            21 => TrustlineRemoved,
            22 => TrustlineUpdated,
            30 => OfferCreated,
            31 => OfferRemoved,
            32 => OfferUpdated,
            33 => Trade,
            40 => DataCreated,
            41 => DataRemoved,
            42 => DataUpdated,
            43 => SequenceBumped,
            _ => return None,
        };
        Some(kind)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        use EffectType::*;
        match self {
            AccountCreated => "account_created",
            AccountRemoved => "account_removed",
            AccountCredited => "account_credited",
            AccountDebited => "account_debited",
            AccountThresholdsUpdated => "account_thresholds_updated",
            AccountHomeDomainUpdated => "account_home_domain_updated",
            AccountFlagsUpdated => "account_flags_updated",
            SignerCreated => "signer_created",
            SignerRemoved => "signer_removed",
            SignerUpdated => "signer_updated",
            TrustlineCreated => "trustline_created",
            TrustlineRemoved => "trustline_removed",
            TrustlineUpdated => "trustline_updated",
            OfferCreated => "offer_created",
            OfferRemoved => "offer_removed",
            OfferUpdated => "offer_updated",
            Trade => "trade",
            DataCreated => "data_created",
            DataRemoved => "data_removed",
            DataUpdated => "data_updated",
            SequenceBumped => "sequence_bumped",
        }
    }
}
