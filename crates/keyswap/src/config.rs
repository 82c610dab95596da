//! Service configuration.

use keyswap_core::KeygenConfig;
use serde::{Deserialize, Serialize};

/// Which party is written to slot A of a shared-secret record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotPolicy {
    /// Slot A is the requesting party. Every exchange rewrites the slot
    /// assignment, so a record flips when the pair calls in the other order.
    #[default]
    CallerOrder,
    /// Slot A is the lexicographically smaller party id, independent of
    /// who asked.
    Canonical,
}

/// Configuration for [`KeyExchange`](crate::KeyExchange).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyswapConfig {
    /// Key generation used by `KeyExchange::generate_keypair`.
    pub keygen: KeygenConfig,
    pub slot_policy: SlotPolicy,
}
