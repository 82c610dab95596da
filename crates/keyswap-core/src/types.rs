//! Strong type definitions for party identities.
//!
//! Identities are newtypes so a party id can never be confused with a
//! display name or a key string.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Opaque identity of a party taking part in key exchanges.
///
/// Any non-empty string is accepted; the identity collaborator decides the
/// format (UUIDs in practice).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyId(String);

impl PartyId {
    /// Create a party id, rejecting empty or all-whitespace strings.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidPartyId("must not be empty".into()));
        }
        Ok(Self(id))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({})", self.0)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PartyId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PartyId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PartyId> for String {
    fn from(id: PartyId) -> Self {
        id.0
    }
}

/// Two distinct parties, independent of argument order.
///
/// The ids are normalised so that `low() < high()`. This is the storage key
/// of a shared-secret record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartyPair {
    low: PartyId,
    high: PartyId,
}

impl PartyPair {
    /// Build the unordered pair `{a, b}`. Returns `None` when `a == b`.
    pub fn new(a: &PartyId, b: &PartyId) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self {
                low: a.clone(),
                high: b.clone(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                low: b.clone(),
                high: a.clone(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The lexicographically smaller id.
    pub fn low(&self) -> &PartyId {
        &self.low
    }

    /// The lexicographically larger id.
    pub fn high(&self) -> &PartyId {
        &self.high
    }

    /// Whether `party` is one of the two members.
    pub fn contains(&self, party: &PartyId) -> bool {
        &self.low == party || &self.high == party
    }

    /// The member that is not `party`, if `party` belongs to the pair.
    pub fn other(&self, party: &PartyId) -> Option<&PartyId> {
        if &self.low == party {
            Some(&self.high)
        } else if &self.high == party {
            Some(&self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for PartyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.low, self.high)
    }
}
