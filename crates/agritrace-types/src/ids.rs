//! Type-safe lot identifier.
//!
//! Lot ids are positive integers assigned by the registry as
//! `max(existing) + 1`. The newtype keeps them from being mixed up with
//! counts, weights or database row ids.

use serde::{Deserialize, Serialize};

/// Unique identifier for a lot in the registry.
///
/// Serialized as a bare JSON integer. Valid ids start at 1; the zero
/// value only ever shows up in malformed input and is rejected by the
/// record checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub u64);

impl LotId {
    /// The first id handed out by an empty registry.
    pub const FIRST: Self = Self(1);

    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Whether the id is in the valid (positive) range.
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }

    /// The id following this one, saturating at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for LotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<LotId> for u64 {
    fn from(id: LotId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&LotId(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }

    #[test]
    fn zero_is_not_valid() {
        assert!(!LotId(0).is_valid());
        assert!(LotId::FIRST.is_valid());
    }

    #[test]
    fn next_saturates() {
        assert_eq!(LotId(5).next(), LotId(6));
        assert_eq!(LotId(u64::MAX).next(), LotId(u64::MAX));
    }
}
