//! Validated regional codes.
//!
//! A lot's origin is one of the 27 Brazilian federative units (26 states
//! plus the Federal District), written as its two-letter code.

use serde::{Deserialize, Serialize};

/// The fixed set of valid regional codes, sorted.
pub const REGION_CODES: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// A two-letter regional code known to be in [`REGION_CODES`].
///
/// The only way to build one is [`RegionCode::parse`], which also backs
/// deserialization, so every value in memory is valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Trim, upper-case and check membership in [`REGION_CODES`].
    ///
    /// Returns `None` when the normalized text is not a known code.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        REGION_CODES
            .binary_search(&code.as_str())
            .ok()
            .map(|_| Self(code))
    }

    /// The normalized code, e.g. `"SP"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid region code: {value:?}"))
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

impl core::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
