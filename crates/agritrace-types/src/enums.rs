//! Enumeration types for lot traceability.
//!
//! Both enums serialize to their canonical upper-case English names. Parsing
//! (and therefore deserialization) is case-insensitive and also accepts the
//! Portuguese names written by earlier versions of the data file, so old
//! `dados.json` exports keep loading.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Which enumeration was being parsed (e.g. `"event type"`).
    pub kind: &'static str,
    /// The rejected input, as given.
    pub value: String,
}

impl core::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// The kind of custody or handling event recorded against a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum EventType {
    /// The product was harvested.
    Harvest,
    /// The lot moved between locations.
    Transport,
    /// The lot was placed in storage.
    Storage,
    /// The lot passed a quality inspection. Marks the lot ready.
    Inspection,
}

impl EventType {
    /// All event types, in menu order.
    pub const ALL: [Self; 4] = [
        Self::Harvest,
        Self::Transport,
        Self::Storage,
        Self::Inspection,
    ];

    /// Canonical upper-case name, as stored in the data file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harvest => "HARVEST",
            Self::Transport => "TRANSPORT",
            Self::Storage => "STORAGE",
            Self::Inspection => "INSPECTION",
        }
    }

    /// Whether appending an event of this type moves a lot to
    /// [`LotStatus::Ready`].
    pub const fn marks_ready(self) -> bool {
        matches!(self, Self::Inspection)
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HARVEST" | "COLHEITA" => Ok(Self::Harvest),
            "TRANSPORT" | "TRANSPORTE" => Ok(Self::Transport),
            "STORAGE" | "ARMAZENAGEM" => Ok(Self::Storage),
            "INSPECTION" | "INSPECAO" | "INSPEÇÃO" => Ok(Self::Inspection),
            _ => Err(UnknownVariant {
                kind: "event type",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for EventType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Lot status
// ---------------------------------------------------------------------------

/// Processing state of a lot.
///
/// ```text
/// PROCESSING --(INSPECTION event)--> READY
/// ```
///
/// `Processing` is the initial state. The only transition is triggered by
/// appending an [`EventType::Inspection`] event; `Ready` is terminal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum LotStatus {
    /// Registered and still moving through the supply chain.
    #[default]
    Processing,
    /// Inspected and ready for sale.
    Ready,
}

impl LotStatus {
    /// Canonical upper-case name, as stored in the data file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
        }
    }

    /// The state reached after appending an event of type `event`.
    #[must_use]
    pub const fn after(self, event: EventType) -> Self {
        if event.marks_ready() { Self::Ready } else { self }
    }
}

impl FromStr for LotStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PROCESSING" | "EM_PROCESSAMENTO" => Ok(Self::Processing),
            "READY" | "PRONTO" => Ok(Self::Ready),
            _ => Err(UnknownVariant {
                kind: "lot status",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for LotStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl core::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
