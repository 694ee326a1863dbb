//! Shared type definitions for agricultural lot traceability.
//!
//! This crate is the single source of truth for the entity shapes used
//! across the Agritrace workspace: the validation rules, the registry,
//! the durable JSON store and the relational mirror all speak these types.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe lot identifier
//! - [`enums`] -- Event types and the lot status state machine
//! - [`region`] -- Validated two-letter regional codes
//! - [`structs`] -- The [`Lot`] and [`Event`] entity records

pub mod enums;
pub mod ids;
pub mod region;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventType, LotStatus};
pub use ids::LotId;
pub use region::{REGION_CODES, RegionCode};
pub use structs::{Event, Lot};
