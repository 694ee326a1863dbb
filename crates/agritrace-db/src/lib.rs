//! Optional `PostgreSQL` mirror of the lot registry.
//!
//! The JSON data file is the source of truth. This crate keeps a relational
//! copy for ad-hoc querying: every lot and event written to the JSON store
//! is replayed here on a best-effort basis, and a failure on this side is
//! only ever logged.
//!
//! # Architecture
//!
//! ```text
//! Registry mutation
//!     |
//!     +-- save_atomic ---------> JSON data file (authoritative)
//!     |
//!     +-- Box<dyn LotMirror> ---> PostgresMirror -> PgLotStore -> lots / events
//!                            \--> UnavailableMirror (no database)
//! ```
//!
//! # Modules
//!
//! - [`mirror`] -- [`LotMirror`] capability and its two implementations
//! - [`lot_store`] -- Queries on the `lots` and `events` tables
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod lot_store;
pub mod mirror;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use lot_store::{EventRow, LotRow, PgLotStore};
pub use mirror::{LotMirror, PostgresMirror, UnavailableMirror, connect_mirror};
pub use postgres::{PostgresConfig, PostgresPool};
