//! Durable storage for the lot registry.
//!
//! The JSON data file is the authoritative copy of every lot. This crate
//! loads it with full validation, saves it atomically with rotating
//! backups, keeps a SHA-256 digest beside it, and exports a flat CSV view.
//!
//! # Modules
//!
//! - [`json_store`] -- [`LotStore`]: validated load and atomic save
//! - [`integrity`] -- SHA-256 digest side-car
//! - [`csv_export`] -- Semicolon-delimited CSV export
//! - [`error`] -- Shared error type

pub mod csv_export;
pub mod error;
pub mod integrity;
pub mod json_store;

pub use csv_export::{CSV_HEADER, export_csv};
pub use error::StoreError;
pub use integrity::{IntegrityStatus, compute_digest, verify_integrity};
pub use json_store::{LotStore, SaveOutcome, StoreConfig};
