//! Validation rules, lot registry, reporting and configuration.
//!
//! This crate owns the domain-integrity layer: the pure validators that
//! normalize raw user input, the whole-record invariant checks that guard
//! every durable write, the in-memory lot registry with the status state
//! machine, and the KPI summary computed from it.
//!
//! # Modules
//!
//! - [`validation`] -- Pure field validators shared by the prompt loop and
//!   the registry.
//! - [`record`] -- Whole-record invariant checks for lots and events, both
//!   for raw JSON records and typed in-memory lots.
//! - [`registry`] -- [`LotRegistry`]: lot registration, event registration
//!   and filtered listing.
//! - [`report`] -- Sustainability KPIs and their text rendering.
//! - [`config`] -- Configuration loading from `agritrace.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- Validation and registry error types.
//!
//! [`LotRegistry`]: registry::LotRegistry

pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod report;
pub mod validation;

pub use error::{RegistryError, ValidationError};
pub use registry::{EventInput, LotFilter, LotInput, LotRegistry};
pub use report::{Kpis, compute_kpis, compute_kpis_at, format_report};
