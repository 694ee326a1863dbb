//! Error types for the agritrace-core crate.
//!
//! Validation never panics and never relies on unwinding: every validator
//! returns a [`ValidationError`] that the caller either reports (and
//! re-prompts for) or propagates.

use agritrace_types::LotId;

/// Errors raised when a field or record fails a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field value fails a validation rule. Recoverable: the caller
    /// re-prompts or rejects the single record.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// The field that was rejected.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A required key is absent from a record. Indicates a structurally
    /// malformed record rather than a data-entry mistake.
    #[error("{record} record is missing field: {field}")]
    MissingField {
        /// Which kind of record (`"lot"` or `"event"`).
        record: &'static str,
        /// The absent key.
        field: &'static str,
    },
}

impl ValidationError {
    /// Shorthand for an [`ValidationError::InvalidInput`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A lot with this id is already registered.
    #[error("duplicate lot id: {0}")]
    DuplicateId(LotId),
}
