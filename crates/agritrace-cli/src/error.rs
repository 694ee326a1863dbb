//! Error types for the console binary.

use agritrace_core::config::ConfigError;
use agritrace_core::{RegistryError, ValidationError};
use agritrace_store::StoreError;

/// Top-level error for the console.
///
/// Each variant wraps a specific subsystem error so actions can propagate
/// with `?`; the menu loop reports them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Loading, saving or exporting failed.
    #[error("storage error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// Input failed validation outside the prompt loop.
    #[error("{source}")]
    Validation {
        /// The underlying validation error.
        #[from]
        source: ValidationError,
    },

    /// A registry mutation was rejected.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },

    /// Reading from or writing to the terminal failed.
    #[error("terminal I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Standard input was closed.
    #[error("end of input")]
    EndOfInput,
}
