//! Error types for the relational mirror.
//!
//! Mirror errors are never fatal to the application: the JSON store is the
//! source of truth and callers downgrade every [`DbError`] to a warning.

/// Errors that can occur in the mirror.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A value does not fit the column it is stored in.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
