//! The relational mirror capability.
//!
//! The application talks to the mirror only through [`LotMirror`], so a
//! missing or unreachable database is just another implementation
//! ([`UnavailableMirror`]) rather than a special case at every call site.
//! The JSON store stays authoritative: nothing read from the mirror flows
//! back into the registry.

use agritrace_core::config::DatabaseConfig;
use agritrace_types::{Event, Lot, LotId, LotStatus};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::DbError;
use crate::lot_store::{EventRow, LotRow, PgLotStore};
use crate::postgres::{PostgresConfig, PostgresPool};

/// Secondary, best-effort sink for lots and events.
///
/// Implementations must be usable behind `Box<dyn LotMirror>`.
#[async_trait]
pub trait LotMirror: Send + Sync {
    /// Whether writes actually reach a database.
    fn is_available(&self) -> bool;

    /// Mirror a lot under its existing id.
    async fn insert_lot(&self, lot: &Lot) -> Result<(), DbError>;

    /// Mirror an event. Returns the mirror's event id when one was stored.
    async fn insert_event(&self, lot_id: LotId, event: &Event) -> Result<Option<i64>, DbError>;

    /// Mirror a status change. Returns `true` if a mirrored lot changed.
    async fn update_status(&self, lot_id: LotId, status: LotStatus) -> Result<bool, DbError>;

    /// Mirrored lots, optionally filtered.
    async fn list_lots(
        &self,
        origin_region: Option<&str>,
        status: Option<LotStatus>,
    ) -> Result<Vec<LotRow>, DbError>;

    /// Mirrored events of one lot.
    async fn list_events(&self, lot_id: LotId) -> Result<Vec<EventRow>, DbError>;

    /// Remove a lot (and its events) from the mirror. Returns `true` if it existed.
    async fn delete_lot(&self, lot_id: LotId) -> Result<bool, DbError>;
}

/// Mirror used when no database is configured or reachable.
///
/// Writes succeed without doing anything; reads are empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMirror;

#[async_trait]
impl LotMirror for UnavailableMirror {
    fn is_available(&self) -> bool {
        false
    }

    async fn insert_lot(&self, _lot: &Lot) -> Result<(), DbError> {
        Ok(())
    }

    async fn insert_event(&self, _lot_id: LotId, _event: &Event) -> Result<Option<i64>, DbError> {
        Ok(None)
    }

    async fn update_status(&self, _lot_id: LotId, _status: LotStatus) -> Result<bool, DbError> {
        Ok(false)
    }

    async fn list_lots(
        &self,
        _origin_region: Option<&str>,
        _status: Option<LotStatus>,
    ) -> Result<Vec<LotRow>, DbError> {
        Ok(Vec::new())
    }

    async fn list_events(&self, _lot_id: LotId) -> Result<Vec<EventRow>, DbError> {
        Ok(Vec::new())
    }

    async fn delete_lot(&self, _lot_id: LotId) -> Result<bool, DbError> {
        Ok(false)
    }
}

/// Mirror backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PostgresMirror {
    pool: PostgresPool,
}

impl PostgresMirror {
    /// Wrap an already-migrated pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// Connect and create the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DbError> {
        let pool = PostgresPool::connect(config).await?;
        pool.run_migrations().await?;
        Ok(Self::new(pool))
    }

    fn store(&self) -> PgLotStore<'_> {
        PgLotStore::new(self.pool.pool())
    }
}

#[async_trait]
impl LotMirror for PostgresMirror {
    fn is_available(&self) -> bool {
        true
    }

    async fn insert_lot(&self, lot: &Lot) -> Result<(), DbError> {
        self.store().insert_lot(lot).await
    }

    async fn insert_event(&self, lot_id: LotId, event: &Event) -> Result<Option<i64>, DbError> {
        self.store().insert_event(lot_id, event).await.map(Some)
    }

    async fn update_status(&self, lot_id: LotId, status: LotStatus) -> Result<bool, DbError> {
        self.store().update_status(lot_id, status).await
    }

    async fn list_lots(
        &self,
        origin_region: Option<&str>,
        status: Option<LotStatus>,
    ) -> Result<Vec<LotRow>, DbError> {
        self.store().list_lots(origin_region, status).await
    }

    async fn list_events(&self, lot_id: LotId) -> Result<Vec<EventRow>, DbError> {
        self.store().list_events(lot_id).await
    }

    async fn delete_lot(&self, lot_id: LotId) -> Result<bool, DbError> {
        self.store().delete_lot(lot_id).await
    }
}

/// Build the mirror described by the `database` config section.
///
/// Never fails: a disabled section, an absent URL, or a connection or
/// migration error all yield an [`UnavailableMirror`] (the error is logged).
pub async fn connect_mirror(config: &DatabaseConfig) -> Box<dyn LotMirror> {
    let Some(pg_config) = PostgresConfig::from_database_config(config) else {
        info!("Relational mirror not configured");
        return Box::new(UnavailableMirror);
    };

    match PostgresMirror::connect(&pg_config).await {
        Ok(mirror) => {
            info!("Relational mirror connected");
            Box::new(mirror)
        }
        Err(e) => {
            warn!(error = %e, "Relational mirror unavailable, continuing without it");
            Box::new(UnavailableMirror)
        }
    }
}
