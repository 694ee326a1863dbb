//! Operations on the `lots` and `events` tables.

use agritrace_types::{Event, Lot, LotId, LotStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sqlx::PgPool;

use crate::error::DbError;

/// Scale of the `weight_kg` column.
const WEIGHT_SCALE: u32 = 3;

/// Operations on the mirror tables.
pub struct PgLotStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgLotStore<'a> {
    /// Create a new lot store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a lot under its existing id, or overwrite the mirrored copy.
    ///
    /// Events are not touched; they are mirrored one by one through
    /// [`PgLotStore::insert_event`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if the id or weight does not fit its
    /// column, or [`DbError::Postgres`] if the insert fails.
    pub async fn insert_lot(&self, lot: &Lot) -> Result<(), DbError> {
        let id = lot_id_to_db(lot.id)?;
        let weight = weight_to_db(lot.weight_kg)?;

        sqlx::query(
            r"INSERT INTO lots (id, product, producer, origin_region, harvest_date, weight_kg,
                                carbon_neutral, water_reuse, status)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
              ON CONFLICT (id) DO UPDATE SET
                product = EXCLUDED.product,
                producer = EXCLUDED.producer,
                origin_region = EXCLUDED.origin_region,
                harvest_date = EXCLUDED.harvest_date,
                weight_kg = EXCLUDED.weight_kg,
                carbon_neutral = EXCLUDED.carbon_neutral,
                water_reuse = EXCLUDED.water_reuse,
                status = EXCLUDED.status",
        )
        .bind(id)
        .bind(&lot.product)
        .bind(&lot.producer)
        .bind(lot.origin_region.as_str())
        .bind(lot.harvest_date)
        .bind(weight)
        .bind(lot.carbon_neutral)
        .bind(lot.water_reuse)
        .bind(lot.status.as_str())
        .execute(self.pool)
        .await?;

        tracing::debug!(lot_id = %lot.id, "Mirrored lot");
        Ok(())
    }

    /// Insert an event for a mirrored lot and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails, including when the
    /// lot is not mirrored (foreign key violation).
    pub async fn insert_event(&self, lot_id: LotId, event: &Event) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as(
            r"INSERT INTO events (lot_id, event_type, event_date, location, responsible_party, notes)
              VALUES ($1, $2, $3, $4, $5, $6)
              RETURNING id",
        )
        .bind(lot_id_to_db(lot_id)?)
        .bind(event.event_type.as_str())
        .bind(event.date)
        .bind(&event.location)
        .bind(&event.responsible_party)
        .bind(&event.notes)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(lot_id = %lot_id, event_id = row.0, "Mirrored event");
        Ok(row.0)
    }

    /// Set the status of a mirrored lot. Returns `true` if a row changed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn update_status(&self, lot_id: LotId, status: LotStatus) -> Result<bool, DbError> {
        let result = sqlx::query(r"UPDATE lots SET status = $2 WHERE id = $1")
            .bind(lot_id_to_db(lot_id)?)
            .bind(status.as_str())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List mirrored lots, optionally filtered by region and status, by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_lots(
        &self,
        origin_region: Option<&str>,
        status: Option<LotStatus>,
    ) -> Result<Vec<LotRow>, DbError> {
        let rows = sqlx::query_as::<_, LotRow>(
            r"SELECT id, product, producer, origin_region, harvest_date, weight_kg,
                     carbon_neutral, water_reuse, status
              FROM lots
              WHERE ($1::TEXT IS NULL OR origin_region = $1)
                AND ($2::TEXT IS NULL OR status = $2)
              ORDER BY id",
        )
        .bind(origin_region)
        .bind(status.map(LotStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// List the events of a mirrored lot in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_events(&self, lot_id: LotId) -> Result<Vec<EventRow>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, lot_id, event_type, event_date, location, responsible_party, notes
              FROM events
              WHERE lot_id = $1
              ORDER BY id",
        )
        .bind(lot_id_to_db(lot_id)?)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a mirrored lot and, by cascade, its events.
    ///
    /// Returns `true` if the lot existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete_lot(&self, lot_id: LotId) -> Result<bool, DbError> {
        let result = sqlx::query(r"DELETE FROM lots WHERE id = $1")
            .bind(lot_id_to_db(lot_id)?)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// A row from the `lots` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LotRow {
    /// Lot id, as assigned by the JSON store.
    pub id: i64,
    /// Product name.
    pub product: String,
    /// Producer name.
    pub producer: String,
    /// Region code.
    pub origin_region: String,
    /// Harvest date.
    pub harvest_date: NaiveDate,
    /// Weight in kilograms.
    pub weight_kg: Decimal,
    /// Carbon neutral flag.
    pub carbon_neutral: bool,
    /// Water reuse flag.
    pub water_reuse: bool,
    /// Status name.
    pub status: String,
}

/// A row from the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EventRow {
    /// Generated event id.
    pub id: i64,
    /// Owning lot.
    pub lot_id: i64,
    /// Event type name.
    pub event_type: String,
    /// Event date.
    pub event_date: NaiveDate,
    /// Where it happened.
    pub location: String,
    /// Who was responsible.
    pub responsible_party: String,
    /// Free text.
    pub notes: String,
}

fn lot_id_to_db(id: LotId) -> Result<i64, DbError> {
    i64::try_from(id.into_inner())
        .map_err(|e| DbError::Conversion(format!("lot id {id} does not fit BIGINT: {e}")))
}

fn weight_to_db(weight_kg: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(weight_kg)
        .map(|w| w.round_dp(WEIGHT_SCALE))
        .ok_or_else(|| DbError::Conversion(format!("weight {weight_kg} is not representable")))
}
