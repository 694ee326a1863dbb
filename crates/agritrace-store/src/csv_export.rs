//! Flat CSV export of the lot collection.
//!
//! One row per lot, semicolon-delimited, UTF-8. Events are summarized as a
//! count; the JSON file remains the full record.

use std::path::Path;

use agritrace_core::validation::to_canonical_date;
use agritrace_types::Lot;
use tracing::info;

use crate::error::StoreError;

/// Column names, in order.
pub const CSV_HEADER: [&str; 10] = [
    "id",
    "product",
    "producer",
    "origin_region",
    "harvest_date",
    "weight_kg",
    "carbon_neutral",
    "water_reuse",
    "status",
    "event_count",
];

/// Write `lots` to `path` as CSV, replacing any existing file.
///
/// Returns the number of data rows written.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the parent directory cannot be created and
/// [`StoreError::Csv`] if writing fails.
pub fn export_csv(lots: &[Lot], path: &Path) -> Result<usize, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)?;

    writer.write_record(CSV_HEADER)?;
    for lot in lots {
        writer.write_record([
            lot.id.to_string(),
            lot.product.clone(),
            lot.producer.clone(),
            lot.origin_region.to_string(),
            to_canonical_date(lot.harvest_date),
            lot.weight_kg.to_string(),
            flag(lot.carbon_neutral).to_owned(),
            flag(lot.water_reuse).to_owned(),
            lot.status.as_str().to_owned(),
            lot.event_count().to_string(),
        ])?;
    }
    writer.flush().map_err(StoreError::io(path))?;

    info!(path = %path.display(), rows = lots.len(), "CSV export written");
    Ok(lots.len())
}

const fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
