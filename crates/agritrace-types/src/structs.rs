//! Core entity records: [`Lot`] and [`Event`].
//!
//! The serialized field names are the durable file contract: exactly ten
//! fields per lot and five per event, dates in canonical `YYYY-MM-DD`,
//! booleans as native JSON booleans.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{EventType, LotStatus};
use crate::ids::LotId;
use crate::region::RegionCode;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An immutable custody or handling record attached to a lot.
///
/// Events are only created by registering them against an existing lot and
/// are never edited afterwards. A lot keeps them in insertion order, which
/// is not necessarily date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// When it happened.
    pub date: NaiveDate,
    /// Where it happened.
    pub location: String,
    /// Who was responsible.
    pub responsible_party: String,
    /// Free text, possibly empty.
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Lot
// ---------------------------------------------------------------------------

/// A tracked batch of an agricultural product.
///
/// Created by the registry with status [`LotStatus::Processing`] and no
/// events; afterwards only [`Lot::record_event`] mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// Unique, positive, monotonically assigned identifier.
    pub id: LotId,
    /// Product name (e.g. `"Coffee"`).
    pub product: String,
    /// Producer name.
    pub producer: String,
    /// Region the product comes from.
    pub origin_region: RegionCode,
    /// Harvest date.
    pub harvest_date: NaiveDate,
    /// Weight in kilograms, finite and non-negative.
    pub weight_kg: f64,
    /// Whether the lot was produced carbon neutral.
    pub carbon_neutral: bool,
    /// Whether the lot was produced with reused water.
    pub water_reuse: bool,
    /// Processing status.
    pub status: LotStatus,
    /// Event history, append-only, in insertion order.
    pub events: Vec<Event>,
}

impl Lot {
    /// Append an event and apply the status transition it triggers.
    ///
    /// Returns `true` when the status changed.
    pub fn record_event(&mut self, event: Event) -> bool {
        let before = self.status;
        self.status = before.after(event.event_type);
        self.events.push(event);
        self.status != before
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Date of the last recorded event, or the harvest date when there are none.
    pub fn last_activity_date(&self) -> NaiveDate {
        self.events.last().map_or(self.harvest_date, |e| e.date)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
    }

    fn sample_lot() -> Lot {
        Lot {
            id: LotId(1),
            product: "Coffee".to_owned(),
            producer: "Farm A".to_owned(),
            origin_region: RegionCode::parse("SP").expect("SP is a valid region"),
            harvest_date: date(2024, 3, 1),
            weight_kg: 100.0,
            carbon_neutral: false,
            water_reuse: true,
            status: LotStatus::Processing,
            events: Vec::new(),
        }
    }

    fn event(ty: EventType, d: NaiveDate) -> Event {
        Event {
            event_type: ty,
            date: d,
            location: "Santos".to_owned(),
            responsible_party: "Maria".to_owned(),
            notes: String::new(),
        }
    }

    #[test]
    fn serialized_shape_uses_contract_field_names() {
        let mut lot = sample_lot();
        lot.record_event(event(EventType::Transport, date(2024, 3, 2)));
        let value = serde_json::to_value(&lot).expect("lot serializes");
        let obj = value.as_object().expect("lot is a JSON object");
        assert_eq!(obj.len(), 10);
        assert_eq!(obj.get("harvest_date"), Some(&serde_json::json!("2024-03-01")));
        assert_eq!(obj.get("origin_region"), Some(&serde_json::json!("SP")));
        assert_eq!(obj.get("status"), Some(&serde_json::json!("PROCESSING")));
        let first_event = value.pointer("/events/0").expect("one event");
        assert_eq!(first_event.get("type"), Some(&serde_json::json!("TRANSPORT")));
        assert_eq!(first_event.as_object().map(serde_json::Map::len), Some(5));
    }

    #[test]
    fn inspection_event_marks_ready() {
        let mut lot = sample_lot();
        assert!(!lot.record_event(event(EventType::Storage, date(2024, 3, 3))));
        assert_eq!(lot.status, LotStatus::Processing);
        assert!(lot.record_event(event(EventType::Inspection, date(2024, 3, 4))));
        assert_eq!(lot.status, LotStatus::Ready);
        assert_eq!(lot.event_count(), 2);
    }

    #[test]
    fn last_activity_falls_back_to_harvest() {
        let mut lot = sample_lot();
        assert_eq!(lot.last_activity_date(), date(2024, 3, 1));
        lot.record_event(event(EventType::Transport, date(2024, 4, 1)));
        lot.record_event(event(EventType::Storage, date(2024, 3, 15)));
        // Insertion order, not date order.
        assert_eq!(lot.last_activity_date(), date(2024, 3, 15));
    }
}
