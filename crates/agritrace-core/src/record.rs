//! Whole-record invariant checks.
//!
//! Two entry points per record kind:
//!
//! - [`validate_lot_record`] / [`validate_event_record`] take a raw JSON
//!   value (as read from the data file) and either return the typed record
//!   or explain what is wrong with it. Structural problems (absent keys)
//!   are [`ValidationError::MissingField`]; bad values are
//!   [`ValidationError::InvalidInput`].
//! - [`validate_lot`] re-checks a typed, in-memory [`Lot`] before it is
//!   written anywhere. The types already enforce region membership, date
//!   validity and enum values; this covers the rest.

use agritrace_types::{Event, Lot};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::validation::{
    validate_canonical_date, validate_event_type, validate_region_code, validate_weight_value,
};

/// Keys every event record must carry.
pub const EVENT_FIELDS: [&str; 5] = ["type", "date", "location", "responsible_party", "notes"];

/// Keys every lot record must carry.
pub const LOT_FIELDS: [&str; 10] = [
    "id",
    "product",
    "producer",
    "origin_region",
    "harvest_date",
    "weight_kg",
    "carbon_neutral",
    "water_reuse",
    "status",
    "events",
];

/// Validate a raw event record and convert it to an [`Event`].
pub fn validate_event_record(value: &Value) -> Result<Event, ValidationError> {
    let obj = as_object(value, "event")?;
    require_fields(obj, "event", &EVENT_FIELDS)?;

    validate_event_type(text_field(obj, "event", "type")?)?;
    validate_canonical_date(text_field(obj, "event", "date")?)?;

    let event = Event::deserialize(value)
        .map_err(|e| ValidationError::invalid("event", e.to_string()))?;
    check_event(&event)?;
    Ok(event)
}

/// Validate a raw lot record (including its events) and convert it to a [`Lot`].
pub fn validate_lot_record(value: &Value) -> Result<Lot, ValidationError> {
    let obj = as_object(value, "lot")?;
    require_fields(obj, "lot", &LOT_FIELDS)?;

    validate_region_code(text_field(obj, "lot", "origin_region")?)?;
    validate_canonical_date(text_field(obj, "lot", "harvest_date")?)
        .map_err(|e| ValidationError::invalid("harvest_date", e.to_string()))?;

    let weight = field(obj, "lot", "weight_kg")?
        .as_f64()
        .ok_or_else(|| ValidationError::invalid("weight_kg", "must be a number"))?;
    validate_weight_value(weight)?;

    let events = field(obj, "lot", "events")?
        .as_array()
        .ok_or_else(|| ValidationError::invalid("events", "must be a list"))?;
    for event in events {
        validate_event_record(event)?;
    }

    let lot =
        Lot::deserialize(value).map_err(|e| ValidationError::invalid("lot", e.to_string()))?;
    validate_lot(&lot)?;
    Ok(lot)
}

/// Check the invariants of a typed lot that its field types do not enforce.
///
/// Run on every lot before every durable write.
pub fn validate_lot(lot: &Lot) -> Result<(), ValidationError> {
    if !lot.id.is_valid() {
        return Err(ValidationError::invalid("id", "must be a positive integer"));
    }
    require_text(&lot.product, "product")?;
    require_text(&lot.producer, "producer")?;
    validate_weight_value(lot.weight_kg)?;
    lot.events.iter().try_for_each(check_event)
}

fn check_event(event: &Event) -> Result<(), ValidationError> {
    require_text(&event.location, "location")?;
    require_text(&event.responsible_party, "responsible_party")
}

fn require_text(value: &str, name: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(name, "must not be empty"));
    }
    Ok(())
}

fn as_object<'a>(
    value: &'a Value,
    record: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid(record, "record must be a JSON object"))
}

fn require_fields(
    obj: &Map<String, Value>,
    record: &'static str,
    fields: &[&'static str],
) -> Result<(), ValidationError> {
    fields.iter().try_for_each(|&key| field(obj, record, key).map(|_| ()))
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    record: &'static str,
    key: &'static str,
) -> Result<&'a Value, ValidationError> {
    obj.get(key)
        .ok_or(ValidationError::MissingField { record, field: key })
}

fn text_field<'a>(
    obj: &'a Map<String, Value>,
    record: &'static str,
    key: &'static str,
) -> Result<&'a str, ValidationError> {
    field(obj, record, key)?
        .as_str()
        .ok_or_else(|| ValidationError::invalid(key, "must be text"))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use agritrace_types::{EventType, LotId, LotStatus};
    use serde_json::json;

    use super::*;

    fn lot_json() -> Value {
        json!({
            "id": 1,
            "product": "Coffee",
            "producer": "Farm A",
            "origin_region": "SP",
            "harvest_date": "2024-03-01",
            "weight_kg": 100.0,
            "carbon_neutral": false,
            "water_reuse": true,
            "status": "PROCESSING",
            "events": [{
                "type": "TRANSPORT",
                "date": "2024-03-02",
                "location": "Santos",
                "responsible_party": "Maria",
                "notes": ""
            }]
        })
    }

    fn without(mut value: Value, key: &str) -> Value {
        if let Some(obj) = value.as_object_mut() {
            obj.remove(key);
        }
        value
    }

    fn with(mut value: Value, key: &str, new: Value) -> Value {
        if let Some(obj) = value.as_object_mut() {
            obj.insert(key.to_owned(), new);
        }
        value
    }

    #[test]
    fn valid_lot_record_converts() {
        let lot = validate_lot_record(&lot_json()).expect("valid record");
        assert_eq!(lot.id, LotId(1));
        assert_eq!(lot.origin_region.as_str(), "SP");
        assert_eq!(lot.status, LotStatus::Processing);
        assert_eq!(lot.events.len(), 1);
        assert_eq!(
            lot.events.first().map(|e| e.event_type),
            Some(EventType::Transport)
        );
    }

    #[test]
    fn every_lot_field_is_required() {
        for key in LOT_FIELDS {
            let result = validate_lot_record(&without(lot_json(), key));
            assert_eq!(
                result.err(),
                Some(ValidationError::MissingField { record: "lot", field: key }),
                "missing {key}"
            );
        }
    }

    #[test]
    fn every_event_field_is_required() {
        let event = lot_json().pointer("/events/0").cloned().expect("event");
        for key in EVENT_FIELDS {
            let result = validate_event_record(&without(event.clone(), key));
            assert_eq!(
                result.err(),
                Some(ValidationError::MissingField { record: "event", field: key }),
            );
        }
    }

    #[test]
    fn invalid_region_is_rejected() {
        let result = validate_lot_record(&with(lot_json(), "origin_region", json!("XX")));
        assert!(matches!(result, Err(ValidationError::InvalidInput { .. })));
    }

    #[test]
    fn local_harvest_date_is_rejected() {
        let result = validate_lot_record(&with(lot_json(), "harvest_date", json!("01/03/2024")));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidInput { ref field, .. }) if field == "harvest_date"
        ));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let result = validate_lot_record(&with(lot_json(), "weight_kg", json!(-1.5)));
        assert!(matches!(result, Err(ValidationError::InvalidInput { .. })));
    }

    #[test]
    fn integer_weight_is_accepted() {
        let lot = validate_lot_record(&with(lot_json(), "weight_kg", json!(100)))
            .expect("integer weight");
        assert!((lot.weight_kg - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn events_must_be_a_list() {
        let result = validate_lot_record(&with(lot_json(), "events", json!({"type": "HARVEST"})));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidInput { ref field, .. }) if field == "events"
        ));
    }

    #[test]
    fn nested_event_is_validated() {
        let bad_event = json!([{
            "type": "PARTY",
            "date": "2024-03-02",
            "location": "Santos",
            "responsible_party": "Maria",
            "notes": ""
        }]);
        let result = validate_lot_record(&with(lot_json(), "events", bad_event));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidInput { ref field, .. }) if field == "type"
        ));
    }

    #[test]
    fn legacy_names_load() {
        let legacy = with(lot_json(), "status", json!("PRONTO"));
        let lot = validate_lot_record(&legacy).expect("legacy status");
        assert_eq!(lot.status, LotStatus::Ready);
    }

    #[test]
    fn wrong_value_types_are_invalid_input() {
        let result = validate_lot_record(&with(lot_json(), "carbon_neutral", json!("yes")));
        assert!(matches!(result, Err(ValidationError::InvalidInput { .. })));
        let result = validate_lot_record(&with(lot_json(), "id", json!("one")));
        assert!(matches!(result, Err(ValidationError::InvalidInput { .. })));
        let result = validate_lot_record(&json!([1, 2, 3]));
        assert!(matches!(result, Err(ValidationError::InvalidInput { .. })));
    }

    #[test]
    fn zero_id_is_rejected() {
        let result = validate_lot_record(&with(lot_json(), "id", json!(0)));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidInput { ref field, .. }) if field == "id"
        ));
    }

    #[test]
    fn typed_guard_catches_blank_text_and_bad_weight() {
        let mut lot = validate_lot_record(&lot_json()).expect("valid record");
        assert!(validate_lot(&lot).is_ok());

        lot.product = "  ".to_owned();
        assert!(validate_lot(&lot).is_err());

        lot.product = "Coffee".to_owned();
        lot.weight_kg = f64::NAN;
        assert!(validate_lot(&lot).is_err());
    }
}
