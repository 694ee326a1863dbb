//! Pure field validators.
//!
//! Every rule here is side-effect free and returns the normalized value or
//! a [`ValidationError::InvalidInput`]. The prompt loop and the registry
//! call the same functions, so there is exactly one definition of what a
//! valid product name, region, weight or date looks like.
//!
//! Dates cross the boundary in two formats: the local display format
//! `DD/MM/YYYY` typed by users, and the canonical `YYYY-MM-DD` stored on
//! disk. Conversion happens only here.

use agritrace_types::{EventType, RegionCode};
use chrono::NaiveDate;

use crate::error::ValidationError;

/// Local display format for dates (`DD/MM/YYYY`).
pub const LOCAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Canonical storage format for dates (`YYYY-MM-DD`).
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trim `raw` and reject it if nothing is left.
pub fn validate_nonempty_text(raw: &str, field: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_owned())
}

/// Trim and upper-case `raw`, then check it against the fixed region set.
pub fn validate_region_code(raw: &str) -> Result<RegionCode, ValidationError> {
    RegionCode::parse(raw).ok_or_else(|| {
        ValidationError::invalid(
            "origin_region",
            format!("{:?} is not a valid two-letter region code", raw.trim()),
        )
    })
}

/// Parse `raw` as a weight in kilograms.
///
/// Rejects text that is not a number, negative numbers, and non-finite
/// values (which the JSON data file cannot represent).
pub fn validate_weight(raw: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| ValidationError::invalid("weight_kg", format!("must be a number >= 0 ({e})")))?;
    validate_weight_value(value)
}

/// Check an already-numeric weight: finite and non-negative.
pub fn validate_weight_value(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid("weight_kg", "must be a number >= 0"));
    }
    Ok(value)
}

/// Parse a local `DD/MM/YYYY` date.
pub fn validate_local_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), LOCAL_DATE_FORMAT)
        .map_err(|e| ValidationError::invalid("date", format!("use DD/MM/YYYY ({e})")))
}

/// Parse a local `DD/MM/YYYY` date and return its canonical `YYYY-MM-DD` text.
pub fn validate_date_local_to_canonical(raw: &str) -> Result<String, ValidationError> {
    validate_local_date(raw).map(to_canonical_date)
}

/// Parse a canonical `YYYY-MM-DD` date.
pub fn validate_canonical_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), CANONICAL_DATE_FORMAT)
        .map_err(|e| ValidationError::invalid("date", format!("use ISO YYYY-MM-DD ({e})")))
}

/// Check event-type membership; accepts canonical and legacy names in any case.
pub fn validate_event_type(raw: &str) -> Result<EventType, ValidationError> {
    raw.parse().map_err(|e| {
        ValidationError::invalid(
            "type",
            format!("{e}; expected HARVEST, TRANSPORT, STORAGE or INSPECTION"),
        )
    })
}

/// Format a date for display (`DD/MM/YYYY`).
pub fn canonical_to_local_date(date: NaiveDate) -> String {
    date.format(LOCAL_DATE_FORMAT).to_string()
}

/// Format a date for storage (`YYYY-MM-DD`).
pub fn to_canonical_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Interpret a yes/no answer.
pub fn parse_yes_no(raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_lowercase().as_str() {
        "s" | "sim" | "y" | "yes" => Ok(true),
        "n" | "nao" | "não" | "no" => Ok(false),
        _ => Err(ValidationError::invalid("answer", "reply with 'y' or 'n'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid_input<T>(result: &Result<T, ValidationError>) -> bool {
        matches!(result, Err(ValidationError::InvalidInput { .. }))
    }

    #[test]
    fn nonempty_text_trims() {
        assert_eq!(
            validate_nonempty_text("  Coffee  ", "product"),
            Ok("Coffee".to_owned())
        );
    }

    #[test]
    fn nonempty_text_rejects_blank() {
        let result = validate_nonempty_text("   ", "product");
        assert!(is_invalid_input(&result));
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("product"));
    }

    #[test]
    fn region_code_normalizes_case() {
        let code = validate_region_code(" rj ");
        assert_eq!(code.as_ref().map(RegionCode::as_str).ok(), Some("RJ"));
    }

    #[test]
    fn region_code_rejects_unknown() {
        assert!(is_invalid_input(&validate_region_code("XY")));
    }

    #[test]
    fn negative_weight_is_invalid() {
        assert!(is_invalid_input(&validate_weight("-5")));
    }

    #[test]
    fn fractional_weight_is_accepted() {
        let weight = validate_weight("12.5").ok();
        assert!(weight.is_some_and(|w| (w - 12.5).abs() < f64::EPSILON));
    }

    #[test]
    fn zero_weight_is_accepted() {
        assert!(validate_weight("0").is_ok());
    }

    #[test]
    fn garbage_and_non_finite_weights_are_invalid() {
        assert!(is_invalid_input(&validate_weight("heavy")));
        assert!(is_invalid_input(&validate_weight("")));
        assert!(is_invalid_input(&validate_weight("NaN")));
        assert!(is_invalid_input(&validate_weight("inf")));
    }

    #[test]
    fn local_date_converts_to_canonical() {
        assert_eq!(
            validate_date_local_to_canonical("01/03/2024"),
            Ok("2024-03-01".to_owned())
        );
    }

    #[test]
    fn malformed_local_dates_are_invalid() {
        assert!(is_invalid_input(&validate_local_date("2024-03-01")));
        assert!(is_invalid_input(&validate_local_date("31/02/2024")));
        assert!(is_invalid_input(&validate_local_date("")));
    }

    #[test]
    fn canonical_round_trips_to_local() {
        let date = validate_canonical_date("2024-12-25").ok();
        assert_eq!(date.map(canonical_to_local_date), Some("25/12/2024".to_owned()));
        assert_eq!(date.map(to_canonical_date), Some("2024-12-25".to_owned()));
    }

    #[test]
    fn canonical_date_rejects_local_format() {
        assert!(is_invalid_input(&validate_canonical_date("25/12/2024")));
    }

    #[test]
    fn event_type_membership() {
        assert_eq!(validate_event_type("inspecao"), Ok(EventType::Inspection));
        assert!(is_invalid_input(&validate_event_type("PACKING")));
    }

    #[test]
    fn yes_no_answers() {
        assert_eq!(parse_yes_no("S"), Ok(true));
        assert_eq!(parse_yes_no("yes"), Ok(true));
        assert_eq!(parse_yes_no("não"), Ok(false));
        assert!(is_invalid_input(&parse_yes_no("maybe")));
    }
}
