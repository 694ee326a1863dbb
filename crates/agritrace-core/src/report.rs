//! Sustainability KPIs computed from the registry.
//!
//! All rounding goes through [`Decimal`] so that `12.345` rounds to `12.35`
//! instead of whatever the nearest binary float happens to produce.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use agritrace_types::{Lot, RegionCode};
use chrono::{Local, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Days without activity after which a lot counts as stale.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 7;

/// Summary indicators over a set of lots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kpis {
    /// Number of lots.
    pub total: usize,
    /// Share of lots with water reuse, in percent, 2 decimals.
    pub water_reuse_pct: f64,
    /// Share of carbon-neutral lots, in percent, 2 decimals.
    pub carbon_neutral_pct: f64,
    /// Sum of all weights in kilograms, 2 decimals.
    pub total_weight_kg: f64,
    /// Lot count per origin region, sorted by code.
    pub by_region: BTreeMap<RegionCode, usize>,
    /// Lots whose last activity is older than the threshold.
    pub stale_lots: usize,
}

/// Compute KPIs as of today with the default staleness threshold.
pub fn compute_kpis(lots: &[Lot]) -> Kpis {
    compute_kpis_at(lots, Local::now().date_naive(), DEFAULT_STALE_AFTER_DAYS)
}

/// Compute KPIs as of `today`.
///
/// A lot is stale when its last activity (its most recently appended
/// event, or its harvest date when it has none) lies more than
/// `stale_after_days` days before `today`. Empty input yields
/// [`Kpis::default`].
pub fn compute_kpis_at(lots: &[Lot], today: NaiveDate, stale_after_days: i64) -> Kpis {
    if lots.is_empty() {
        return Kpis::default();
    }

    let total = lots.len();
    let water_reuse = lots.iter().filter(|l| l.water_reuse).count();
    let carbon_neutral = lots.iter().filter(|l| l.carbon_neutral).count();

    let mut by_region: BTreeMap<RegionCode, usize> = BTreeMap::new();
    for lot in lots {
        let count = by_region.entry(lot.origin_region.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }

    let stale_lots = lots
        .iter()
        .filter(|l| {
            today
                .signed_duration_since(l.last_activity_date())
                .num_days()
                > stale_after_days
        })
        .count();

    Kpis {
        total,
        water_reuse_pct: percentage(water_reuse, total),
        carbon_neutral_pct: percentage(carbon_neutral, total),
        total_weight_kg: total_weight(lots),
        by_region,
        stale_lots,
    }
}

/// Render KPIs as fixed-layout text.
pub fn format_report(kpis: &Kpis) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "=== Sustainability report ===");
    let _ = writeln!(out, "Total lots:        {}", kpis.total);
    let _ = writeln!(out, "Water reuse:       {:.2}%", kpis.water_reuse_pct);
    let _ = writeln!(out, "Carbon neutral:    {:.2}%", kpis.carbon_neutral_pct);
    let _ = writeln!(out, "Total weight:      {:.2} kg", kpis.total_weight_kg);
    let _ = writeln!(out, "Stale lots:        {}", kpis.stale_lots);
    let _ = writeln!(out, "Lots by region:");
    if kpis.by_region.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (region, count) in &kpis.by_region {
        let _ = writeln!(out, "  {region}: {count}");
    }
    out
}

fn round2(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    Decimal::from(part)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(total)))
        .map_or(0.0, round2)
}

/// Sum weights exactly in decimal; falls back to float summation when a
/// weight is outside the decimal range.
fn total_weight(lots: &[Lot]) -> f64 {
    let exact = lots.iter().try_fold(Decimal::ZERO, |acc, lot| {
        Decimal::from_f64(lot.weight_kg).and_then(|w| acc.checked_add(w))
    });
    exact.map_or_else(
        || {
            let sum: f64 = lots.iter().map(|l| l.weight_kg).sum();
            (sum * 100.0).round() / 100.0
        },
        round2,
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::float_cmp)]
mod tests {
    use agritrace_types::{Event, EventType, LotId, LotStatus};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
    }

    fn lot(id: u64, region: &str, weight: f64, water: bool, carbon: bool) -> Lot {
        Lot {
            id: LotId(id),
            product: "Coffee".to_owned(),
            producer: "Farm A".to_owned(),
            origin_region: RegionCode::parse(region).expect("valid region"),
            harvest_date: date(2024, 3, 1),
            weight_kg: weight,
            carbon_neutral: carbon,
            water_reuse: water,
            status: LotStatus::Processing,
            events: Vec::new(),
        }
    }

    fn with_event(mut lot: Lot, on: NaiveDate) -> Lot {
        lot.record_event(Event {
            event_type: EventType::Storage,
            date: on,
            location: "Silo".to_owned(),
            responsible_party: "Ana".to_owned(),
            notes: String::new(),
        });
        lot
    }

    #[test]
    fn empty_input_is_all_zero() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis, Kpis::default());
        assert_eq!(kpis.total, 0);
        assert_eq!(kpis.water_reuse_pct, 0.0);
        assert_eq!(kpis.carbon_neutral_pct, 0.0);
        assert_eq!(kpis.total_weight_kg, 0.0);
        assert!(kpis.by_region.is_empty());
        assert_eq!(kpis.stale_lots, 0);
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let lots = [
            lot(1, "SP", 10.0, true, false),
            lot(2, "SP", 10.0, false, true),
            lot(3, "MG", 10.0, false, false),
        ];
        let kpis = compute_kpis_at(&lots, date(2024, 3, 2), DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(kpis.total, 3);
        assert_eq!(kpis.water_reuse_pct, 33.33);
        assert_eq!(kpis.carbon_neutral_pct, 33.33);
    }

    #[test]
    fn two_thirds_rounds_up() {
        let lots = [
            lot(1, "SP", 1.0, true, true),
            lot(2, "SP", 1.0, true, true),
            lot(3, "SP", 1.0, false, false),
        ];
        let kpis = compute_kpis_at(&lots, date(2024, 3, 2), DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(kpis.water_reuse_pct, 66.67);
    }

    #[test]
    fn total_weight_is_rounded_sum() {
        let lots = [lot(1, "SP", 0.105, false, false), lot(2, "RJ", 0.2, false, false)];
        let kpis = compute_kpis_at(&lots, date(2024, 3, 2), DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(kpis.total_weight_kg, 0.31);
    }

    #[test]
    fn regions_are_counted_and_sorted() {
        let lots = [
            lot(1, "SP", 1.0, false, false),
            lot(2, "BA", 1.0, false, false),
            lot(3, "SP", 1.0, false, false),
        ];
        let kpis = compute_kpis_at(&lots, date(2024, 3, 2), DEFAULT_STALE_AFTER_DAYS);
        let regions: Vec<(&str, usize)> = kpis
            .by_region
            .iter()
            .map(|(r, c)| (r.as_str(), *c))
            .collect();
        assert_eq!(regions, vec![("BA", 1), ("SP", 2)]);
    }

    #[test]
    fn staleness_uses_last_event_or_harvest_date() {
        let today = date(2024, 3, 20);
        let lots = [
            // Harvest 2024-03-01, no events: 19 days old.
            lot(1, "SP", 1.0, false, false),
            // Last event 2024-03-15: 5 days old.
            with_event(lot(2, "SP", 1.0, false, false), date(2024, 3, 15)),
            // Exactly 7 days old is not stale.
            with_event(lot(3, "SP", 1.0, false, false), date(2024, 3, 13)),
            // 8 days old.
            with_event(lot(4, "SP", 1.0, false, false), date(2024, 3, 12)),
            // Future date.
            with_event(lot(5, "SP", 1.0, false, false), date(2024, 4, 1)),
        ];
        let kpis = compute_kpis_at(&lots, today, DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(kpis.stale_lots, 2);
    }

    #[test]
    fn last_appended_event_wins_over_latest_date() {
        let stale_by_order = with_event(
            with_event(lot(1, "SP", 1.0, false, false), date(2024, 3, 19)),
            date(2024, 3, 2),
        );
        let kpis = compute_kpis_at(&[stale_by_order], date(2024, 3, 20), DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(kpis.stale_lots, 1);
    }

    #[test]
    fn threshold_is_configurable() {
        let lots = [lot(1, "SP", 1.0, false, false)];
        let today = date(2024, 3, 20);
        assert_eq!(compute_kpis_at(&lots, today, 30).stale_lots, 0);
        assert_eq!(compute_kpis_at(&lots, today, 1).stale_lots, 1);
    }

    #[test]
    fn report_layout() {
        let lots = [lot(1, "SP", 100.0, true, false), lot(2, "MG", 50.5, false, true)];
        let report = format_report(&compute_kpis_at(&lots, date(2024, 3, 2), 7));
        assert!(report.starts_with("=== Sustainability report ==="));
        assert!(report.contains("Total lots:        2"));
        assert!(report.contains("Water reuse:       50.00%"));
        assert!(report.contains("Total weight:      150.50 kg"));
        let mg = report.find("  MG: 1").expect("MG line");
        let sp = report.find("  SP: 1").expect("SP line");
        assert!(mg < sp);
    }

    #[test]
    fn empty_report_renders() {
        let report = format_report(&Kpis::default());
        assert!(report.contains("Total lots:        0"));
        assert!(report.contains("(none)"));
    }
}
