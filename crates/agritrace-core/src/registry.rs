//! The in-memory lot registry and its use cases.
//!
//! [`LotRegistry`] is the single owner of every [`Lot`] for the lifetime of
//! the process. It is created once by the binary and passed by reference;
//! there is no process-wide singleton. The durable store holds a snapshot
//! of it, rewritten in full after every mutation.
//!
//! # Concurrency
//!
//! The registry has no internal locking. [`LotRegistry::next_id`] followed
//! by [`LotRegistry::insert`] is a read-then-write sequence; a concurrent
//! wrapper must serialize the pair (and every save of the same file).

use agritrace_types::{Event, Lot, LotId, LotStatus};
use tracing::debug;

use crate::error::{RegistryError, ValidationError};
use crate::record::validate_lot;
use crate::validation::{
    validate_event_type, validate_local_date, validate_nonempty_text, validate_region_code,
    validate_weight,
};

/// Raw fields for a new lot, as collected from the user.
///
/// Everything is text so the same validators run no matter where the
/// input came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotInput {
    /// Product name.
    pub product: String,
    /// Producer name.
    pub producer: String,
    /// Two-letter region code, any case.
    pub origin_region: String,
    /// Harvest date in local `DD/MM/YYYY` format.
    pub harvest_date_local: String,
    /// Weight in kilograms.
    pub weight_kg: String,
    /// Carbon neutral flag; `None` means `false`.
    pub carbon_neutral: Option<bool>,
    /// Water reuse flag; `None` means `false`.
    pub water_reuse: Option<bool>,
}

/// Raw fields for a new event, as collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventInput {
    /// Event type name, any case.
    pub event_type: String,
    /// Event date in local `DD/MM/YYYY` format.
    pub date_local: String,
    /// Where the event happened.
    pub location: String,
    /// Who was responsible.
    pub responsible_party: String,
    /// Optional free text.
    pub notes: Option<String>,
}

/// Optional equality filters for [`LotRegistry::list_lots`].
///
/// Both comparisons are case-insensitive; an absent filter passes every lot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotFilter {
    /// Region code to match.
    pub origin_region: Option<String>,
    /// Status name to match (canonical or legacy).
    pub status: Option<String>,
}

impl LotFilter {
    /// Whether `lot` passes every present filter.
    pub fn matches(&self, lot: &Lot) -> bool {
        let region_ok = self
            .origin_region
            .as_deref()
            .is_none_or(|r| r.trim().to_uppercase() == lot.origin_region.as_str());
        let status_ok = self
            .status
            .as_deref()
            .is_none_or(|s| s.parse::<LotStatus>().is_ok_and(|st| st == lot.status));
        region_ok && status_ok
    }
}

/// Ordered collection of lots keyed by unique id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LotRegistry {
    /// All lots, in insertion order.
    lots: Vec<Lot>,
}

impl LotRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { lots: Vec::new() }
    }

    /// Build a registry from already-validated lots, rejecting duplicate ids.
    pub fn from_lots(lots: Vec<Lot>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.replace_all(lots)?;
        Ok(registry)
    }

    /// The id the next registered lot will receive: one past the largest
    /// existing id, or 1 when empty.
    pub fn next_id(&self) -> LotId {
        self.lots
            .iter()
            .map(|l| l.id)
            .max()
            .map_or(LotId::FIRST, LotId::next)
    }

    /// Validate raw fields and build a new lot.
    ///
    /// The lot gets the next id, status [`LotStatus::Processing`] and no
    /// events. It is *not* inserted: the caller inserts it with
    /// [`LotRegistry::insert`] once it is ready to persist.
    pub fn register_lot(&self, input: &LotInput) -> Result<Lot, ValidationError> {
        let lot = Lot {
            id: self.next_id(),
            product: validate_nonempty_text(&input.product, "product")?,
            producer: validate_nonempty_text(&input.producer, "producer")?,
            origin_region: validate_region_code(&input.origin_region)?,
            harvest_date: validate_local_date(&input.harvest_date_local)?,
            weight_kg: validate_weight(&input.weight_kg)?,
            carbon_neutral: input.carbon_neutral.unwrap_or(false),
            water_reuse: input.water_reuse.unwrap_or(false),
            status: LotStatus::Processing,
            events: Vec::new(),
        };
        validate_lot(&lot)?;
        Ok(lot)
    }

    /// Add a lot to the end of the registry.
    pub fn insert(&mut self, lot: Lot) -> Result<(), RegistryError> {
        if self.contains(lot.id) {
            return Err(RegistryError::DuplicateId(lot.id));
        }
        debug!(lot_id = %lot.id, "Lot inserted into registry");
        self.lots.push(lot);
        Ok(())
    }

    /// Remove and return the lot with `id`, if any.
    ///
    /// Used to roll back an insertion whose save failed.
    pub fn remove(&mut self, id: LotId) -> Option<Lot> {
        let index = self.lots.iter().position(|l| l.id == id)?;
        Some(self.lots.remove(index))
    }

    /// Validate raw event fields and append the event to lot `lot_id`.
    ///
    /// Returns `Ok(false)` when no lot has that id; nothing is mutated in
    /// that case. An `INSPECTION` event moves the lot to
    /// [`LotStatus::Ready`].
    pub fn register_event(
        &mut self,
        lot_id: LotId,
        input: &EventInput,
    ) -> Result<bool, ValidationError> {
        let event = Event {
            event_type: validate_event_type(&input.event_type)?,
            date: validate_local_date(&input.date_local)?,
            location: validate_nonempty_text(&input.location, "location")?,
            responsible_party: validate_nonempty_text(
                &input.responsible_party,
                "responsible_party",
            )?,
            notes: input.notes.as_deref().unwrap_or_default().trim().to_owned(),
        };

        let Some(lot) = self.lots.iter_mut().find(|l| l.id == lot_id) else {
            debug!(lot_id = %lot_id, "Event registration for unknown lot");
            return Ok(false);
        };

        let event_type = event.event_type;
        if lot.record_event(event) {
            debug!(lot_id = %lot_id, status = %lot.status, "Lot status changed");
        }
        debug!(lot_id = %lot_id, event_type = %event_type, "Event recorded");
        Ok(true)
    }

    /// Lots passing `filter`, in registry order.
    ///
    /// Returns borrowed views into the live registry, not copies.
    pub fn list_lots(&self, filter: &LotFilter) -> Vec<&Lot> {
        self.lots.iter().filter(|l| filter.matches(l)).collect()
    }

    /// Look up a lot by id.
    pub fn get(&self, id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == id)
    }

    /// Whether a lot with `id` exists.
    pub fn contains(&self, id: LotId) -> bool {
        self.get(id).is_some()
    }

    /// All lots, in registry order.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Number of lots.
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Whether the registry holds no lots.
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Replace the whole content, e.g. after reloading the data file.
    ///
    /// On a duplicate id the registry is left unchanged.
    pub fn replace_all(&mut self, lots: Vec<Lot>) -> Result<(), RegistryError> {
        let mut seen = std::collections::BTreeSet::new();
        if let Some(dup) = lots.iter().find(|l| !seen.insert(l.id)) {
            return Err(RegistryError::DuplicateId(dup.id));
        }
        self.lots = lots;
        Ok(())
    }

    /// Restore a lot to an earlier state (same id), e.g. when a save fails
    /// after an event was appended. Returns `false` if the id is unknown.
    pub fn restore(&mut self, snapshot: Lot) -> bool {
        match self.lots.iter_mut().find(|l| l.id == snapshot.id) {
            Some(slot) => {
                *slot = snapshot;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use agritrace_types::EventType;

    use super::*;
    use crate::record::validate_lot;

    fn coffee() -> LotInput {
        LotInput {
            product: "Coffee".to_owned(),
            producer: "Farm A".to_owned(),
            origin_region: "SP".to_owned(),
            harvest_date_local: "01/03/2024".to_owned(),
            weight_kg: "100".to_owned(),
            carbon_neutral: None,
            water_reuse: None,
        }
    }

    fn event(ty: &str) -> EventInput {
        EventInput {
            event_type: ty.to_owned(),
            date_local: "05/03/2024".to_owned(),
            location: "Warehouse 3".to_owned(),
            responsible_party: "Inspector".to_owned(),
            notes: Some("  ok  ".to_owned()),
        }
    }

    fn registry_with_ids(ids: &[u64]) -> LotRegistry {
        let mut registry = LotRegistry::new();
        for &id in ids {
            let mut lot = registry.register_lot(&coffee()).expect("valid input");
            lot.id = LotId(id);
            registry.insert(lot).expect("unique id");
        }
        registry
    }

    #[test]
    fn next_id_on_empty_registry_is_one() {
        assert_eq!(LotRegistry::new().next_id(), LotId(1));
    }

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(registry_with_ids(&[1, 3, 5]).next_id(), LotId(6));
        assert_eq!(registry_with_ids(&[5, 1]).next_id(), LotId(6));
    }

    #[test]
    fn register_lot_scenario() {
        let registry = LotRegistry::new();
        let lot = registry.register_lot(&coffee()).expect("valid input");
        assert_eq!(lot.id, LotId(1));
        assert_eq!(lot.status, LotStatus::Processing);
        assert!((lot.weight_kg - 100.0).abs() < f64::EPSILON);
        assert!(lot.events.is_empty());
        assert!(!lot.carbon_neutral);
        assert!(!lot.water_reuse);
        assert_eq!(lot.harvest_date.to_string(), "2024-03-01");
        // Not inserted by register_lot.
        assert!(registry.is_empty());
        assert!(validate_lot(&lot).is_ok());
    }

    #[test]
    fn register_lot_normalizes_fields() {
        let input = LotInput {
            product: "  Soy ".to_owned(),
            origin_region: " mt".to_owned(),
            water_reuse: Some(true),
            ..coffee()
        };
        let lot = LotRegistry::new().register_lot(&input).expect("valid input");
        assert_eq!(lot.product, "Soy");
        assert_eq!(lot.origin_region.as_str(), "MT");
        assert!(lot.water_reuse);
    }

    #[test]
    fn register_lot_rejects_bad_fields() {
        let registry = LotRegistry::new();
        let bad_weight = LotInput {
            weight_kg: "-5".to_owned(),
            ..coffee()
        };
        assert!(matches!(
            registry.register_lot(&bad_weight),
            Err(ValidationError::InvalidInput { .. })
        ));
        let bad_region = LotInput {
            origin_region: "ZZ".to_owned(),
            ..coffee()
        };
        assert!(registry.register_lot(&bad_region).is_err());
        let bad_date = LotInput {
            harvest_date_local: "2024-03-01".to_owned(),
            ..coffee()
        };
        assert!(registry.register_lot(&bad_date).is_err());
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut registry = registry_with_ids(&[1]);
        let mut lot = registry.register_lot(&coffee()).expect("valid input");
        lot.id = LotId(1);
        assert_eq!(registry.insert(lot), Err(RegistryError::DuplicateId(LotId(1))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn inspection_marks_lot_ready() {
        let mut registry = registry_with_ids(&[1]);
        assert_eq!(registry.register_event(LotId(1), &event("INSPECAO")), Ok(true));
        let lot = registry.get(LotId(1)).expect("lot 1");
        assert_eq!(lot.status, LotStatus::Ready);
        assert_eq!(lot.events.len(), 1);
        let recorded = lot.events.first().expect("event");
        assert_eq!(recorded.event_type, EventType::Inspection);
        assert_eq!(recorded.notes, "ok");
    }

    #[test]
    fn other_event_types_keep_status() {
        let mut registry = registry_with_ids(&[1]);
        for ty in ["harvest", "TRANSPORT", "Storage"] {
            assert_eq!(registry.register_event(LotId(1), &event(ty)), Ok(true));
        }
        let lot = registry.get(LotId(1)).expect("lot 1");
        assert_eq!(lot.status, LotStatus::Processing);
        assert_eq!(lot.events.len(), 3);
    }

    #[test]
    fn event_for_unknown_lot_is_not_found_and_mutates_nothing() {
        let mut registry = registry_with_ids(&[1]);
        let before = registry.clone();
        assert_eq!(registry.register_event(LotId(42), &event("INSPECTION")), Ok(false));
        assert_eq!(registry, before);
    }

    #[test]
    fn invalid_event_is_rejected_before_lookup() {
        let mut registry = registry_with_ids(&[1]);
        let bad = EventInput {
            location: "   ".to_owned(),
            ..event("TRANSPORT")
        };
        assert!(registry.register_event(LotId(1), &bad).is_err());
        assert!(registry.register_event(LotId(1), &event("DANCE")).is_err());
        assert_eq!(registry.get(LotId(1)).map(Lot::event_count), Some(0));
    }

    #[test]
    fn list_lots_filters_case_insensitively() {
        let mut registry = LotRegistry::new();
        for region in ["SP", "MG", "SP"] {
            let input = LotInput {
                origin_region: region.to_owned(),
                ..coffee()
            };
            let lot = registry.register_lot(&input).expect("valid input");
            registry.insert(lot).expect("unique id");
        }
        registry
            .register_event(LotId(3), &event("INSPECTION"))
            .expect("valid event");

        let all = registry.list_lots(&LotFilter::default());
        assert_eq!(all.len(), 3);

        let sp = registry.list_lots(&LotFilter {
            origin_region: Some("sp".to_owned()),
            status: None,
        });
        assert_eq!(sp.iter().map(|l| l.id).collect::<Vec<_>>(), vec![LotId(1), LotId(3)]);

        let sp_ready = registry.list_lots(&LotFilter {
            origin_region: Some("SP".to_owned()),
            status: Some("ready".to_owned()),
        });
        assert_eq!(sp_ready.len(), 1);

        let unknown_status = registry.list_lots(&LotFilter {
            origin_region: None,
            status: Some("SHIPPED".to_owned()),
        });
        assert!(unknown_status.is_empty());
    }

    #[test]
    fn replace_all_rejects_duplicates_and_keeps_content() {
        let mut registry = registry_with_ids(&[1, 2]);
        let dup = registry_with_ids(&[7, 8]).lots().to_vec();
        let mut twice = dup.clone();
        twice.extend(dup);
        assert_eq!(registry.replace_all(twice), Err(RegistryError::DuplicateId(LotId(7))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_and_restore_support_rollback() {
        let mut registry = registry_with_ids(&[1, 2]);
        let snapshot = registry.get(LotId(1)).cloned().expect("lot 1");
        registry
            .register_event(LotId(1), &event("INSPECTION"))
            .expect("valid event");
        assert!(registry.restore(snapshot.clone()));
        assert_eq!(registry.get(LotId(1)), Some(&snapshot));

        assert!(registry.remove(LotId(2)).is_some());
        assert!(registry.remove(LotId(2)).is_none());
        assert_eq!(registry.next_id(), LotId(2));
    }
}
