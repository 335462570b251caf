//! Read-only query operations over a [`Dataset`].
//!
//! Every query is a single pass over the records in load order, so results
//! keep the dataset's ordering and identical calls give identical output.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::patient::Patient;

/// Fields matched by [`search`] when no explicit field is requested.
pub const DEFAULT_SEARCH_FIELDS: [&str; 4] = ["id", "firstName", "lastName", "email"];

/// Every record in load order.
pub fn all(dataset: &Dataset) -> &[Patient] {
    dataset.patients()
}

/// Look up a record by identifier (exact match).
pub fn find_by_id<'a>(dataset: &'a Dataset, id: &str) -> Result<&'a Patient> {
    dataset
        .patients()
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::PatientNotFound { id: id.to_string() })
}

/// Case-insensitive substring search.
///
/// With `field`, only that field is matched (unknown fields read as the empty
/// string). An empty or absent `field` matches id, first name, last name and
/// email.
pub fn search<'a>(dataset: &'a Dataset, query: &str, field: Option<&str>) -> Vec<&'a Patient> {
    let needle = query.to_lowercase();
    let field = field.filter(|f| !f.is_empty());

    dataset
        .patients()
        .iter()
        .filter(|p| match field {
            Some(f) => contains_folded(&p.field_text(f), &needle),
            None => DEFAULT_SEARCH_FIELDS
                .iter()
                .any(|f| contains_folded(&p.field_text(f), &needle)),
        })
        .collect()
}

/// Exact, case-sensitive match on the canonical blood type label.
pub fn by_blood_type<'a>(dataset: &'a Dataset, blood_type: &str) -> Vec<&'a Patient> {
    dataset
        .patients()
        .iter()
        .filter(|p| p.blood_type.as_str() == blood_type)
        .collect()
}

/// Case-insensitive substring match against any allergy entry.
pub fn by_allergy<'a>(dataset: &'a Dataset, allergy: &str) -> Vec<&'a Patient> {
    let needle = allergy.to_lowercase();
    dataset
        .patients()
        .iter()
        .filter(|p| p.allergies.iter().any(|a| contains_folded(a, &needle)))
        .collect()
}

fn contains_folded(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
