use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Aggregate view of the dataset served as `patient://summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub total_patients: usize,
    /// Patient count per blood type label.
    pub blood_types: BTreeMap<String, usize>,
    /// Patient count per gender.
    pub genders: BTreeMap<String, usize>,
    /// Sum of allergy entries across all patients.
    pub total_allergies: usize,
    pub patients_with_allergies: usize,
    pub patients_without_allergies: usize,
}

impl PatientSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut blood_types = BTreeMap::new();
        let mut genders = BTreeMap::new();
        let mut total_allergies = 0;
        let mut patients_with_allergies = 0;

        for patient in dataset.patients() {
            *blood_types
                .entry(patient.blood_type.as_str().to_string())
                .or_insert(0) += 1;
            *genders.entry(patient.gender.clone()).or_insert(0) += 1;
            total_allergies += patient.allergies.len();
            if !patient.allergies.is_empty() {
                patients_with_allergies += 1;
            }
        }

        Self {
            total_patients: dataset.len(),
            blood_types,
            genders,
            total_allergies,
            patients_with_allergies,
            patients_without_allergies: dataset.len() - patients_with_allergies,
        }
    }
}
