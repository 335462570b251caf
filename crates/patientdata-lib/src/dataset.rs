use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::patient::Patient;

/// Default filename for the patient dataset.
const DATASET_FILENAME: &str = "patients.json";

/// Environment variable overriding the dataset location.
pub const DATA_PATH_ENV: &str = "PATIENTDATA_DATA_PATH";

/// On-disk document shape: `{"patients": [...]}`.
#[derive(Debug, Deserialize)]
struct DatasetDocument {
    patients: Vec<Patient>,
}

/// Immutable, ordered set of patient records.
///
/// Constructed once at startup and shared by reference (typically behind an
/// `Arc`). There are no mutation operations.
#[derive(Debug, Clone)]
pub struct Dataset {
    patients: Vec<Patient>,
}

impl Dataset {
    /// Build a dataset from records, rejecting duplicate identifiers.
    pub fn from_patients(patients: Vec<Patient>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(patients.len());
        for patient in &patients {
            if !seen.insert(patient.id.as_str()) {
                return Err(Error::DuplicatePatientId {
                    id: patient.id.clone(),
                });
            }
        }
        Ok(Self { patients })
    }

    /// Parse a dataset document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: DatasetDocument = serde_json::from_str(json)?;
        Self::from_patients(doc.patients)
    }

    /// Load a dataset document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DatasetNotFound {
                path: path.to_path_buf(),
            });
        }

        info!(path = %path.display(), "loading patient dataset");
        let raw = fs::read_to_string(path)?;
        let doc: DatasetDocument =
            serde_json::from_str(&raw).map_err(|source| Error::DatasetParse {
                path: path.to_path_buf(),
                source,
            })?;
        let dataset = Self::from_patients(doc.patients)?;
        info!(patient_count = dataset.len(), "patient dataset loaded");
        Ok(dataset)
    }

    /// All records in load order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// Resolve the default dataset location using platform-specific project directories.
pub fn default_dataset_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("com", "patientdata", "patientdata").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(DATASET_FILENAME))
}

/// Resolve which dataset file to load.
///
/// Order (highest to lowest priority):
/// 1. explicit path (e.g. the CLI `--data` flag)
/// 2. `PATIENTDATA_DATA_PATH` environment variable
/// 3. platform data directory (`.../patientdata/patients.json`)
///
/// The returned path is guaranteed to exist.
pub fn resolve_dataset_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return existing(path.to_path_buf());
    }

    if let Some(env_path) = env::var_os(DATA_PATH_ENV) {
        debug!("using dataset path from {}", DATA_PATH_ENV);
        return existing(PathBuf::from(env_path));
    }

    existing(default_dataset_path()?)
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::DatasetNotFound { path })
    }
}
