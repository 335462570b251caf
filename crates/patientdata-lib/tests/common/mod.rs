use std::path::PathBuf;

use patientdata_lib::Dataset;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_dataset() -> Dataset {
    Dataset::load(fixtures_dir().join("patients.json")).expect("load fixture patients.json")
}
