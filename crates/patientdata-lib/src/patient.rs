//! Patient record types.
//!
//! Records are serialized with camelCase keys so the JSON produced by the
//! tool server matches the dataset file and the REST payloads.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the eight canonical ABO/Rh blood types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    /// Canonical label, e.g. `"AB-"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    /// Exact, case-sensitive match against the canonical labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|bt| bt.as_str() == s)
            .ok_or_else(|| format!("unknown blood type '{}'", s))
    }
}

/// Postal address of a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zip_code
        )
    }
}

/// A single immutable patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Stable unique identifier (e.g. `P001`).
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO-8601 calendar date.
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: BloodType,
    pub email: String,
    pub phone: String,
    pub address: Address,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<String>,
}

impl Patient {
    /// Text value of a field addressed by its JSON key.
    ///
    /// Unknown keys and absent optional values yield an empty string. List
    /// fields are joined with `,` and the address renders as a single line.
    pub fn field_text(&self, field: &str) -> Cow<'_, str> {
        match field {
            "id" => Cow::Borrowed(&self.id),
            "firstName" => Cow::Borrowed(&self.first_name),
            "lastName" => Cow::Borrowed(&self.last_name),
            "dateOfBirth" => Cow::Borrowed(&self.date_of_birth),
            "gender" => Cow::Borrowed(&self.gender),
            "bloodType" => Cow::Borrowed(self.blood_type.as_str()),
            "email" => Cow::Borrowed(&self.email),
            "phone" => Cow::Borrowed(&self.phone),
            "lastVisit" => Cow::Borrowed(self.last_visit.as_deref().unwrap_or("")),
            "allergies" => Cow::Owned(self.allergies.join(",")),
            "medicalHistory" => Cow::Owned(self.medical_history.join(",")),
            "address" => Cow::Owned(self.address.to_string()),
            _ => Cow::Borrowed(""),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
