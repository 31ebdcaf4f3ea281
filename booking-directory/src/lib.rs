//! Doctor/hospital payload normalization and JSON-file backed stores.
//!
//! The entity endpoints the chat talks to return loosely-typed records:
//! coordinates arrive as numbers or strings, slots as arrays or comma lists,
//! and lists may be wrapped in an envelope object. Everything here turns
//! those payloads into `booking_core` types.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use booking_core::{
    AppointmentRecord, AppointmentStore, Directory, DirectorySource, Doctor, Hospital, StoreError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENVELOPE_KEYS: [&str; 3] = ["items", "data", "results"];

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("payload is not valid JSON: {0}")]
    Parse(String),
    #[error("payload does not contain a record list")]
    MissingList,
}

impl From<DirectoryError> for StoreError {
    fn from(err: DirectoryError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Parse a `Doctor.list()` payload.
pub fn parse_doctors_str(payload: &str) -> Result<Vec<Doctor>, DirectoryError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| DirectoryError::Parse(err.to_string()))?;
    parse_doctors_value(&value)
}

pub fn parse_doctors_value(payload: &Value) -> Result<Vec<Doctor>, DirectoryError> {
    Ok(record_list(payload)?
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let doctor = doctor_from_value(record);
            if doctor.is_none() {
                tracing::warn!(position, "skipping doctor record without a name");
            }
            doctor
        })
        .collect())
}

/// Parse a `Hospital.list()` payload.
pub fn parse_hospitals_str(payload: &str) -> Result<Vec<Hospital>, DirectoryError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| DirectoryError::Parse(err.to_string()))?;
    parse_hospitals_value(&value)
}

pub fn parse_hospitals_value(payload: &Value) -> Result<Vec<Hospital>, DirectoryError> {
    Ok(record_list(payload)?
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let hospital = hospital_from_value(record);
            if hospital.is_none() {
                tracing::warn!(position, "skipping hospital record without a name");
            }
            hospital
        })
        .collect())
}

/// Parse `{ "doctors": [...], "hospitals": [...] }`. Either list may be absent.
pub fn parse_directory_value(payload: &Value) -> Result<Directory, DirectoryError> {
    if !payload.is_object() {
        return Err(DirectoryError::MissingList);
    }
    let doctors = match payload.get("doctors") {
        Some(list) => parse_doctors_value(list)?,
        None => Vec::new(),
    };
    let hospitals = match payload.get("hospitals") {
        Some(list) => parse_hospitals_value(list)?,
        None => Vec::new(),
    };
    Ok(Directory::new(doctors, hospitals))
}

fn record_list(payload: &Value) -> Result<&Vec<Value>, DirectoryError> {
    if let Some(list) = payload.as_array() {
        return Ok(list);
    }
    ENVELOPE_KEYS
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_array))
        .ok_or(DirectoryError::MissingList)
}

fn doctor_from_value(record: &Value) -> Option<Doctor> {
    let name = text_field(record, &["name", "full_name"])?;
    Some(Doctor {
        id: text_field(record, &["id", "_id"]),
        name,
        hospital: text_field(record, &["hospital", "hospital_name"]),
        chamber: text_field(record, &["chamber"]),
        specialization: text_field(record, &["specialization", "specialty"]),
        experience: experience_field(record),
        available_slots: slots_field(record),
        latitude: number_field(record, &["latitude", "lat"]),
        longitude: number_field(record, &["longitude", "lng", "lon"]),
    })
}

fn hospital_from_value(record: &Value) -> Option<Hospital> {
    let name = text_field(record, &["name"])?;
    Some(Hospital {
        id: text_field(record, &["id", "_id"]),
        name,
        address: text_field(record, &["address", "location"]),
        latitude: number_field(record, &["latitude", "lat"]),
        longitude: number_field(record, &["longitude", "lng", "lon"]),
    })
}

fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(key)? {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn number_field(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| match record.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|value| value.is_finite())
}

fn experience_field(record: &Value) -> Option<String> {
    match record.get("experience")? {
        Value::Number(number) => number.as_f64().map(|years| format!("{} years", format_numeric(years))),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn slots_field(record: &Value) -> Vec<String> {
    match record.get("available_slots") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|slot| !slot.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|slot| !slot.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Reads doctor and hospital payloads from two JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    doctors_path: PathBuf,
    hospitals_path: PathBuf,
}

impl JsonFileDirectory {
    pub fn new(doctors_path: impl Into<PathBuf>, hospitals_path: impl Into<PathBuf>) -> Self {
        Self {
            doctors_path: doctors_path.into(),
            hospitals_path: hospitals_path.into(),
        }
    }
}

impl DirectorySource for JsonFileDirectory {
    fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let payload = fs::read_to_string(&self.doctors_path)?;
        Ok(parse_doctors_str(&payload)?)
    }

    fn list_hospitals(&self) -> Result<Vec<Hospital>, StoreError> {
        let payload = fs::read_to_string(&self.hospitals_path)?;
        Ok(parse_hospitals_str(&payload)?)
    }
}

/// One entry of the appointments file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredAppointment {
    #[serde(flatten)]
    pub record: AppointmentRecord,
    pub created_date: DateTime<Utc>,
}

/// Appends appointments to a JSON array on disk, assigning UUID ids.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a new version is written to before it replaces `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("appointments.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Every stored appointment; a missing file reads as empty.
    pub fn load_all(&self) -> Result<Vec<StoredAppointment>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl AppointmentStore for JsonFileStore {
    fn create(&mut self, record: &AppointmentRecord) -> Result<AppointmentRecord, StoreError> {
        let mut stored = self.load_all()?;

        let mut saved = record.clone();
        saved.id = Some(uuid::Uuid::new_v4().to_string());
        stored.push(StoredAppointment {
            record: saved.clone(),
            created_date: Utc::now(),
        });

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.staging_path();
        fs::write(&staging, serde_json::to_string_pretty(&stored)?)?;
        fs::rename(&staging, &self.path)?;
        tracing::debug!(path = %self.path.display(), total = stored.len(), "appointments file updated");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_and_wrapped_lists() {
        let bare = json!([{ "name": "Rahman" }]);
        let wrapped = json!({ "data": [{ "name": "Rahman" }] });
        assert_eq!(parse_doctors_value(&bare).unwrap().len(), 1);
        assert_eq!(parse_doctors_value(&wrapped).unwrap().len(), 1);
        assert!(matches!(
            parse_doctors_value(&json!({ "doctors": 3 })),
            Err(DirectoryError::MissingList)
        ));
    }

    #[test]
    fn normalizes_loose_doctor_fields() {
        let doctors = parse_doctors_value(&json!([
            {
                "id": 7,
                "name": " Nusrat Jahan ",
                "hospital_name": "Labaid",
                "specialty": "Neurologist",
                "experience": 8,
                "available_slots": "09:00 AM, 11:30 AM,",
                "lat": "23.7386",
                "lng": 90.3830
            },
            { "specialization": "Orphan record" }
        ]))
        .unwrap();

        assert_eq!(doctors.len(), 1);
        let doctor = &doctors[0];
        assert_eq!(doctor.id.as_deref(), Some("7"));
        assert_eq!(doctor.name, "Nusrat Jahan");
        assert_eq!(doctor.hospital.as_deref(), Some("Labaid"));
        assert_eq!(doctor.specialization.as_deref(), Some("Neurologist"));
        assert_eq!(doctor.experience.as_deref(), Some("8 years"));
        assert_eq!(doctor.available_slots, vec!["09:00 AM", "11:30 AM"]);
        assert_eq!(doctor.latitude, Some(23.7386));
        assert_eq!(doctor.longitude, Some(90.383));
    }

    #[test]
    fn unparsable_coordinates_are_missing() {
        let hospitals = parse_hospitals_value(&json!([
            { "name": "Square Hospital", "latitude": "n/a", "longitude": 90.38 }
        ]))
        .unwrap();
        assert_eq!(hospitals[0].latitude, None);
        assert_eq!(hospitals[0].location(), None);
    }

    #[test]
    fn directory_payload_tolerates_missing_lists() {
        let directory = parse_directory_value(&json!({
            "doctors": [{ "name": "Rahman", "experience": "12 years" }]
        }))
        .unwrap();
        assert_eq!(directory.doctors[0].experience.as_deref(), Some("12 years"));
        assert!(directory.hospitals.is_empty());
        assert!(parse_directory_value(&json!([])).is_err());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            parse_hospitals_str("{ not json"),
            Err(DirectoryError::Parse(_))
        ));
    }
}
