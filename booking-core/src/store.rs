//! Seams to the backing store: doctor/hospital listing and appointment creation.

use crate::{AppointmentRecord, Doctor, Hospital};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store I/O failed: {0}")]
    Io(String),
    #[error("store payload invalid: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// `Doctor.list()` / `Hospital.list()`.
pub trait DirectorySource {
    fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;
    fn list_hospitals(&self) -> Result<Vec<Hospital>, StoreError>;
}

/// `Appointment.create(data)`. Returns the record as persisted, which may
/// carry store-assigned fields such as `id`.
pub trait AppointmentStore {
    fn create(&mut self, record: &AppointmentRecord) -> Result<AppointmentRecord, StoreError>;
}

impl<S: AppointmentStore + ?Sized> AppointmentStore for Box<S> {
    fn create(&mut self, record: &AppointmentRecord) -> Result<AppointmentRecord, StoreError> {
        (**self).create(record)
    }
}

/// Doctors and hospitals loaded once at session start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    pub doctors: Vec<Doctor>,
    pub hospitals: Vec<Hospital>,
}

impl Directory {
    pub fn new(doctors: Vec<Doctor>, hospitals: Vec<Hospital>) -> Self {
        Self { doctors, hospitals }
    }

    pub fn load(source: &impl DirectorySource) -> Result<Self, StoreError> {
        Ok(Self {
            doctors: source.list_doctors()?,
            hospitals: source.list_hospitals()?,
        })
    }

    pub fn hospital_named(&self, name: &str) -> Option<&Hospital> {
        self.hospitals.iter().find(|hospital| hospital.name == name)
    }

    /// Where the doctor sees patients: the matching hospital, else the
    /// doctor's own coordinates.
    pub fn doctor_location(&self, doctor: &Doctor) -> Option<crate::GeoPoint> {
        doctor
            .hospital
            .as_deref()
            .and_then(|name| self.hospital_named(name))
            .and_then(|hospital| hospital.location())
            .or_else(|| doctor.location())
    }
}

/// Keeps appointments in memory, assigning sequential ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<AppointmentRecord>,
    fail_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `create` call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            fail_with: Some(reason.into()),
        }
    }

    pub fn records(&self) -> &[AppointmentRecord] {
        &self.records
    }
}

impl AppointmentStore for MemoryStore {
    fn create(&mut self, record: &AppointmentRecord) -> Result<AppointmentRecord, StoreError> {
        if let Some(reason) = &self.fail_with {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let mut saved = record.clone();
        saved.id = Some(format!("appt-{}", self.records.len() + 1));
        self.records.push(saved.clone());
        Ok(saved)
    }
}
