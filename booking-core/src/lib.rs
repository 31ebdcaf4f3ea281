//! Conversation core for the Doctigo booking assistant.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod catalog;
mod finalize;
mod geo;
mod session;
mod store;

pub use catalog::{bed_options, BedOption, SymptomPicker, COMMON_SYMPTOMS};
pub use finalize::{assemble_appointment, persist_or_fallback};
pub use geo::{
    distance_km, haversine_km, travel_minutes, GeoPoint, TravelEstimate, EARTH_RADIUS_KM,
    MINUTES_PER_KM,
};
pub use session::{BookingSession, DoctorCard, PendingReply, ReplyEffect};
pub use store::{AppointmentStore, Directory, DirectorySource, MemoryStore, StoreError};

/// Tunables for a booking conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookingConfig {
    /// Simulated "typing" delay before each assistant reply, in milliseconds.
    pub reply_delay_ms: u64,
    /// Number of slots shown on a doctor card before collapsing into "+N more".
    pub visible_slots: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            visible_slots: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Normal,
    Emergency,
}

impl BookingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingType::Normal => "normal",
            BookingType::Emergency => "emergency",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "normal" => Ok(BookingType::Normal),
            "emergency" => Ok(BookingType::Emergency),
            other => Err(BookingError::UnknownBookingType(other.to_string())),
        }
    }
}

/// The fixed, strictly forward sequence of conversation steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    Initial,
    AskName,
    ConfirmBookingType,
    AskSymptoms,
    ShowDoctors,
    AskBed,
    CollectDetails,
    FinalCard,
}

impl ConversationStep {
    pub const ALL: [ConversationStep; 8] = [
        ConversationStep::Initial,
        ConversationStep::AskName,
        ConversationStep::ConfirmBookingType,
        ConversationStep::AskSymptoms,
        ConversationStep::ShowDoctors,
        ConversationStep::AskBed,
        ConversationStep::CollectDetails,
        ConversationStep::FinalCard,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The step right after this one; `FinalCard` is terminal.
    pub fn next(self) -> Option<ConversationStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == ConversationStep::FinalCard
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStep::Initial => "initial",
            ConversationStep::AskName => "ask_name",
            ConversationStep::ConfirmBookingType => "confirm_booking_type",
            ConversationStep::AskSymptoms => "ask_symptoms",
            ConversationStep::ShowDoctors => "show_doctors",
            ConversationStep::AskBed => "ask_bed",
            ConversationStep::CollectDetails => "collect_details",
            ConversationStep::FinalCard => "final_card",
        }
    }

    /// Whether the free-text chat box is shown at this step.
    pub fn shows_chat_input(self) -> bool {
        matches!(
            self,
            ConversationStep::AskName
                | ConversationStep::ConfirmBookingType
                | ConversationStep::AskSymptoms
                | ConversationStep::CollectDetails
        )
    }
}

impl fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chat bubble. Messages are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub is_from_assistant: bool,
    /// Local wall-clock time, `HH:MM`.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Doctor {
    pub id: Option<String>,
    pub name: String,
    pub hospital: Option<String>,
    pub chamber: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<String>,
    pub available_slots: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Doctor {
    pub fn is_bookable(&self) -> bool {
        !self.available_slots.is_empty()
    }

    pub fn first_slot(&self) -> Option<&str> {
        self.available_slots.first().map(String::as_str)
    }

    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Hospital {
    pub id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Hospital {
    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// HTML-ish input hint for a detail field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Tel,
    Text,
    Number,
    Email,
}

/// Patient detail fields, collected one by one in declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    PatientPhone,
    PatientGender,
    PatientAge,
    PatientEmail,
    PatientAddress,
}

impl DetailField {
    pub const ALL: [DetailField; 5] = [
        DetailField::PatientPhone,
        DetailField::PatientGender,
        DetailField::PatientAge,
        DetailField::PatientEmail,
        DetailField::PatientAddress,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DetailField::PatientPhone => "patient_phone",
            DetailField::PatientGender => "patient_gender",
            DetailField::PatientAge => "patient_age",
            DetailField::PatientEmail => "patient_email",
            DetailField::PatientAddress => "patient_address",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailField::PatientPhone => "phone number",
            DetailField::PatientGender => "gender (male/female/other)",
            DetailField::PatientAge => "age",
            DetailField::PatientEmail => "email address",
            DetailField::PatientAddress => "address",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            DetailField::PatientPhone => InputKind::Tel,
            DetailField::PatientAge => InputKind::Number,
            DetailField::PatientEmail => InputKind::Email,
            DetailField::PatientGender | DetailField::PatientAddress => InputKind::Text,
        }
    }
}

/// Detail values keyed by field; iteration follows [`DetailField::ALL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct PatientDetails(BTreeMap<DetailField, String>);

impl PatientDetails {
    pub fn insert(&mut self, field: DetailField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn get(&self, field: DetailField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DetailField, &str)> {
        self.0.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        DetailField::ALL.iter().all(|field| self.0.contains_key(field))
    }
}

/// Everything collected so far, before it becomes an [`AppointmentRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BookingDraft {
    pub booking_type: Option<BookingType>,
    pub patient_name: Option<String>,
    pub symptoms: Vec<String>,
    pub selected_doctor: Option<Doctor>,
    pub bed_selection: Option<BedOption>,
    pub patient_details: PatientDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patient_name: String,
    pub booking_type: BookingType,
    pub symptoms: Vec<String>,
    pub doctor_name: String,
    pub hospital_name: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub appointment_time: Option<String>,
    pub needs_bed: bool,
    pub bed_type: Option<String>,
    pub bed_details: Option<String>,
    pub distance_km: Option<f64>,
    pub estimated_travel_time: Option<u32>,
    pub patient_phone: Option<String>,
    pub patient_gender: Option<String>,
    pub patient_age: Option<String>,
    pub patient_email: Option<String>,
    pub patient_address: Option<String>,
}

impl AppointmentRecord {
    pub fn detail(&self, field: DetailField) -> Option<&str> {
        let value = match field {
            DetailField::PatientPhone => &self.patient_phone,
            DetailField::PatientGender => &self.patient_gender,
            DetailField::PatientAge => &self.patient_age,
            DetailField::PatientEmail => &self.patient_email,
            DetailField::PatientAddress => &self.patient_address,
        };
        value.as_deref()
    }

    pub fn patient_details(&self) -> PatientDetails {
        let mut details = PatientDetails::default();
        for field in DetailField::ALL {
            if let Some(value) = self.detail(field) {
                details.insert(field, value);
            }
        }
        details
    }
}

/// Errors raised when an action does not fit the conversation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BookingError {
    #[error("action expects step {expected}, conversation is at {actual}")]
    StepMismatch {
        expected: ConversationStep,
        actual: ConversationStep,
    },
    #[error("assistant is still typing")]
    ReplyPending,
    #[error("message is empty")]
    EmptyInput,
    #[error("input is not expected at step {0}")]
    UnexpectedInput(ConversationStep),
    #[error("no doctor at position {0}")]
    UnknownDoctor(usize),
    #[error("Dr. {0} has no available slots")]
    DoctorUnavailable(String),
    #[error("unknown booking type: {0}")]
    UnknownBookingType(String),
    #[error("draft is missing {0}")]
    MissingData(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_advance_in_declared_order() {
        let mut step = ConversationStep::Initial;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            assert!(next > step);
            visited.push(next);
            step = next;
        }
        assert_eq!(visited, ConversationStep::ALL.to_vec());
        assert!(step.is_terminal());
    }

    #[test]
    fn booking_type_parses_case_insensitively() {
        assert_eq!("Emergency".parse::<BookingType>(), Ok(BookingType::Emergency));
        assert_eq!(" normal ".parse::<BookingType>(), Ok(BookingType::Normal));
        assert!("urgent".parse::<BookingType>().is_err());
    }

    #[test]
    fn patient_details_iterate_in_field_order() {
        let mut details = PatientDetails::default();
        details.insert(DetailField::PatientAddress, "Addr");
        details.insert(DetailField::PatientPhone, "9999999999");
        details.insert(DetailField::PatientAge, "30");

        let keys: Vec<&str> = details.iter().map(|(field, _)| field.key()).collect();
        assert_eq!(keys, vec!["patient_phone", "patient_age", "patient_address"]);
        assert!(!details.is_complete());
    }

    #[test]
    fn patient_details_serialize_with_field_keys() {
        let mut details = PatientDetails::default();
        details.insert(DetailField::PatientEmail, "a@b.com");
        let value = serde_json::to_value(&details).expect("serialize details");
        assert_eq!(value, serde_json::json!({ "patient_email": "a@b.com" }));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: BookingConfig =
            serde_json::from_str(r#"{ "reply_delay_ms": 10 }"#).expect("parse config");
        assert_eq!(config.reply_delay_ms, 10);
        assert_eq!(config.visible_slots, 3);
    }
}
