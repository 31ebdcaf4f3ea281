use std::fs;

use booking_core::{
    bed_options, BookingConfig, BookingSession, BookingType, ConversationStep, Directory,
    MemoryStore,
};
use booking_directory::JsonFileDirectory;
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_directory() -> Directory {
    let source = JsonFileDirectory::new(fixture_path("doctors.json"), fixture_path("hospitals.json"));
    Directory::load(&source).expect("Fixture directory should load")
}

#[test]
fn fixture_directory_normalizes_records() {
    let directory = load_directory();

    assert_eq!(directory.doctors.len(), 2);
    assert_eq!(directory.hospitals.len(), 2);

    let karim = &directory.doctors[1];
    assert_eq!(karim.hospital.as_deref(), Some("Popular Diagnostic Centre"));
    assert_eq!(karim.experience.as_deref(), Some("6 years"));
    assert!(!karim.is_bookable());
    assert!(directory.doctor_location(karim).is_some());
}

#[test]
fn emergency_booking_matches_golden() {
    let config = BookingConfig {
        reply_delay_ms: 0,
        ..BookingConfig::default()
    };
    let mut session = BookingSession::new(load_directory(), MemoryStore::new(), config);

    session
        .select_booking_type(BookingType::Emergency)
        .expect("Booking type should be accepted");
    session.flush_replies();
    session
        .handle_chat_input("Asha Chowdhury")
        .expect("Name should be accepted");
    session.flush_replies();
    session
        .submit_symptoms(vec!["Chest pain".into(), "Shortness of breath".into()])
        .expect("Symptoms should be accepted");
    session.flush_replies();
    session.select_doctor(0).expect("Doctor should be bookable");
    session.flush_replies();
    session
        .select_bed(bed_options().into_iter().nth(1))
        .expect("Bed should be accepted");
    session.flush_replies();
    for value in ["9999999999", "male", "30", "a@b.com", "Addr"] {
        session.handle_chat_input(value).expect("Detail should be accepted");
        session.flush_replies();
    }

    assert_eq!(session.step(), ConversationStep::FinalCard);
    let appointment = session.appointment().expect("Appointment should be created");
    assert!(appointment.id.is_some(), "Store should assign an id");

    let mut actual = serde_json::to_value(appointment).expect("Appointment should serialize");
    normalize_dynamic_fields(&mut actual);

    let expected = fs::read_to_string(fixture_path("emergency_appointment.json"))
        .expect("Golden appointment should be readable");
    let mut expected_value: Value = serde_json::from_str(&expected).expect("Golden is not valid JSON");
    normalize_dynamic_fields(&mut expected_value);

    assert_eq!(actual, expected_value);
}

fn normalize_dynamic_fields(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        if obj.contains_key("appointment_date") {
            obj.insert(
                "appointment_date".to_string(),
                Value::String("__DYNAMIC_TIMESTAMP__".to_string()),
            );
        }
        if obj.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty()) {
            obj.insert("id".to_string(), Value::String("__STORE_ID__".to_string()));
        }
    }
}
