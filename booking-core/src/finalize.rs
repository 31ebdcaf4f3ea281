//! Turning a finished draft into the appointment record and saving it.

use chrono::{DateTime, Utc};

use crate::{
    AppointmentRecord, AppointmentStore, BookingDraft, BookingError, DetailField, TravelEstimate,
};

/// Builds the appointment from a completed draft.
pub fn assemble_appointment(
    draft: &BookingDraft,
    travel: Option<TravelEstimate>,
    now: DateTime<Utc>,
) -> Result<AppointmentRecord, BookingError> {
    let patient_name = draft
        .patient_name
        .clone()
        .ok_or(BookingError::MissingData("patient name"))?;
    let booking_type = draft
        .booking_type
        .ok_or(BookingError::MissingData("booking type"))?;
    let doctor = draft
        .selected_doctor
        .as_ref()
        .ok_or(BookingError::MissingData("doctor"))?;

    let details = &draft.patient_details;
    let detail = |field: DetailField| details.get(field).map(str::to_string);

    Ok(AppointmentRecord {
        id: None,
        patient_name,
        booking_type,
        symptoms: draft.symptoms.clone(),
        doctor_name: doctor.name.clone(),
        hospital_name: doctor.hospital.clone(),
        appointment_date: now,
        appointment_time: doctor.first_slot().map(str::to_string),
        needs_bed: draft.bed_selection.is_some(),
        bed_type: draft.bed_selection.as_ref().map(|bed| bed.kind.clone()),
        bed_details: draft
            .bed_selection
            .as_ref()
            .and_then(|bed| serde_json::to_string(bed).ok()),
        distance_km: travel.map(|estimate| estimate.distance_km),
        estimated_travel_time: travel.map(|estimate| estimate.minutes),
        patient_phone: detail(DetailField::PatientPhone),
        patient_gender: detail(DetailField::PatientGender),
        patient_age: detail(DetailField::PatientAge),
        patient_email: detail(DetailField::PatientEmail),
        patient_address: detail(DetailField::PatientAddress),
    })
}

/// Saves `record`; when the store refuses, the local record stands in for the
/// saved one.
pub fn persist_or_fallback<S>(store: &mut S, record: AppointmentRecord) -> AppointmentRecord
where
    S: AppointmentStore + ?Sized,
{
    match store.create(&record) {
        Ok(saved) => {
            tracing::info!(
                id = saved.id.as_deref().unwrap_or("-"),
                doctor = %saved.doctor_name,
                "appointment saved"
            );
            saved
        }
        Err(err) => {
            tracing::error!(error = %err, "error saving appointment, keeping local record");
            record
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{bed_options, BookingType, Doctor, MemoryStore, PatientDetails};

    pub(crate) fn sample_draft() -> BookingDraft {
        let mut patient_details = PatientDetails::default();
        for (field, value) in DetailField::ALL
            .into_iter()
            .zip(["9999999999", "male", "30", "a@b.com", "Addr"])
        {
            patient_details.insert(field, value);
        }

        BookingDraft {
            booking_type: Some(BookingType::Emergency),
            patient_name: Some("Asha".into()),
            symptoms: vec!["Fever".into(), "Cough".into()],
            selected_doctor: Some(Doctor {
                name: "Rahman".into(),
                hospital: Some("Square Hospital".into()),
                available_slots: vec!["10:00 AM".into(), "02:00 PM".into()],
                ..Doctor::default()
            }),
            bed_selection: bed_options().into_iter().nth(1),
            patient_details,
        }
    }

    pub(crate) fn sample_record() -> AppointmentRecord {
        assemble_appointment(&sample_draft(), None, Utc::now()).expect("complete draft")
    }

    #[test]
    fn assembles_every_collected_field() {
        let travel = TravelEstimate {
            distance_km: 4.2,
            minutes: 8,
        };
        let record =
            assemble_appointment(&sample_draft(), Some(travel), Utc::now()).expect("assemble");

        assert_eq!(record.patient_name, "Asha");
        assert_eq!(record.booking_type, BookingType::Emergency);
        assert_eq!(record.symptoms, vec!["Fever", "Cough"]);
        assert_eq!(record.doctor_name, "Rahman");
        assert_eq!(record.hospital_name.as_deref(), Some("Square Hospital"));
        assert_eq!(record.appointment_time.as_deref(), Some("10:00 AM"));
        assert!(record.needs_bed);
        assert_eq!(record.bed_type.as_deref(), Some("General Cabin"));
        assert!(record
            .bed_details
            .as_deref()
            .is_some_and(|json| json.contains("\"type\":\"General Cabin\"")));
        assert_eq!(record.distance_km, Some(4.2));
        assert_eq!(record.estimated_travel_time, Some(8));
        assert_eq!(record.patient_details(), sample_draft().patient_details);
    }

    #[test]
    fn no_bed_and_no_location_leave_fields_empty() {
        let mut draft = sample_draft();
        draft.bed_selection = None;
        let record = assemble_appointment(&draft, None, Utc::now()).expect("assemble");
        assert!(!record.needs_bed);
        assert_eq!(record.bed_type, None);
        assert_eq!(record.bed_details, None);
        assert_eq!(record.distance_km, None);
        assert_eq!(record.estimated_travel_time, None);
    }

    #[test]
    fn incomplete_draft_is_rejected() {
        let mut draft = sample_draft();
        draft.selected_doctor = None;
        assert_eq!(
            assemble_appointment(&draft, None, Utc::now()),
            Err(BookingError::MissingData("doctor"))
        );
    }

    #[test]
    fn failed_save_keeps_local_record() {
        let record = sample_record();
        let mut store = MemoryStore::failing("backend down");
        let shown = persist_or_fallback(&mut store, record.clone());
        assert_eq!(shown, record);
        assert!(store.records().is_empty());
    }

    #[test]
    fn successful_save_returns_stored_record() {
        let record = sample_record();
        let mut store = MemoryStore::new();
        let shown = persist_or_fallback(&mut store, record.clone());
        assert_eq!(shown.id.as_deref(), Some("appt-1"));
        assert_eq!(shown.patient_name, record.patient_name);
    }
}
