//! Terminal rendition of the booking chat.

use std::io::{BufRead, Write};
use std::thread;

use anyhow::bail;
use booking_core::{
    bed_options, AppointmentRecord, AppointmentStore, BookingSession, BookingType,
    ConversationStep, DetailField, Message, SymptomPicker, COMMON_SYMPTOMS,
};

/// Drives `session` until the appointment card is shown.
///
/// With `pace` set, each assistant reply waits for its typing delay.
pub fn run_chat<S, R, W>(
    session: &mut BookingSession<S>,
    mut input: R,
    mut output: W,
    pace: bool,
) -> anyhow::Result<()>
where
    S: AppointmentStore,
    R: BufRead,
    W: Write,
{
    loop {
        while let Some(delay) = session.next_reply_delay() {
            if pace {
                output.flush()?;
                thread::sleep(delay);
            }
            if let Some(message) = session.deliver_next_reply() {
                write_message(&mut output, message)?;
            }
        }

        let step = session.step();
        if step == ConversationStep::FinalCard {
            if let Some(appointment) = session.appointment() {
                write_appointment(&mut output, appointment)?;
            }
            return Ok(());
        }

        prompt_for(session, &mut output)?;
        let Some(line) = read_line(&mut input)? else {
            bail!("input closed before the booking was finished");
        };

        let result = match step {
            ConversationStep::Initial => match parse_booking_type(&line) {
                Some(booking_type) => session.select_booking_type(booking_type),
                None => {
                    writeln!(output, "! Please choose 1 (normal) or 2 (emergency).")?;
                    continue;
                }
            },
            ConversationStep::AskSymptoms => session.submit_symptoms(parse_symptoms(&line)),
            ConversationStep::ShowDoctors => match parse_choice(&line) {
                Some(choice) if choice > 0 => session.select_doctor(choice - 1),
                _ => {
                    writeln!(output, "! Enter the number of a doctor.")?;
                    continue;
                }
            },
            ConversationStep::AskBed => match parse_choice(&line) {
                Some(0) => session.select_bed(None),
                Some(choice) => match bed_options().into_iter().nth(choice - 1) {
                    Some(bed) => session.select_bed(Some(bed)),
                    None => {
                        writeln!(output, "! No bed option {choice}.")?;
                        continue;
                    }
                },
                None => {
                    writeln!(output, "! Enter a bed option number, or 0 for none.")?;
                    continue;
                }
            },
            _ => session.handle_chat_input(&line),
        };

        if let Err(err) = result {
            tracing::debug!(error = %err, "input rejected");
            writeln!(output, "! {err}")?;
        }
    }
}

fn prompt_for<S: AppointmentStore, W: Write>(
    session: &BookingSession<S>,
    output: &mut W,
) -> anyhow::Result<()> {
    match session.step() {
        ConversationStep::Initial => {
            writeln!(output, "Choose a booking type:")?;
            writeln!(output, "  1. Normal Booking - Schedule a regular appointment")?;
            writeln!(
                output,
                "  2. Emergency Booking - For immediate medical attention (Call 108 for ambulance)"
            )?;
        }
        ConversationStep::AskSymptoms => {
            writeln!(output, "Common symptoms:")?;
            for (index, symptom) in COMMON_SYMPTOMS.iter().enumerate() {
                writeln!(output, "  {:>2}. {symptom}", index + 1)?;
            }
            writeln!(
                output,
                "Enter numbers or your own symptoms separated by commas, or 'next' to skip."
            )?;
        }
        ConversationStep::ShowDoctors => {
            for card in session.doctor_cards() {
                let doctor = card.doctor;
                let mut line = format!("  {}. Dr. {}", card.index + 1, doctor.name);
                if let Some(specialization) = &doctor.specialization {
                    line.push_str(&format!(" - {specialization}"));
                }
                if let Some(experience) = &doctor.experience {
                    line.push_str(&format!(" ({experience} Exp.)"));
                }
                writeln!(output, "{line}")?;
                if let Some(chamber) = &doctor.chamber {
                    writeln!(output, "     {chamber}")?;
                }
                if let Some(travel) = card.travel {
                    writeln!(
                        output,
                        "     {:.1}km away • ~{} min travel",
                        travel.distance_km, travel.minutes
                    )?;
                }
                if card.bookable {
                    let mut slots = card.visible_slots.join(", ");
                    if card.hidden_slots > 0 {
                        slots.push_str(&format!(" +{} more", card.hidden_slots));
                    }
                    writeln!(output, "     Slots: {slots}")?;
                } else {
                    writeln!(output, "     No available slots")?;
                }
            }
        }
        ConversationStep::AskBed => {
            for (index, bed) in bed_options().iter().enumerate() {
                writeln!(
                    output,
                    "  {}. {} - ₹{} / night ({})",
                    index + 1,
                    bed.kind,
                    bed.price,
                    bed.features.join(", ")
                )?;
            }
            writeln!(output, "  0. No, thanks")?;
        }
        _ => {}
    }
    write!(output, "{} > ", session.input_placeholder())?;
    output.flush()?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_booking_type(line: &str) -> Option<BookingType> {
    match line.trim() {
        "1" => Some(BookingType::Normal),
        "2" => Some(BookingType::Emergency),
        other => other.parse().ok(),
    }
}

fn parse_choice(line: &str) -> Option<usize> {
    line.trim().parse().ok()
}

/// Numbers pick from the catalog, anything else is a custom symptom.
/// `next` or a blank line means no symptoms.
fn parse_symptoms(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("next") {
        return Vec::new();
    }

    let mut picker = SymptomPicker::new();
    for token in line.split(',') {
        let token = token.trim();
        match token.parse::<usize>() {
            Ok(number) if (1..=COMMON_SYMPTOMS.len()).contains(&number) => {
                let symptom = COMMON_SYMPTOMS[number - 1];
                if !picker.is_selected(symptom) {
                    picker.toggle(symptom);
                }
            }
            _ => {
                picker.add_custom(token);
            }
        }
    }
    picker.into_selected()
}

fn write_message<W: Write>(output: &mut W, message: &Message) -> anyhow::Result<()> {
    let speaker = if message.is_from_assistant { "Doc" } else { "You" };
    writeln!(output, "[{}] {speaker}: {}", message.timestamp, message.text)?;
    Ok(())
}

fn write_appointment<W: Write>(output: &mut W, record: &AppointmentRecord) -> anyhow::Result<()> {
    writeln!(output, "==================== Appointment ====================")?;
    if let Some(id) = &record.id {
        writeln!(output, "  Reference: {id}")?;
    }
    writeln!(output, "  Patient:   {}", record.patient_name)?;
    writeln!(output, "  Type:      {}", record.booking_type.as_str().to_uppercase())?;
    writeln!(output, "  Doctor:    Dr. {}", record.doctor_name)?;
    if let Some(hospital) = &record.hospital_name {
        writeln!(output, "  Hospital:  {hospital}")?;
    }
    writeln!(output, "  Date:      {}", record.appointment_date.format("%Y-%m-%d"))?;
    if let Some(time) = &record.appointment_time {
        writeln!(output, "  Time:      {time}")?;
    }
    if !record.symptoms.is_empty() {
        writeln!(output, "  Symptoms:  {}", record.symptoms.join(", "))?;
    }
    writeln!(
        output,
        "  Bed:       {}",
        record.bed_type.as_deref().unwrap_or("Not needed")
    )?;
    if let (Some(distance), Some(minutes)) = (record.distance_km, record.estimated_travel_time) {
        writeln!(output, "  Travel:    {distance:.1} km, ~{minutes} min")?;
    }
    for field in DetailField::ALL {
        if let Some(value) = record.detail(field) {
            writeln!(output, "  {:<9}  {value}", capitalize(field.label()))?;
        }
    }
    writeln!(output, "=====================================================")?;
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_core::{BookingConfig, Directory, Doctor, MemoryStore};
    use std::io::Cursor;

    fn session() -> BookingSession<MemoryStore> {
        let directory = Directory::new(
            vec![
                Doctor {
                    name: "Imran Karim".into(),
                    ..Doctor::default()
                },
                Doctor {
                    name: "Farhana Rahman".into(),
                    specialization: Some("Cardiologist".into()),
                    available_slots: vec!["10:00 AM".into()],
                    ..Doctor::default()
                },
            ],
            Vec::new(),
        );
        let config = BookingConfig {
            reply_delay_ms: 0,
            ..BookingConfig::default()
        };
        BookingSession::new(directory, MemoryStore::new(), config)
    }

    #[test]
    fn scripted_conversation_books_an_appointment() {
        let script = "2\nAsha\n1, 9, Rash\n1\n2\n2\n9999999999\nfemale\n30\na@b.com\nAddr\n";
        let mut session = session();
        let mut output = Vec::new();

        run_chat(&mut session, Cursor::new(script), &mut output, false).unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Doc: Hello Asha! So you opted for emergency booking."));
        assert!(transcript.contains("! Dr. Imran Karim has no available slots"));
        assert!(transcript.contains("Patient:   Asha"));

        let appointment = session.appointment().expect("appointment");
        assert_eq!(appointment.symptoms, vec!["Fever", "Chest pain", "Rash"]);
        assert_eq!(appointment.doctor_name, "Farhana Rahman");
        assert_eq!(appointment.bed_type.as_deref(), Some("General Cabin"));
        assert_eq!(appointment.patient_gender.as_deref(), Some("female"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut session = session();
        let result = run_chat(&mut session, Cursor::new("1\nAsha\n"), Vec::new(), false);
        assert!(result.is_err());
        assert_eq!(session.step(), ConversationStep::AskSymptoms);
    }

    #[test]
    fn symptom_line_parsing() {
        assert!(parse_symptoms("next").is_empty());
        assert!(parse_symptoms("  ").is_empty());
        assert_eq!(parse_symptoms("1, 1, 99, itchy eyes"), vec!["Fever", "99", "itchy eyes"]);
    }

    #[test]
    fn booking_type_accepts_numbers_and_names() {
        assert_eq!(parse_booking_type("1"), Some(BookingType::Normal));
        assert_eq!(parse_booking_type("Emergency"), Some(BookingType::Emergency));
        assert_eq!(parse_booking_type("3"), None);
    }
}
