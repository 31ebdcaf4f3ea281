//! The step sequencer behind the booking chat.
//!
//! Every user action is checked against the current step, appends the user's
//! bubble right away and queues the assistant's answers. Queued answers are
//! delivered one at a time by the driver (a UI timer, a terminal loop) after
//! their simulated delay; some of them move the conversation one step forward
//! when they land.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{Local, Utc};

use crate::{
    assemble_appointment, persist_or_fallback, AppointmentRecord, AppointmentStore, BedOption,
    BookingConfig, BookingDraft, BookingError, BookingType, ConversationStep, DetailField,
    Directory, Doctor, GeoPoint, Message, TravelEstimate,
};

const GREETING: &str =
    "Hello! I am Doc, Your friendly neighborhood Spider Doc 🕷️🩺. What's your name?";
const EMERGENCY_SYMPTOM_PROMPT: &str = "Woooo it's an EMERGENCY I see! Don't worry, everything will be fine. Just enter the patient's symptoms or if you just want to book a doctor of your preference then type 'next'.";
const NORMAL_SYMPTOM_PROMPT: &str = "Enter your symptoms or if no symptoms then type 'next'.";
const DOCTORS_INTRO: &str =
    "Based on your information, here are the available doctors for appointment:";
const ASK_BED: &str = "Do you need to book a Bed or Cabin? Please choose from the options below.";
const PREPARING_CARD: &str =
    "Perfect! I have all the information needed. Preparing your appointment card...";
const CONFIRMED: &str = "🎉 Appointment confirmed! Here's your appointment card:";
const DEFAULT_PLACEHOLDER: &str = "Type your message...";

/// What happens once a queued reply becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyEffect {
    None,
    /// Move to the next step.
    Advance,
    /// Assemble and save the appointment.
    Finalize,
}

/// An assistant message waiting behind its typing delay.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub text: String,
    pub delay: Duration,
    pub effect: ReplyEffect,
}

/// A doctor as presented at the selection step.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorCard<'a> {
    pub index: usize,
    pub doctor: &'a Doctor,
    pub travel: Option<TravelEstimate>,
    pub visible_slots: &'a [String],
    pub hidden_slots: usize,
    pub bookable: bool,
}

pub struct BookingSession<S> {
    config: BookingConfig,
    directory: Directory,
    store: S,
    user_location: Option<GeoPoint>,
    step: ConversationStep,
    visited: Vec<ConversationStep>,
    messages: Vec<Message>,
    pending: VecDeque<PendingReply>,
    draft: BookingDraft,
    detail_index: usize,
    appointment: Option<AppointmentRecord>,
    next_message_id: u64,
}

impl<S: AppointmentStore> BookingSession<S> {
    pub fn new(directory: Directory, store: S, config: BookingConfig) -> Self {
        Self {
            config,
            directory,
            store,
            user_location: None,
            step: ConversationStep::Initial,
            visited: vec![ConversationStep::Initial],
            messages: Vec::new(),
            pending: VecDeque::new(),
            draft: BookingDraft::default(),
            detail_index: 0,
            appointment: None,
            next_message_id: 1,
        }
    }

    pub fn with_user_location(mut self, location: Option<GeoPoint>) -> Self {
        self.user_location = location;
        self
    }

    /// Location may arrive late (browser geolocation); later travel estimates
    /// pick it up.
    pub fn set_user_location(&mut self, location: Option<GeoPoint>) {
        self.user_location = location;
    }

    pub fn user_location(&self) -> Option<GeoPoint> {
        self.user_location
    }

    pub fn step(&self) -> ConversationStep {
        self.step
    }

    pub fn visited_steps(&self) -> &[ConversationStep] {
        &self.visited
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn appointment(&self) -> Option<&AppointmentRecord> {
        self.appointment.as_ref()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_typing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_replies(&self) -> impl Iterator<Item = &PendingReply> {
        self.pending.iter()
    }

    /// The detail field the chat box is currently asking for.
    pub fn current_detail(&self) -> Option<DetailField> {
        if self.step == ConversationStep::CollectDetails {
            DetailField::ALL.get(self.detail_index).copied()
        } else {
            None
        }
    }

    pub fn input_placeholder(&self) -> String {
        match self.current_detail() {
            Some(field) => format!("Enter patient's {}...", field.label()),
            None => DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn travel_to(&self, doctor: &Doctor) -> Option<TravelEstimate> {
        TravelEstimate::between(self.user_location, self.directory.doctor_location(doctor))
    }

    pub fn doctor_cards(&self) -> Vec<DoctorCard<'_>> {
        let visible = self.config.visible_slots;
        self.directory
            .doctors
            .iter()
            .enumerate()
            .map(|(index, doctor)| {
                let shown = doctor.available_slots.len().min(visible);
                DoctorCard {
                    index,
                    doctor,
                    travel: self.travel_to(doctor),
                    visible_slots: &doctor.available_slots[..shown],
                    hidden_slots: doctor.available_slots.len() - shown,
                    bookable: doctor.is_bookable(),
                }
            })
            .collect()
    }

    pub fn select_booking_type(&mut self, booking_type: BookingType) -> Result<(), BookingError> {
        self.begin(ConversationStep::Initial)?;
        self.draft.booking_type = Some(booking_type);
        self.push_message(format!("I want {booking_type} booking"), false);
        self.advance();
        self.queue_reply(GREETING, ReplyEffect::None);
        Ok(())
    }

    pub fn submit_name(&mut self, name: &str) -> Result<(), BookingError> {
        self.begin(ConversationStep::AskName)?;
        let name = non_empty(name)?;
        let booking_type = self
            .draft
            .booking_type
            .ok_or(BookingError::MissingData("booking type"))?;

        self.draft.patient_name = Some(name.to_string());
        self.push_message(name, false);
        self.advance();
        self.queue_reply(
            format!("Hello {name}! So you opted for {booking_type} booking."),
            ReplyEffect::Advance,
        );
        let prompt = match booking_type {
            BookingType::Emergency => EMERGENCY_SYMPTOM_PROMPT,
            BookingType::Normal => NORMAL_SYMPTOM_PROMPT,
        };
        self.queue_reply(prompt, ReplyEffect::None);
        Ok(())
    }

    /// An empty list means the user skipped the symptom step.
    pub fn submit_symptoms(&mut self, symptoms: Vec<String>) -> Result<(), BookingError> {
        self.begin(ConversationStep::AskSymptoms)?;

        let mut unique: Vec<String> = Vec::with_capacity(symptoms.len());
        for symptom in symptoms {
            let symptom = symptom.trim();
            if !symptom.is_empty() && !unique.iter().any(|known| known == symptom) {
                unique.push(symptom.to_string());
            }
        }

        if unique.is_empty() {
            self.push_message("No symptoms / Skip", false);
        } else {
            self.push_message(format!("Selected symptoms: {}", unique.join(", ")), false);
        }
        self.draft.symptoms = unique;
        self.advance();
        self.queue_reply(DOCTORS_INTRO, ReplyEffect::None);
        Ok(())
    }

    pub fn select_doctor(&mut self, index: usize) -> Result<(), BookingError> {
        self.begin(ConversationStep::ShowDoctors)?;
        let doctor = self
            .directory
            .doctors
            .get(index)
            .cloned()
            .ok_or(BookingError::UnknownDoctor(index))?;
        if !doctor.is_bookable() {
            return Err(BookingError::DoctorUnavailable(doctor.name));
        }

        self.push_message(format!("Selected Dr. {}", doctor.name), false);
        let distance_info = self
            .travel_to(&doctor)
            .filter(|estimate| estimate.minutes > 0)
            .map(|estimate| departure_hint(estimate.minutes))
            .unwrap_or_default();
        self.queue_reply(
            format!("Great choice! Dr. {} is available.{distance_info}", doctor.name),
            ReplyEffect::Advance,
        );
        self.queue_reply(ASK_BED, ReplyEffect::None);
        self.draft.selected_doctor = Some(doctor);
        Ok(())
    }

    /// `None` declines a bed.
    pub fn select_bed(&mut self, selection: Option<BedOption>) -> Result<(), BookingError> {
        self.begin(ConversationStep::AskBed)?;

        match &selection {
            Some(bed) => {
                self.push_message(format!("Selected {}", bed.kind), false);
                self.queue_reply(
                    format!(
                        "Great! I'll include the {} booking. Now let me collect some patient details.",
                        bed.kind
                    ),
                    ReplyEffect::Advance,
                );
            }
            None => {
                self.push_message("No bed needed.", false);
                self.queue_reply(
                    "No problem! Now let me collect some patient details.",
                    ReplyEffect::Advance,
                );
            }
        }
        self.draft.bed_selection = selection;
        self.detail_index = 0;
        self.queue_reply(
            format!("Please enter the patient's {}:", DetailField::ALL[0].label()),
            ReplyEffect::None,
        );
        Ok(())
    }

    pub fn submit_detail(&mut self, value: &str) -> Result<(), BookingError> {
        self.begin(ConversationStep::CollectDetails)?;
        let value = non_empty(value)?;
        let field = DetailField::ALL
            .get(self.detail_index)
            .copied()
            .ok_or(BookingError::UnexpectedInput(self.step))?;

        self.draft.patient_details.insert(field, value);
        self.push_message(value, false);

        match DetailField::ALL.get(self.detail_index + 1) {
            Some(next) => {
                self.detail_index += 1;
                self.queue_reply(
                    format!("Thank you! Now please enter the patient's {}:", next.label()),
                    ReplyEffect::None,
                );
            }
            None => {
                self.advance();
                self.queue_reply(PREPARING_CARD, ReplyEffect::Finalize);
            }
        }
        Ok(())
    }

    /// Routes text typed into the chat box to whatever the current step
    /// expects.
    pub fn handle_chat_input(&mut self, raw: &str) -> Result<(), BookingError> {
        let message = non_empty(raw)?;
        if self.is_typing() {
            return Err(BookingError::ReplyPending);
        }

        match self.step {
            ConversationStep::AskName => self.submit_name(message),
            ConversationStep::CollectDetails => self.submit_detail(message),
            ConversationStep::AskSymptoms if message.eq_ignore_ascii_case("next") => {
                self.submit_symptoms(Vec::new())
            }
            step => Err(BookingError::UnexpectedInput(step)),
        }
    }

    /// Delay before the next queued reply should be shown.
    pub fn next_reply_delay(&self) -> Option<Duration> {
        self.pending.front().map(|reply| reply.delay)
    }

    /// Shows the head of the reply queue and applies its effect.
    pub fn deliver_next_reply(&mut self) -> Option<&Message> {
        let reply = self.pending.pop_front()?;
        tracing::debug!(step = %self.step, "assistant reply delivered");
        self.push_message(reply.text, true);

        match reply.effect {
            ReplyEffect::None => {}
            ReplyEffect::Advance => self.advance(),
            ReplyEffect::Finalize => self.finalize(),
        }
        self.messages.last()
    }

    /// Delivers every queued reply without waiting. Returns how many landed.
    pub fn flush_replies(&mut self) -> usize {
        let mut delivered = 0;
        while self.deliver_next_reply().is_some() {
            delivered += 1;
        }
        delivered
    }

    fn begin(&self, expected: ConversationStep) -> Result<(), BookingError> {
        if self.is_typing() {
            return Err(BookingError::ReplyPending);
        }
        if self.step != expected {
            return Err(BookingError::StepMismatch {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            tracing::debug!(from = %self.step, to = %next, "conversation advanced");
            self.step = next;
            self.visited.push(next);
        }
    }

    fn finalize(&mut self) {
        if self.appointment.is_some() {
            return;
        }

        let travel = self
            .draft
            .selected_doctor
            .as_ref()
            .and_then(|doctor| self.travel_to(doctor));
        match assemble_appointment(&self.draft, travel, Utc::now()) {
            Ok(record) => {
                let shown = persist_or_fallback(&mut self.store, record);
                self.appointment = Some(shown);
                self.queue_reply(CONFIRMED, ReplyEffect::None);
            }
            Err(err) => tracing::error!(error = %err, "could not assemble appointment"),
        }
    }

    fn push_message(&mut self, text: impl Into<String>, is_from_assistant: bool) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.messages.push(Message {
            id,
            text: text.into(),
            is_from_assistant,
            timestamp: Local::now().format("%H:%M").to_string(),
        });
    }

    fn queue_reply(&mut self, text: impl Into<String>, effect: ReplyEffect) {
        self.pending.push_back(PendingReply {
            text: text.into(),
            delay: Duration::from_millis(self.config.reply_delay_ms),
            effect,
        });
    }
}

fn non_empty(raw: &str) -> Result<&str, BookingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(BookingError::EmptyInput)
    } else {
        Ok(trimmed)
    }
}

fn departure_hint(minutes: u32) -> String {
    let departure = Local::now() + chrono::Duration::minutes(i64::from(minutes));
    format!(
        " You will need approximately {minutes} minutes to reach the chamber. Hey, you should set off at {} for the chamber.",
        departure.format("%H:%M:%S")
    )
}
