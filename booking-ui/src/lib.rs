//! Chat widget for the booking assistant, rendered with yew in the browser.

use booking_core::{AppointmentRecord, BedOption, BookingConfig, Doctor, TravelEstimate};
use chrono::Local;
use serde::Deserialize;

#[cfg(target_arch = "wasm32")]
mod styles;

/// Options accepted from JavaScript when mounting the widget.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Default, Deserialize)]
struct JsBookingOptions {
    #[serde(default)]
    reply_delay_ms: Option<u64>,
    #[serde(default)]
    visible_slots: Option<usize>,
}

impl From<JsBookingOptions> for BookingConfig {
    fn from(options: JsBookingOptions) -> Self {
        let mut base = BookingConfig::default();
        if let Some(delay) = options.reply_delay_ms {
            base.reply_delay_ms = delay;
        }
        if let Some(slots) = options.visible_slots {
            base.visible_slots = slots;
        }
        base
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn travel_label(estimate: &TravelEstimate) -> String {
    format!(
        "{:.1}km away • ~{} min travel",
        estimate.distance_km, estimate.minutes
    )
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn slot_overflow_label(hidden: usize) -> Option<String> {
    (hidden > 0).then(|| format!("+{hidden} more"))
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn experience_label(doctor: &Doctor) -> Option<String> {
    doctor
        .experience
        .as_ref()
        .map(|experience| format!("{experience} Exp."))
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn bed_price_label(bed: &BedOption) -> String {
    format!("₹{} / night", bed.price)
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn symptoms_label(symptoms: &[String]) -> String {
    if symptoms.is_empty() {
        "None reported".to_string()
    } else {
        symptoms.join(", ")
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn appointment_date_label(record: &AppointmentRecord) -> String {
    record
        .appointment_date
        .with_timezone(&Local)
        .format("%d %b %Y")
        .to_string()
}

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::cell::RefCell;
    use std::rc::Rc;

    use booking_core::{
        bed_options, AppointmentRecord, AppointmentStore, BookingConfig, BookingError,
        BookingSession, BookingType, ConversationStep, DetailField, Directory, GeoPoint, Message,
        StoreError, SymptomPicker, COMMON_SYMPTOMS,
    };
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{console, Document, Element, HtmlInputElement, Window};
    use yew::events::{InputEvent, KeyboardEvent, SubmitEvent};
    use yew::prelude::*;
    use yew::TargetCast;

    use super::{
        appointment_date_label, bed_price_label, experience_label, slot_overflow_label,
        symptoms_label, travel_label, JsBookingOptions,
    };
    use crate::styles;

    /// Appointment persistence through an optional JS callback.
    struct BrowserStore {
        create: Option<js_sys::Function>,
    }

    impl AppointmentStore for BrowserStore {
        fn create(&mut self, record: &AppointmentRecord) -> Result<AppointmentRecord, StoreError> {
            let callback = self.create.as_ref().ok_or_else(|| {
                StoreError::Unavailable("no create_appointment callback".to_string())
            })?;
            let payload =
                to_value(record).map_err(|err| StoreError::Serialization(err.to_string()))?;
            let saved = callback
                .call1(&JsValue::NULL, &payload)
                .map_err(|err| StoreError::Unavailable(format!("{err:?}")))?;
            if saved.is_null() || saved.is_undefined() {
                return Ok(record.clone());
            }
            from_value(saved).map_err(|err| StoreError::Serialization(err.to_string()))
        }
    }

    type SessionHandle = Rc<RefCell<BookingSession<BrowserStore>>>;

    #[derive(Properties, PartialEq)]
    pub struct BookingChatProps {
        pub directory: Directory,
        pub config: BookingConfig,
        pub create_appointment: Option<js_sys::Function>,
    }

    #[function_component(BookingChat)]
    fn booking_chat(props: &BookingChatProps) -> Html {
        let session: SessionHandle = {
            let directory = props.directory.clone();
            let config = props.config.clone();
            let create = props.create_appointment.clone();
            use_mut_ref(move || BookingSession::new(directory, BrowserStore { create }, config))
        };
        let redraw = use_force_update();

        {
            let session = session.clone();
            let redraw = redraw.clone();
            use_effect_with((), move |_| {
                if let Some(window) = web_sys::window() {
                    if let Some(document) = window.document() {
                        if let Err(err) = styles::ensure_styles(&document) {
                            console::error_1(&err);
                        }
                    }
                }
                request_location(session, redraw);
                || ()
            });
        }

        let state = session.borrow();
        let step = state.step();

        let on_booking_type = {
            let session = session.clone();
            let redraw = redraw.clone();
            move |booking_type: BookingType| {
                let session = session.clone();
                let redraw = redraw.clone();
                Callback::from(move |_: MouseEvent| {
                    act(&session, &redraw, |s| s.select_booking_type(booking_type));
                })
            }
        };

        let header = html! {
            <header class="booking-header">
                <h1>{"Doctigo AI"}</h1>
                <p>{"Your AI-powered medical booking assistant"}</p>
            </header>
        };

        if step == ConversationStep::Initial {
            return html! {
                <div class="booking-root">
                    { header }
                    <div class="booking-type-grid">
                        <div class="booking-type-card" data-kind="normal" onclick={on_booking_type(BookingType::Normal)}>
                            <h3>{"Normal Booking"}</h3>
                            <p>{"Schedule a regular appointment"}</p>
                        </div>
                        <div class="booking-type-card" data-kind="emergency" onclick={on_booking_type(BookingType::Emergency)}>
                            <h3>{"Emergency Booking"}</h3>
                            <p>{"For immediate medical attention"}</p>
                            <div class="booking-ambulance">{"Call 108 for ambulance"}</div>
                        </div>
                    </div>
                </div>
            };
        }

        let controls = match step {
            ConversationStep::AskSymptoms => {
                let on_submit = {
                    let session = session.clone();
                    let redraw = redraw.clone();
                    Callback::from(move |symptoms: Vec<String>| {
                        act(&session, &redraw, |s| s.submit_symptoms(symptoms));
                    })
                };
                html! { <SymptomSelector on_submit={on_submit} /> }
            }
            ConversationStep::ShowDoctors => render_doctors(&state, &session, &redraw),
            ConversationStep::AskBed => render_beds(&session, &redraw),
            ConversationStep::FinalCard => state
                .appointment()
                .map(render_appointment)
                .unwrap_or_default(),
            _ => Html::default(),
        };

        let chat_input = if step.shows_chat_input() {
            let on_send = {
                let session = session.clone();
                let redraw = redraw.clone();
                Callback::from(move |text: String| {
                    act(&session, &redraw, |s| s.handle_chat_input(&text));
                })
            };
            html! {
                <ChatInput
                    on_send={on_send}
                    placeholder={state.input_placeholder()}
                    disabled={state.is_typing()}
                />
            }
        } else {
            Html::default()
        };

        html! {
            <div class="booking-root">
                { header }
                <div class="chat-panel">
                    <div class="chat-log" aria-live="polite">
                        { for state.messages().iter().map(render_message) }
                        {
                            if state.is_typing() {
                                html! {
                                    <div class="chat-message chat-typing" data-from="assistant">
                                        <div class="chat-bubble">{"•••"}</div>
                                    </div>
                                }
                            } else {
                                Html::default()
                            }
                        }
                    </div>
                    <div class="chat-controls">{ controls }</div>
                    { chat_input }
                </div>
            </div>
        }
    }

    /// Runs a user action, then kicks off delivery of whatever it queued.
    fn act<F>(session: &SessionHandle, redraw: &UseForceUpdateHandle, action: F)
    where
        F: FnOnce(&mut BookingSession<BrowserStore>) -> Result<(), BookingError>,
    {
        let result = {
            let mut guard = session.borrow_mut();
            action(&mut guard)
        };
        if let Err(err) = result {
            console::warn_1(&JsValue::from_str(&err.to_string()));
            return;
        }
        redraw.force_update();
        schedule_next_reply(session.clone(), redraw.clone());
    }

    /// Delivers queued replies one at a time, each after its own delay.
    fn schedule_next_reply(session: SessionHandle, redraw: UseForceUpdateHandle) {
        let Some(delay) = session.borrow().next_reply_delay() else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };

        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let tick = Closure::once_into_js(move || {
            session.borrow_mut().deliver_next_reply();
            redraw.force_update();
            schedule_next_reply(session, redraw);
        });
        if let Err(err) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(tick.unchecked_ref(), millis)
        {
            console::error_1(&err);
        }
    }

    fn request_location(session: SessionHandle, redraw: UseForceUpdateHandle) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(geolocation) = window.navigator().geolocation() else {
            return;
        };

        let on_position = Closure::once_into_js(move |position: web_sys::Position| {
            let coords = position.coords();
            session
                .borrow_mut()
                .set_user_location(Some(GeoPoint::new(coords.latitude(), coords.longitude())));
            redraw.force_update();
        });
        if let Err(err) = geolocation.get_current_position(on_position.unchecked_ref()) {
            console::warn_1(&err);
        }
    }

    fn render_message(message: &Message) -> Html {
        let from = if message.is_from_assistant {
            "assistant"
        } else {
            "user"
        };
        html! {
            <div class="chat-message" data-from={from} key={message.id.to_string()}>
                <div class="chat-bubble">{ message.text.clone() }</div>
                <span class="chat-time">{ message.timestamp.clone() }</span>
            </div>
        }
    }

    fn render_doctors(
        state: &BookingSession<BrowserStore>,
        session: &SessionHandle,
        redraw: &UseForceUpdateHandle,
    ) -> Html {
        html! {
            <div class="doctor-list">
                {
                    for state.doctor_cards().into_iter().map(|card| {
                        let index = card.index;
                        let onclick = {
                            let session = session.clone();
                            let redraw = redraw.clone();
                            Callback::from(move |_: MouseEvent| {
                                act(&session, &redraw, |s| s.select_doctor(index));
                            })
                        };
                        let doctor = card.doctor;
                        html! {
                            <article class="doctor-card">
                                <h3>{ format!("Dr. {}", doctor.name) }</h3>
                                { doctor.specialization.as_ref().map(|text| html! { <p class="doctor-specialization">{ text.clone() }</p> }).unwrap_or_default() }
                                { experience_label(doctor).map(|text| html! { <p class="doctor-meta">{ text }</p> }).unwrap_or_default() }
                                { doctor.chamber.as_ref().map(|text| html! { <p class="doctor-meta">{ text.clone() }</p> }).unwrap_or_default() }
                                { card.travel.as_ref().map(|estimate| html! { <p class="doctor-travel">{ travel_label(estimate) }</p> }).unwrap_or_default() }
                                <div class="slot-badges">
                                    { for card.visible_slots.iter().map(|slot| html! { <span class="slot-badge">{ slot.clone() }</span> }) }
                                    { slot_overflow_label(card.hidden_slots).map(|text| html! { <span class="slot-badge">{ text }</span> }).unwrap_or_default() }
                                </div>
                                <button type="button" class="booking-button" disabled={!card.bookable} onclick={onclick}>
                                    {"Book Appointment"}
                                </button>
                            </article>
                        }
                    })
                }
            </div>
        }
    }

    fn render_beds(session: &SessionHandle, redraw: &UseForceUpdateHandle) -> Html {
        let decline = {
            let session = session.clone();
            let redraw = redraw.clone();
            Callback::from(move |_: MouseEvent| {
                act(&session, &redraw, |s| s.select_bed(None));
            })
        };

        html! {
            <div>
                <div class="bed-grid">
                    {
                        for bed_options().into_iter().map(|bed| {
                            let price = bed_price_label(&bed);
                            let title = bed.kind.clone();
                            let features = bed.features.clone();
                            let onclick = {
                                let session = session.clone();
                                let redraw = redraw.clone();
                                Callback::from(move |_: MouseEvent| {
                                    let bed = bed.clone();
                                    act(&session, &redraw, move |s| s.select_bed(Some(bed)));
                                })
                            };
                            html! {
                                <article class="bed-card">
                                    <h3>{ title }</h3>
                                    <p class="bed-price">{ price }</p>
                                    <ul>{ for features.into_iter().map(|feature| html! { <li>{ feature }</li> }) }</ul>
                                    <button type="button" class="booking-button" onclick={onclick}>{"Select"}</button>
                                </article>
                            }
                        })
                    }
                </div>
                <button type="button" class="booking-button" data-variant="outline" onclick={decline}>
                    {"No, thanks"}
                </button>
            </div>
        }
    }

    fn render_appointment(record: &AppointmentRecord) -> Html {
        let kind = record.booking_type.as_str();
        let travel = match (record.distance_km, record.estimated_travel_time) {
            (Some(distance_km), Some(minutes)) => Some(travel_label(
                &booking_core::TravelEstimate {
                    distance_km,
                    minutes,
                },
            )),
            _ => None,
        };

        html! {
            <article class="appointment-card">
                <h3>{ record.patient_name.clone() }</h3>
                <span class="booking-type-badge" data-kind={kind}>{ kind.to_uppercase() }</span>
                <dl>
                    <dt>{"Doctor"}</dt>
                    <dd>{ format!("Dr. {}", record.doctor_name) }</dd>
                    <dt>{"Hospital"}</dt>
                    <dd>{ record.hospital_name.clone().unwrap_or_else(|| "--".to_string()) }</dd>
                    <dt>{"Date"}</dt>
                    <dd>{ appointment_date_label(record) }</dd>
                    <dt>{"Time"}</dt>
                    <dd>{ record.appointment_time.clone().unwrap_or_else(|| "--".to_string()) }</dd>
                    <dt>{"Symptoms"}</dt>
                    <dd>{ symptoms_label(&record.symptoms) }</dd>
                    <dt>{"Bed"}</dt>
                    <dd>{ record.bed_type.clone().unwrap_or_else(|| "Not needed".to_string()) }</dd>
                    { travel.map(|text| html! { <><dt>{"Travel"}</dt><dd>{ text }</dd></> }).unwrap_or_default() }
                    {
                        for DetailField::ALL.into_iter().filter_map(|field| {
                            record.detail(field).map(|value| html! {
                                <><dt>{ field.label() }</dt><dd>{ value.to_string() }</dd></>
                            })
                        })
                    }
                </dl>
            </article>
        }
    }

    #[derive(Properties, PartialEq)]
    struct SymptomSelectorProps {
        on_submit: Callback<Vec<String>>,
    }

    #[function_component(SymptomSelector)]
    fn symptom_selector(props: &SymptomSelectorProps) -> Html {
        let picker = use_state(SymptomPicker::new);
        let custom = use_state(String::new);

        let add_custom = {
            let picker = picker.clone();
            let custom = custom.clone();
            move || {
                let mut next = (*picker).clone();
                if next.add_custom(&custom) {
                    picker.set(next);
                    custom.set(String::new());
                }
            }
        };

        let on_custom_input = {
            let custom = custom.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                custom.set(input.value());
            })
        };

        let on_custom_key = {
            let add_custom = add_custom.clone();
            Callback::from(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    add_custom();
                }
            })
        };

        let on_add = Callback::from(move |_: MouseEvent| add_custom());

        let on_continue = {
            let picker = picker.clone();
            let on_submit = props.on_submit.clone();
            Callback::from(move |_: MouseEvent| {
                on_submit.emit(picker.selected().to_vec());
            })
        };

        let on_skip = {
            let on_submit = props.on_submit.clone();
            Callback::from(move |_: MouseEvent| on_submit.emit(Vec::new()))
        };

        let custom_selected: Vec<String> = picker
            .selected()
            .iter()
            .filter(|symptom| !COMMON_SYMPTOMS.contains(&symptom.as_str()))
            .cloned()
            .collect();

        html! {
            <div class="symptom-selector">
                <div class="symptom-chips" role="group" aria-label="Common symptoms">
                    {
                        for COMMON_SYMPTOMS.into_iter().map(|symptom| {
                            let picker = picker.clone();
                            let is_active = picker.is_selected(symptom);
                            let onclick = Callback::from(move |_: MouseEvent| {
                                let mut next = (*picker).clone();
                                next.toggle(symptom);
                                picker.set(next);
                            });
                            html! {
                                <button type="button" class={classes!("symptom-chip", is_active.then_some("is-active"))} onclick={onclick}>
                                    { symptom }
                                </button>
                            }
                        })
                    }
                    {
                        for custom_selected.into_iter().map(|symptom| {
                            let picker = picker.clone();
                            let label = symptom.clone();
                            let onclick = Callback::from(move |_: MouseEvent| {
                                let mut next = (*picker).clone();
                                next.remove(&symptom);
                                picker.set(next);
                            });
                            html! {
                                <button type="button" class="symptom-chip is-active" onclick={onclick}>
                                    { format!("{label} ×") }
                                </button>
                            }
                        })
                    }
                </div>
                <div class="symptom-custom">
                    <input
                        type="text"
                        placeholder="Add custom symptom..."
                        value={(*custom).clone()}
                        oninput={on_custom_input}
                        onkeypress={on_custom_key}
                    />
                    <button type="button" class="booking-button" onclick={on_add}>{"Add"}</button>
                </div>
                <div class="symptom-actions">
                    <button type="button" class="booking-button" disabled={picker.is_empty()} onclick={on_continue}>
                        { format!("Continue with Symptoms ({})", picker.selected().len()) }
                    </button>
                    <button type="button" class="booking-button" data-variant="outline" onclick={on_skip}>
                        {"Skip / No Symptoms"}
                    </button>
                </div>
            </div>
        }
    }

    #[derive(Properties, PartialEq)]
    struct ChatInputProps {
        on_send: Callback<String>,
        placeholder: String,
        disabled: bool,
    }

    #[function_component(ChatInput)]
    fn chat_input(props: &ChatInputProps) -> Html {
        let text = use_state(String::new);

        let on_input = {
            let text = text.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                text.set(input.value());
            })
        };

        let on_submit = {
            let text = text.clone();
            let on_send = props.on_send.clone();
            let disabled = props.disabled;
            Callback::from(move |event: SubmitEvent| {
                event.prevent_default();
                let message = text.trim().to_string();
                if !message.is_empty() && !disabled {
                    on_send.emit(message);
                    text.set(String::new());
                }
            })
        };

        html! {
            <form class="chat-input" onsubmit={on_submit}>
                <input
                    type="text"
                    value={(*text).clone()}
                    placeholder={props.placeholder.clone()}
                    disabled={props.disabled}
                    oninput={on_input}
                />
                <button type="submit" class="booking-button" disabled={props.disabled || text.trim().is_empty()}>
                    {"Send"}
                </button>
            </form>
        }
    }

    #[wasm_bindgen]
    pub fn mount_booking_chat(
        selector: &str,
        directory: JsValue,
        options: Option<JsValue>,
        create_appointment: Option<js_sys::Function>,
    ) -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Document is not accessible"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Invalid selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches the selector"))?;

        let payload = from_value::<serde_json::Value>(directory)
            .map_err(|err| JsValue::from_str(&format!("Unreadable directory payload: {err}")))?;
        let directory = booking_directory::parse_directory_value(&payload)
            .map_err(|err| JsValue::from_str(&format!("Directory error: {err}")))?;

        let config = match options {
            Some(js_options) => {
                let options: JsBookingOptions = from_value(js_options)
                    .map_err(|err| JsValue::from_str(&format!("Unreadable options: {err}")))?;
                BookingConfig::from(options)
            }
            None => BookingConfig::default(),
        };

        yew::Renderer::<BookingChat>::with_root_and_props(
            target,
            BookingChatProps {
                directory,
                config,
                create_appointment,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_booking_chat;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_booking_chat(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
    _: Option<js_sys::Function>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "booking-ui only supports the wasm32 target",
    ))
}
