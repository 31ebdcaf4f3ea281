#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-booking-ui]";

/// Default CSS for the chat widget along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --booking-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --booking-bg: linear-gradient(135deg, #eff6ff 0%, #ffffff 50%, #f0fdf4 100%);
  --booking-card-bg: #ffffff;
  --booking-card-border: rgba(148, 163, 184, 0.28);
  --booking-radius: 16px;
  --booking-text: #1f2933;
  --booking-muted: #52606d;
  --booking-accent: #2563eb;
  --booking-accent-soft: rgba(37, 99, 235, 0.1);
  --booking-success: #16a34a;
  --booking-emergency: #dc2626;
  --booking-emergency-soft: rgba(220, 38, 38, 0.08);
  --booking-bubble-bot: #ffffff;
  --booking-bubble-user: #2563eb;
  --booking-surface: #f8fafc;
}

.booking-root {
  font-family: var(--booking-font-family);
  background: var(--booking-bg);
  color: var(--booking-text);
  min-height: 100%;
  padding: 32px 16px;
}

.booking-header {
  text-align: center;
  margin-bottom: 28px;
}

.booking-header h1 {
  font-size: 1.9rem;
  margin: 0 0 6px;
  background: linear-gradient(90deg, #2563eb, #16a34a);
  -webkit-background-clip: text;
  background-clip: text;
  color: transparent;
}

.booking-header p {
  color: var(--booking-muted);
  margin: 0;
}

.booking-type-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
  gap: 20px;
  max-width: 640px;
  margin: 0 auto;
}

.booking-type-card {
  background: var(--booking-card-bg);
  border: 2px solid var(--booking-card-border);
  border-radius: var(--booking-radius);
  padding: 28px;
  text-align: center;
  cursor: pointer;
  transition: box-shadow 0.2s ease, border-color 0.2s ease;
}

.booking-type-card:hover {
  box-shadow: 0 16px 32px rgba(15, 23, 42, 0.08);
  border-color: var(--booking-accent);
}

.booking-type-card[data-kind="emergency"]:hover {
  border-color: var(--booking-emergency);
}

.booking-type-card h3 {
  margin: 0 0 8px;
}

.booking-type-card p {
  margin: 0;
  color: var(--booking-muted);
}

.booking-ambulance {
  margin-top: 12px;
  color: var(--booking-emergency);
  font-weight: 600;
  font-size: 0.9rem;
}

.chat-panel {
  max-width: 760px;
  margin: 0 auto;
  background: var(--booking-card-bg);
  border: 1px solid var(--booking-card-border);
  border-radius: calc(var(--booking-radius) + 4px);
  box-shadow: 0 24px 48px rgba(15, 23, 42, 0.1);
  overflow: hidden;
}

.chat-log {
  height: 32rem;
  overflow-y: auto;
  padding: 16px;
  background: var(--booking-surface);
  display: flex;
  flex-direction: column;
  gap: 12px;
}

.chat-message {
  display: flex;
  flex-direction: column;
  max-width: 70%;
}

.chat-message[data-from="assistant"] {
  align-self: flex-start;
}

.chat-message[data-from="user"] {
  align-self: flex-end;
  align-items: flex-end;
}

.chat-bubble {
  padding: 10px 14px;
  border-radius: 18px;
  line-height: 1.45;
  font-size: 0.92rem;
}

.chat-message[data-from="assistant"] .chat-bubble {
  background: var(--booking-bubble-bot);
  border: 1px solid var(--booking-card-border);
  border-bottom-left-radius: 6px;
}

.chat-message[data-from="user"] .chat-bubble {
  background: var(--booking-bubble-user);
  color: #ffffff;
  border-bottom-right-radius: 6px;
}

.chat-time {
  font-size: 0.72rem;
  color: var(--booking-muted);
  margin-top: 4px;
  padding: 0 6px;
}

.chat-typing .chat-bubble {
  letter-spacing: 3px;
  color: var(--booking-muted);
}

.chat-controls {
  padding: 16px;
  border-top: 1px solid var(--booking-card-border);
  background: var(--booking-card-bg);
}

.chat-input {
  display: flex;
  gap: 8px;
  padding: 16px;
  border-top: 1px solid var(--booking-card-border);
}

.chat-input input,
.symptom-custom input {
  flex: 1;
  border: 1px solid var(--booking-card-border);
  border-radius: 12px;
  padding: 10px 12px;
  font: inherit;
}

.booking-button {
  border: none;
  border-radius: 12px;
  padding: 10px 16px;
  background: var(--booking-accent);
  color: #ffffff;
  font: inherit;
  font-weight: 600;
  cursor: pointer;
}

.booking-button:disabled {
  opacity: 0.5;
  cursor: not-allowed;
}

.booking-button[data-variant="outline"] {
  background: transparent;
  color: var(--booking-text);
  border: 1px solid var(--booking-card-border);
}

.symptom-chips,
.slot-badges {
  display: flex;
  flex-wrap: wrap;
  gap: 8px;
  margin-bottom: 12px;
}

.symptom-chip,
.slot-badge {
  border: 1px solid var(--booking-card-border);
  border-radius: 999px;
  padding: 4px 12px;
  font-size: 0.82rem;
  background: transparent;
  cursor: pointer;
}

.symptom-chip.is-active {
  background: var(--booking-accent);
  border-color: var(--booking-accent);
  color: #ffffff;
}

.symptom-custom,
.symptom-actions {
  display: flex;
  gap: 8px;
  margin-bottom: 12px;
}

.doctor-list {
  display: flex;
  flex-direction: column;
  gap: 12px;
  max-height: 24rem;
  overflow-y: auto;
}

.doctor-card,
.bed-card,
.appointment-card {
  border: 1px solid var(--booking-card-border);
  border-radius: var(--booking-radius);
  padding: 16px;
  background: var(--booking-card-bg);
}

.doctor-card h3,
.bed-card h3,
.appointment-card h3 {
  margin: 0 0 4px;
}

.doctor-meta,
.doctor-travel {
  color: var(--booking-muted);
  font-size: 0.85rem;
  margin: 4px 0;
}

.doctor-specialization {
  color: var(--booking-accent);
  font-size: 0.88rem;
  margin: 0;
}

.bed-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 12px;
  margin-bottom: 12px;
}

.bed-price {
  font-size: 1.2rem;
  font-weight: 700;
}

.bed-card ul {
  padding-left: 18px;
  color: var(--booking-muted);
  font-size: 0.85rem;
}

.appointment-card dl {
  display: grid;
  grid-template-columns: max-content 1fr;
  gap: 6px 16px;
  margin: 12px 0 0;
}

.appointment-card dt {
  color: var(--booking-muted);
}

.appointment-card dd {
  margin: 0;
  font-weight: 600;
}

.booking-type-badge {
  display: inline-block;
  border-radius: 999px;
  padding: 2px 10px;
  font-size: 0.78rem;
  font-weight: 700;
  background: var(--booking-accent-soft);
  color: var(--booking-accent);
}

.booking-type-badge[data-kind="emergency"] {
  background: var(--booking-emergency-soft);
  color: var(--booking-emergency);
}

@media (max-width: 640px) {
  .chat-message {
    max-width: 90%;
  }

  .chat-log {
    height: 26rem;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document has no <head> element"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-booking-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
