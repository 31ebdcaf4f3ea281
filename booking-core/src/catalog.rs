//! Fixed option lists offered during the conversation.

use serde::{Deserialize, Serialize};

pub const COMMON_SYMPTOMS: [&str; 15] = [
    "Fever",
    "Headache",
    "Cough",
    "Sore throat",
    "Body ache",
    "Nausea",
    "Vomiting",
    "Diarrhea",
    "Chest pain",
    "Shortness of breath",
    "Dizziness",
    "Fatigue",
    "Loss of appetite",
    "Stomach pain",
    "Joint pain",
];

/// A bed or cabin that can be added to the appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BedOption {
    #[serde(rename = "type")]
    pub kind: String,
    /// Price per night.
    pub price: u32,
    pub features: Vec<String>,
}

impl BedOption {
    fn new(kind: &str, price: u32, features: &[&str]) -> Self {
        Self {
            kind: kind.to_string(),
            price,
            features: features.iter().map(|feature| feature.to_string()).collect(),
        }
    }
}

pub fn bed_options() -> Vec<BedOption> {
    vec![
        BedOption::new("General Bed", 100, &["1 bed", "1 chair", "bed table"]),
        BedOption::new(
            "General Cabin",
            1000,
            &[
                "2 beds",
                "attached washroom",
                "bed table",
                "chair",
                "food x3 times",
            ],
        ),
        BedOption::new(
            "VIP Cabin",
            4000,
            &[
                "premium bed x2",
                "sofa",
                "Air Conditioning",
                "attached washroom",
                "TV",
                "fridge",
                "bed table x2",
                "coffee table",
                "2 chairs",
            ],
        ),
    ]
}

/// Selection state behind the symptom step: catalog toggles plus free-form
/// additions, kept in insertion order without duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymptomPicker {
    selected: Vec<String>,
}

impl SymptomPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, symptom: &str) -> bool {
        self.selected.iter().any(|item| item == symptom)
    }

    /// Returns `true` when the symptom ends up selected.
    pub fn toggle(&mut self, symptom: &str) -> bool {
        if self.is_selected(symptom) {
            self.remove(symptom);
            false
        } else {
            self.selected.push(symptom.to_string());
            true
        }
    }

    /// Adds a typed symptom. Blank or already selected entries are ignored.
    pub fn add_custom(&mut self, symptom: &str) -> bool {
        let symptom = symptom.trim();
        if symptom.is_empty() || self.is_selected(symptom) {
            return false;
        }
        self.selected.push(symptom.to_string());
        true
    }

    pub fn remove(&mut self, symptom: &str) {
        self.selected.retain(|item| item != symptom);
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn into_selected(self) -> Vec<String> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_selects_then_clears() {
        let mut picker = SymptomPicker::new();
        assert!(picker.toggle("Fever"));
        assert!(picker.toggle("Cough"));
        assert!(!picker.toggle("Fever"));
        assert_eq!(picker.selected(), ["Cough".to_string()]);
    }

    #[test]
    fn custom_symptoms_are_trimmed_and_deduplicated() {
        let mut picker = SymptomPicker::new();
        assert!(picker.add_custom("  Rash "));
        assert!(!picker.add_custom("Rash"));
        assert!(!picker.add_custom("   "));
        picker.toggle("Fever");
        assert_eq!(picker.into_selected(), vec!["Rash", "Fever"]);
    }

    #[test]
    fn bed_catalog_serializes_kind_as_type() {
        let options = bed_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[2].kind, "VIP Cabin");
        assert_eq!(options[2].features.len(), 9);

        let value = serde_json::to_value(&options[0]).expect("serialize bed");
        assert_eq!(value["type"], "General Bed");
        assert_eq!(value["price"], 100);
    }
}
