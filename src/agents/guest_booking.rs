//! Triage of guest symptoms at booking time: urgency, likely conditions and
//! the department to route the booking to.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const URGENCY_LEVELS: &[&str] = &["Normal", "High", "Emergency"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestBookingInput {
    /// Tagged symptoms selected in the booking form.
    pub symptoms: Vec<String>,
    /// Free-text symptom description.
    pub user_description: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrgencyLevel {
    Normal,
    High,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPrediction {
    pub urgency_level: UrgencyLevel,
    pub possible_conditions: Vec<String>,
    pub recommended_department: String,
    pub summary: String,
    pub confidence_score: f64,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("guest-booking")
        .payload(Payload::Single)
        .fields(vec![
            required("urgency_level", FieldKind::Enum(URGENCY_LEVELS)),
            required(
                "possible_conditions",
                FieldKind::List(Box::new(FieldKind::String)),
            )
            .hint("possible medical conditions ranked by likelihood"),
            required("recommended_department", FieldKind::String)
                .hint("the appropriate medical department or specialty"),
            required("summary", FieldKind::String).hint("comprehensive clinical summary"),
            required(
                "confidence_score",
                FieldKind::Float {
                    min: Some(0.0),
                    max: Some(1.0),
                },
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a medical triage and prediction assistant that analyzes guest \
     symptoms during booking to predict urgency, possible conditions and the \
     appropriate department.\n\
     \n\
     Urgency grading: 'Normal' means routine symptoms that can wait for a \
     scheduled appointment, 'High' means prompt evaluation within a day, \
     'Emergency' means immediate medical attention, consider an ER visit. \
     Factor in demographics and medical history: age-specific presentations, \
     gender-specific conditions, and history that escalates urgency (e.g. \
     cardiac symptoms with known heart disease). Write a summary that explains \
     the clinical reasoning.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient Information:\n\
     Symptoms: {symptoms}\n\
     Description: {user_description}\n\
     {age_info}\n\
     {gender_info}\n\
     {medical_history_info}",
);

pub(crate) fn prompt(
    input: &GuestBookingInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let age_info = input
        .age
        .map(|age| format!("Age: {age}"))
        .unwrap_or_default();
    let gender_info = input
        .gender
        .as_deref()
        .map(|gender| format!("Gender: {gender}"))
        .unwrap_or_default();
    let medical_history_info = match input.medical_history.as_deref() {
        Some(history) if !history.is_empty() => {
            format!("Medical History: {}", history.join(", "))
        }
        _ => String::new(),
    };

    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("symptoms", input.symptoms.join(", ")),
        ("user_description", input.user_description.clone()),
        ("age_info", age_info),
        ("gender_info", gender_info),
        ("medical_history_info", medical_history_info),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_render_empty_when_absent() {
        let input = GuestBookingInput {
            symptoms: vec!["chest pain".to_string()],
            user_description: "pressure when climbing stairs".to_string(),
            age: None,
            gender: None,
            medical_history: None,
        };
        let rendered = prompt(&input, "FORMAT").unwrap();
        assert!(rendered.contains("Symptoms: chest pain"));
        assert!(!rendered.contains("Age:"));
        assert!(!rendered.contains("Medical History:"));
    }

    #[test]
    fn optional_sections_render_when_present() {
        let input = GuestBookingInput {
            symptoms: vec!["chest pain".to_string()],
            user_description: "pressure".to_string(),
            age: Some(61),
            gender: Some("male".to_string()),
            medical_history: Some(vec!["hypertension".to_string(), "CAD".to_string()]),
        };
        let rendered = prompt(&input, "FORMAT").unwrap();
        assert!(rendered.contains("Age: 61"));
        assert!(rendered.contains("Gender: male"));
        assert!(rendered.contains("Medical History: hypertension, CAD"));
    }

    #[test]
    fn urgency_level_uses_capitalized_wire_names() {
        assert_eq!(
            serde_json::to_string(&UrgencyLevel::Emergency).unwrap(),
            "\"Emergency\""
        );
    }
}
