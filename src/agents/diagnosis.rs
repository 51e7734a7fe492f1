//! Symptom analysis with ICD-10-coded diagnosis suggestions.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisInput {
    /// Symptom descriptions, e.g. `["fever", "dry cough"]`.
    pub symptoms: Vec<String>,
}

/// One suggested diagnosis. The endpoint always replies with a list, even when
/// the model collapses a one-item result to a bare object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub diagnosis: String,
    pub icd10: String,
    pub confidence: u8,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("diagnosis")
        .payload(Payload::Many)
        .fields(vec![
            required("diagnosis", FieldKind::String).hint("the primary diagnosis name"),
            required("icd10", FieldKind::String).hint("the corresponding ICD-10 code"),
            required(
                "confidence",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .hint("confidence percentage"),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a medical diagnosis assistant that analyzes patient symptoms and \
     provides possible diagnoses with ICD-10 codes.\n\
     \n\
     Given the patient's symptoms, provide a list of possible diagnoses ranked \
     by confidence, highest first. Use accurate, standard ICD-10 codes in valid \
     format (e.g. A00.0, J11.1, G43.909); if uncertain about a code, use the \
     most appropriate general code for that condition category. Return at \
     least 2-3 possible diagnoses if applicable.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient Symptoms:\n\
     {symptoms}",
);

pub(crate) fn prompt(
    input: &DiagnosisInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("symptoms", input.symptoms.join(", ")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_symptoms_and_instructions() {
        let input = DiagnosisInput {
            symptoms: vec!["fever".to_string(), "dry cough".to_string()],
        };
        let rendered = prompt(&input, "FORMAT BLOCK").unwrap();
        assert!(rendered.contains("fever, dry cough"));
        assert!(rendered.contains("FORMAT BLOCK"));
    }
}
