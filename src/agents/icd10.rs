//! ICD-10 code suggestions for a clinical diagnosis description.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Icd10Input {
    /// Free-text diagnosis description to code.
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icd10Suggestion {
    pub code: String,
    pub desc: String,
    pub confidence: u8,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("icd10")
        .payload(Payload::Many)
        .fields(vec![
            required("code", FieldKind::String).hint("the ICD-10 code"),
            required("desc", FieldKind::String).hint("the official ICD-10-CM description"),
            required(
                "confidence",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .hint("confidence percentage for this code match"),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a medical coding specialist that suggests appropriate ICD-10 \
     diagnosis codes based on clinical diagnosis descriptions.\n\
     \n\
     Given a clinical diagnosis, suggest 2-5 codes from the official ICD-10-CM \
     coding system, ranked by confidence. Prefer the most specific code \
     available, include related codes when applicable (e.g. with and without \
     complications), and quote the official description exactly.\n\
     \n\
     {format_instructions}\n\
     \n\
     Clinical Diagnosis:\n\
     {diagnosis}",
);

pub(crate) fn prompt(input: &Icd10Input, format_instructions: &str) -> Result<String, RenderError> {
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("diagnosis", input.diagnosis.clone()),
    ])
}
