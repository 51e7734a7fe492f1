//! Raw clinical notes into structured medical documentation.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationInput {
    /// Raw clinical notes or observations.
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedNotes {
    /// Structured summary in standard medical record format.
    pub summary: String,
    pub confidence: f64,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("summarization")
        .payload(Payload::Single)
        .fields(vec![
            required("summary", FieldKind::String)
                .hint("structured summary with medical section headers"),
            required(
                "confidence",
                FieldKind::Float {
                    min: Some(0.0),
                    max: Some(1.0),
                },
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a medical documentation specialist that transforms raw clinical \
     notes into structured, formatted medical documentation.\n\
     \n\
     Transform the notes into a well-structured summary with the standard \
     sections: Chief Complaint, HPI (History of Present Illness), Past Medical \
     History, Vitals, Physical Examination, Assessment, and Plan. Use standard \
     medical terminology and abbreviations, preserve every clinically relevant \
     detail, and format with clear section headers and line breaks.\n\
     \n\
     {format_instructions}\n\
     \n\
     Raw Clinical Notes:\n\
     {notes}",
);

pub(crate) fn prompt(
    input: &SummarizationInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("notes", input.notes.clone()),
    ])
}
