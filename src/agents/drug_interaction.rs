//! Pairwise and multi-drug interaction checking.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, optional, required};

pub(crate) const SEVERITIES: &[&str] = &["low", "moderate", "high", "severe"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugInteractionInput {
    /// Medication names under prescription.
    pub drugs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    Low,
    Moderate,
    High,
    Severe,
}

/// One identified interaction. An empty reply list means no interactions were
/// found and is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugInteraction {
    pub severity: InteractionSeverity,
    pub msg: String,
    pub drugs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("drug-interaction")
        .payload(Payload::Many)
        .fields(vec![
            required("severity", FieldKind::Enum(SEVERITIES)),
            required("msg", FieldKind::String)
                .hint("description of the interaction and its clinical effects"),
            required("drugs", FieldKind::List(Box::new(FieldKind::String)))
                .hint("the drug names involved in this interaction"),
            optional("recommendation", FieldKind::String)
                .hint("clinical recommendation for managing the interaction"),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a clinical pharmacist and drug interaction specialist.\n\
     \n\
     Given a list of medications, analyze all possible pairwise and multi-drug \
     interactions, considering pharmacokinetic effects (metabolism, absorption, \
     excretion) and pharmacodynamic effects (additive effects, antagonism). \
     Severity grading: 'low' is minor with minimal clinical significance, \
     'moderate' may require monitoring or dose adjustment, 'high' requires \
     close monitoring or intervention, 'severe' is contraindicated or requires \
     immediate action. Order interactions most severe first and provide \
     specific, actionable recommendations when available. If no interactions \
     are found, return an empty array.\n\
     \n\
     {format_instructions}\n\
     \n\
     Medications:\n\
     {drugs}",
);

pub(crate) fn prompt(
    input: &DrugInteractionInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("drugs", input.drugs.join(", ")),
    ])
}
