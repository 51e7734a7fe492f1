//! Lab result interpretation in clinical context.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const SIGNIFICANCES: &[&str] = &["critical", "high", "moderate", "low"];
pub(crate) const FOLLOW_UP_URGENCIES: &[&str] =
    &["immediate", "within_24h", "within_week", "routine"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: ReferenceRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalContext {
    pub symptoms: Vec<String>,
    pub current_diagnoses: Vec<String>,
    pub medications: Vec<String>,
    pub age: u32,
    pub gender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabInterpretationInput {
    pub patient_id: String,
    pub lab_results: Vec<LabResult>,
    pub clinical_context: ClinicalContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSignificance {
    Critical,
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpUrgency {
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "within_24h")]
    Within24Hours,
    #[serde(rename = "within_week")]
    WithinWeek,
    #[serde(rename = "routine")]
    Routine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbnormalFinding {
    pub test: String,
    pub significance: FindingSignificance,
    pub clinical_implications: Vec<String>,
    pub possible_causes: Vec<String>,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedFollowUp {
    pub test: String,
    pub reason: String,
    pub urgency: FollowUpUrgency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabInterpretation {
    pub summary: String,
    pub abnormal_findings: Vec<AbnormalFinding>,
    pub suggested_follow_up: Vec<SuggestedFollowUp>,
    pub confidence: f64,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("lab-interpretation")
        .payload(Payload::Single)
        .fields(vec![
            required("summary", FieldKind::String)
                .hint("clinical summary of the lab findings in patient context"),
            required(
                "abnormalFindings",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("test", FieldKind::String),
                    required("significance", FieldKind::Enum(SIGNIFICANCES)),
                    required(
                        "clinicalImplications",
                        FieldKind::List(Box::new(FieldKind::String)),
                    ),
                    required(
                        "possibleCauses",
                        FieldKind::List(Box::new(FieldKind::String)),
                    ),
                    required(
                        "recommendedActions",
                        FieldKind::List(Box::new(FieldKind::String)),
                    ),
                ]))),
            ),
            required(
                "suggestedFollowUp",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("test", FieldKind::String),
                    required("reason", FieldKind::String),
                    required("urgency", FieldKind::Enum(FOLLOW_UP_URGENCIES)),
                ]))),
            ),
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
    "You are a clinical pathologist providing AI-assisted interpretation of \
     lab results in clinical context.\n\
     \n\
     Compare each value to its reference range, apply age and gender specific \
     considerations, and account for medication effects on lab values (e.g. \
     diuretics on electrolytes, statins on liver enzymes). Look for patterns \
     across multiple abnormal values (metabolic acidosis, liver dysfunction, \
     kidney disease). Significance grading: 'critical' is life-threatening or \
     needs immediate intervention, 'high' needs prompt attention, 'moderate' \
     should be addressed, 'low' may be clinically insignificant. Critical \
     values demand immediate attention regardless of other factors.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient ID: {patient_id}\n\
     \n\
     Lab Results:\n\
     {lab_results_info}\n\
     \n\
     Clinical Context:\n\
     Age: {age}\n\
     Gender: {gender}\n\
     Symptoms: {symptoms}\n\
     Current Diagnoses: {diagnoses}\n\
     Medications: {medications}",
);

fn lab_results_info(results: &[LabResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "- {}: {} {} (reference {}-{} {})",
                r.test_name, r.value, r.unit, r.reference_range.min, r.reference_range.max, r.unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn prompt(
    input: &LabInterpretationInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let context = &input.clinical_context;
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("patient_id", input.patient_id.clone()),
        ("lab_results_info", lab_results_info(&input.lab_results)),
        ("age", context.age.to_string()),
        ("gender", context.gender.clone()),
        ("symptoms", context.symptoms.join(", ")),
        ("diagnoses", context.current_diagnoses.join(", ")),
        ("medications", context.medications.join(", ")),
    ])
}
