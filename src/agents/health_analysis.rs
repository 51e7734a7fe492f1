//! Comprehensive health analysis combining symptoms, vitals and history.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const CONDITION_SEVERITIES: &[&str] = &["mild", "moderate", "severe"];
pub(crate) const URGENCIES: &[&str] = &["routine", "urgent", "emergency"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsReading {
    /// e.g. `"120/80"`.
    pub blood_pressure: String,
    pub heart_rate: String,
    pub temperature: String,
    pub oxygen_sat: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysisInput {
    pub age: String,
    pub gender: String,
    /// Comma-separated symptoms.
    pub symptoms: String,
    pub vitals: VitalsReading,
    pub medical_history: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionSeverity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisUrgency {
    Routine,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub probability: u8,
    pub severity: ConditionSeverity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedDoctor {
    pub name: String,
    pub specialty: String,
    #[serde(rename = "match")]
    pub match_score: u8,
    pub availability: String,
    pub experience: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysis {
    pub conditions: Vec<Condition>,
    pub recommended_doctors: Vec<RecommendedDoctor>,
    pub remedies: Vec<String>,
    pub urgency: AnalysisUrgency,
    pub confidence: u8,
    pub risk_factors: Vec<String>,
    pub follow_up_recommendations: Vec<String>,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("health-analysis")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "conditions",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("name", FieldKind::String),
                    required(
                        "probability",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    ),
                    required("severity", FieldKind::Enum(CONDITION_SEVERITIES)),
                    required("description", FieldKind::String),
                ]))),
            )
            .hint("possible conditions ranked by probability"),
            required(
                "recommendedDoctors",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("name", FieldKind::String),
                    required("specialty", FieldKind::String),
                    required(
                        "match",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    ),
                    required("availability", FieldKind::String),
                    required("experience", FieldKind::String),
                    required(
                        "rating",
                        FieldKind::Float {
                            min: Some(0.0),
                            max: Some(5.0),
                        },
                    ),
                ]))),
            )
            .hint("specialists ranked by match score"),
            required("remedies", FieldKind::List(Box::new(FieldKind::String)))
                .hint("immediate care recommendations"),
            required("urgency", FieldKind::Enum(URGENCIES)),
            required(
                "confidence",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            ),
            required("riskFactors", FieldKind::List(Box::new(FieldKind::String))),
            required(
                "followUpRecommendations",
                FieldKind::List(Box::new(FieldKind::String)),
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are an advanced medical analysis engine that combines symptoms, vital \
     signs and medical history into detailed clinical insights.\n\
     \n\
     Analyze vital signs in context (e.g. elevated blood pressure with \
     neurological symptoms suggests hypertensive emergency), consider age and \
     gender specific risk factors, and weigh medical history in condition \
     probability and urgency. Rank conditions by probability and doctors by \
     match score, highest first; recommend realistic specialists. Urgency \
     grading: 'routine' can schedule a regular appointment, 'urgent' needs \
     same-day or next-day evaluation, 'emergency' needs immediate attention.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient Information:\n\
     Age: {age}\n\
     Gender: {gender}\n\
     Symptoms: {symptoms}\n\
     Vitals:\n\
     - Blood Pressure: {blood_pressure}\n\
     - Heart Rate: {heart_rate}\n\
     - Temperature: {temperature}\n\
     - Oxygen Saturation: {oxygen_sat}\n\
     {medical_history_info}",
);

pub(crate) fn prompt(
    input: &HealthAnalysisInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let medical_history_info = match input.medical_history.as_deref() {
        Some(history) if !history.is_empty() => {
            format!("Medical History: {}", history.join(", "))
        }
        _ => String::new(),
    };

    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("age", input.age.clone()),
        ("gender", input.gender.clone()),
        ("symptoms", input.symptoms.clone()),
        ("blood_pressure", input.vitals.blood_pressure.clone()),
        ("heart_rate", input.vitals.heart_rate.clone()),
        ("temperature", input.vitals.temperature.clone()),
        ("oxygen_sat", input.vitals.oxygen_sat.clone()),
        ("medical_history_info", medical_history_info),
    ])
}
