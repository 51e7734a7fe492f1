//! Medication adherence prediction from demographics, prescription complexity
//! and history.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const RISK_LEVELS: &[&str] = &["low", "moderate", "high", "very_high"];
pub(crate) const PRIORITIES: &[&str] = &["low", "medium", "high"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocioeconomicStatus {
    Low,
    Medium,
    High,
}

impl SocioeconomicStatus {
    fn as_str(self) -> &'static str {
        match self {
            SocioeconomicStatus::Low => "low",
            SocioeconomicStatus::Medium => "medium",
            SocioeconomicStatus::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age: u32,
    pub socioeconomic_status: Option<SocioeconomicStatus>,
    pub education: Option<String>,
    pub employment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionLoad {
    pub medication_count: u32,
    pub doses_per_day: u32,
    /// 1-10 scale.
    pub complexity: u32,
    /// Days.
    pub duration: u32,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceHistory {
    /// 0-100.
    pub previous_adherence_rate: Option<f64>,
    pub missed_appointments: Option<u32>,
    pub has_support: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceInput {
    pub patient_id: String,
    pub demographics: Demographics,
    pub prescription: PrescriptionLoad,
    pub history: AdherenceHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceRiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceRiskFactor {
    pub factor: String,
    pub impact: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub strategy: String,
    pub expected_improvement: u8,
    pub priority: InterventionPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherencePrediction {
    pub adherence_probability: u8,
    pub risk_level: AdherenceRiskLevel,
    pub risk_factors: Vec<AdherenceRiskFactor>,
    pub interventions: Vec<Intervention>,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("adherence")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "adherenceProbability",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .hint("higher means more likely to adhere"),
            required("riskLevel", FieldKind::Enum(RISK_LEVELS)),
            required(
                "riskFactors",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("factor", FieldKind::String),
                    required(
                        "impact",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    )
                    .hint("how much this factor reduces adherence probability"),
                    required("description", FieldKind::String),
                ]))),
            ),
            required(
                "interventions",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("strategy", FieldKind::String),
                    required(
                        "expectedImprovement",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    ),
                    required("priority", FieldKind::Enum(PRIORITIES)),
                ]))),
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a medication adherence prediction specialist.\n\
     \n\
     Risk grading: 'low' means over 80% adherence probability, 'moderate' \
     60-80%, 'high' 40-60%, 'very_high' under 40%. Previous adherence rate is \
     the strongest predictor; medication count, doses per day, complexity, \
     duration and cost all raise non-adherence risk; social support improves \
     it. Identify every relevant risk factor, not only the obvious ones, and \
     recommend evidence-based, feasible interventions prioritized by impact.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient ID: {patient_id}\n\
     \n\
     Demographics:\n\
     Age: {age}\n\
     Socioeconomic Status: {socioeconomic_status}\n\
     Education: {education}\n\
     Employment Status: {employment_status}\n\
     \n\
     Prescription Details:\n\
     Number of Medications: {medication_count}\n\
     Doses Per Day: {doses_per_day}\n\
     Complexity (1-10): {complexity}\n\
     Duration: {duration} days\n\
     Cost: {cost}\n\
     \n\
     Adherence History:\n\
     Previous Adherence Rate: {previous_adherence}\n\
     Missed Appointments: {missed_appointments}\n\
     Has Support: {has_support}",
);

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn prompt(
    input: &AdherenceInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let demographics = &input.demographics;
    let prescription = &input.prescription;
    let history = &input.history;
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("patient_id", input.patient_id.clone()),
        ("age", demographics.age.to_string()),
        (
            "socioeconomic_status",
            or_unknown(
                demographics
                    .socioeconomic_status
                    .map(|s| s.as_str().to_string()),
            ),
        ),
        ("education", or_unknown(demographics.education.clone())),
        (
            "employment_status",
            or_unknown(demographics.employment_status.clone()),
        ),
        ("medication_count", prescription.medication_count.to_string()),
        ("doses_per_day", prescription.doses_per_day.to_string()),
        ("complexity", prescription.complexity.to_string()),
        ("duration", prescription.duration.to_string()),
        (
            "cost",
            or_unknown(prescription.cost.map(|c| format!("{c:.2}"))),
        ),
        (
            "previous_adherence",
            or_unknown(history.previous_adherence_rate.map(|r| format!("{r}%"))),
        ),
        (
            "missed_appointments",
            or_unknown(history.missed_appointments.map(|n| n.to_string())),
        ),
        (
            "has_support",
            or_unknown(history.has_support.map(|b| b.to_string())),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_history_fields_render_as_unknown() {
        let input = AdherenceInput {
            patient_id: "p-1".to_string(),
            demographics: Demographics {
                age: 67,
                socioeconomic_status: Some(SocioeconomicStatus::Low),
                education: None,
                employment_status: None,
            },
            prescription: PrescriptionLoad {
                medication_count: 6,
                doses_per_day: 4,
                complexity: 8,
                duration: 90,
                cost: None,
            },
            history: AdherenceHistory {
                previous_adherence_rate: None,
                missed_appointments: Some(3),
                has_support: None,
            },
        };
        let rendered = prompt(&input, "FORMAT").unwrap();
        assert!(rendered.contains("Socioeconomic Status: low"));
        assert!(rendered.contains("Education: unknown"));
        assert!(rendered.contains("Previous Adherence Rate: unknown"));
        assert!(rendered.contains("Missed Appointments: 3"));
    }

    #[test]
    fn very_high_risk_uses_snake_case_wire_name() {
        let level: AdherenceRiskLevel = serde_json::from_str("\"very_high\"").unwrap();
        assert_eq!(level, AdherenceRiskLevel::VeryHigh);
    }
}
