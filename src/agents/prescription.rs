//! Clinical decision support for medication selection.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const EVIDENCE_LEVELS: &[&str] = &["A", "B", "C"];
pub(crate) const COST_LEVELS: &[&str] = &["low", "medium", "high"];
pub(crate) const WARNING_SEVERITIES: &[&str] = &["low", "moderate", "high"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidneyFunction {
    pub creatinine: f64,
    pub gfr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFactors {
    pub age: u32,
    pub weight: Option<f64>,
    pub kidney_function: Option<KidneyFunction>,
    pub liver_function: Option<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub comorbidities: Vec<String>,
    pub pregnancy: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    Oral,
    Iv,
    Im,
    Any,
}

impl RoutePreference {
    fn as_str(self) -> &'static str {
        match self {
            RoutePreference::Oral => "oral",
            RoutePreference::Iv => "iv",
            RoutePreference::Im => "im",
            RoutePreference::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionPreferences {
    pub cost_sensitive: Option<bool>,
    pub prefer_generic: Option<bool>,
    pub route_preference: Option<RoutePreference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInput {
    pub diagnosis: String,
    pub patient_factors: PatientFactors,
    pub preferences: Option<PrescriptionPreferences>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceLevel {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationCost {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryRecommendation {
    pub medication: String,
    pub dose: String,
    pub frequency: String,
    pub duration: String,
    pub route: String,
    pub rationale: String,
    pub evidence_level: EvidenceLevel,
    pub cost: MedicationCost,
    pub side_effects: Vec<String>,
    pub monitoring: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeMedication {
    pub medication: String,
    pub when_to_consider: String,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionWarning {
    pub interaction: String,
    pub severity: WarningSeverity,
    pub management: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRecommendation {
    pub primary_recommendations: Vec<PrimaryRecommendation>,
    pub alternatives: Vec<AlternativeMedication>,
    pub contraindications: Vec<String>,
    pub warnings: Vec<String>,
    pub drug_interactions: Vec<InteractionWarning>,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("prescription")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "primaryRecommendations",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("medication", FieldKind::String)
                        .hint("generic name unless a brand is specifically indicated"),
                    required("dose", FieldKind::String),
                    required("frequency", FieldKind::String),
                    required("duration", FieldKind::String),
                    required("route", FieldKind::String),
                    required("rationale", FieldKind::String),
                    required("evidenceLevel", FieldKind::Enum(EVIDENCE_LEVELS)),
                    required("cost", FieldKind::Enum(COST_LEVELS)),
                    required("sideEffects", FieldKind::List(Box::new(FieldKind::String))),
                    required("monitoring", FieldKind::List(Box::new(FieldKind::String)))
                        .hint("parameters to monitor, e.g. liver function tests"),
                ]))),
            ),
            required(
                "alternatives",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("medication", FieldKind::String),
                    required("whenToConsider", FieldKind::String),
                    required("advantages", FieldKind::List(Box::new(FieldKind::String))),
                    required(
                        "disadvantages",
                        FieldKind::List(Box::new(FieldKind::String)),
                    ),
                ]))),
            ),
            required(
                "contraindications",
                FieldKind::List(Box::new(FieldKind::String)),
            )
            .hint("medications or classes to avoid for this patient"),
            required("warnings", FieldKind::List(Box::new(FieldKind::String))),
            required(
                "drugInteractions",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("interaction", FieldKind::String),
                    required("severity", FieldKind::Enum(WARNING_SEVERITIES)),
                    required("management", FieldKind::String),
                ]))),
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a clinical pharmacist providing evidence-based medication \
     recommendations for a diagnosis and patient profile.\n\
     \n\
     Adjust dosing for age, weight, kidney function (reduce dose or extend \
     interval for low GFR) and hepatic impairment. Absolutely avoid allergy \
     contraindicated medications, check every interaction with current \
     medications, consider disease-drug interactions, and use pregnancy-safe \
     alternatives when relevant. Evidence grading: 'A' is strong evidence from \
     well-designed studies, 'B' moderate evidence or expert consensus, 'C' \
     limited evidence or expert opinion. Honor the stated preferences when \
     options are clinically equivalent.\n\
     \n\
     {format_instructions}\n\
     \n\
     Diagnosis: {diagnosis}\n\
     \n\
     Patient Factors:\n\
     Age: {age}\n\
     {weight_info}\n\
     {kidney_function_info}\n\
     {liver_function_info}\n\
     Allergies: {allergies}\n\
     Current Medications: {current_medications}\n\
     Comorbidities: {comorbidities}\n\
     {pregnancy_info}\n\
     \n\
     Preferences:\n\
     {preferences_info}",
);

fn preferences_info(preferences: Option<&PrescriptionPreferences>) -> String {
    let Some(preferences) = preferences else {
        return "None stated".to_string();
    };
    let mut lines = Vec::new();
    if let Some(cost_sensitive) = preferences.cost_sensitive {
        lines.push(format!("Cost Sensitive: {cost_sensitive}"));
    }
    if let Some(prefer_generic) = preferences.prefer_generic {
        lines.push(format!("Prefer Generic: {prefer_generic}"));
    }
    if let Some(route) = preferences.route_preference {
        lines.push(format!("Route Preference: {}", route.as_str()));
    }
    if lines.is_empty() {
        "None stated".to_string()
    } else {
        lines.join("\n")
    }
}

pub(crate) fn prompt(
    input: &PrescriptionInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let factors = &input.patient_factors;
    let weight_info = factors
        .weight
        .map(|w| format!("Weight: {w} kg"))
        .unwrap_or_default();
    let kidney_function_info = factors
        .kidney_function
        .as_ref()
        .map(|k| {
            format!(
                "Kidney Function: creatinine {}, GFR {}",
                k.creatinine, k.gfr
            )
        })
        .unwrap_or_default();
    let liver_function_info = factors
        .liver_function
        .as_deref()
        .map(|l| format!("Liver Function: {l}"))
        .unwrap_or_default();
    let pregnancy_info = factors
        .pregnancy
        .map(|p| format!("Pregnancy: {p}"))
        .unwrap_or_default();

    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("diagnosis", input.diagnosis.clone()),
        ("age", factors.age.to_string()),
        ("weight_info", weight_info),
        ("kidney_function_info", kidney_function_info),
        ("liver_function_info", liver_function_info),
        ("allergies", factors.allergies.join(", ")),
        (
            "current_medications",
            factors.current_medications.join(", "),
        ),
        ("comorbidities", factors.comorbidities.join(", ")),
        ("pregnancy_info", pregnancy_info),
        (
            "preferences_info",
            preferences_info(input.preferences.as_ref()),
        ),
    ])
}
