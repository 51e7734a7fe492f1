//! Thirty-day readmission risk prediction at discharge.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, optional, required};

pub(crate) const RISK_CATEGORIES: &[&str] = &["low", "moderate", "high", "very_high"];
pub(crate) const COST_LEVELS: &[&str] = &["low", "medium", "high"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialSupport {
    None,
    Limited,
    Moderate,
    Strong,
}

impl SocialSupport {
    fn as_str(self) -> &'static str {
        match self {
            SocialSupport::None => "none",
            SocialSupport::Limited => "limited",
            SocialSupport::Moderate => "moderate",
            SocialSupport::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeDemographics {
    pub age: u32,
    pub gender: String,
    pub insurance: String,
    pub social_support: SocialSupport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalData {
    pub primary_diagnosis: String,
    pub comorbidities: Vec<String>,
    pub length_of_stay: u32,
    pub previous_admissions: u32,
    pub emergency_visits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeInfo {
    pub medications: u32,
    pub follow_up_scheduled: bool,
    pub home_health_ordered: bool,
    pub patient_education_provided: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmissionInput {
    pub patient_id: String,
    pub demographics: DischargeDemographics,
    pub clinical_data: ClinicalData,
    pub discharge: DischargeInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionCost {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRiskFactor {
    pub factor: String,
    /// Percentage contribution to overall risk.
    pub contribution: u8,
    pub modifiable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreventativeIntervention {
    pub intervention: String,
    pub expected_risk_reduction: u8,
    pub cost: InterventionCost,
    /// 1-10 scale, 10 is highest.
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmissionRisk {
    pub risk_score: u8,
    pub risk_category: RiskCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_days: Option<u32>,
    pub top_risk_factors: Vec<TopRiskFactor>,
    pub preventative_interventions: Vec<PreventativeIntervention>,
    pub confidence: f64,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("readmission")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "riskScore",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .hint("likelihood of readmission within 30 days"),
            required("riskCategory", FieldKind::Enum(RISK_CATEGORIES)),
            optional("predictedDays", FieldKind::Int { min: None, max: None })
                .hint("days post-discharge when readmission is most likely; only when risk is moderate or higher"),
            required(
                "topRiskFactors",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("factor", FieldKind::String),
                    required(
                        "contribution",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    ),
                    required("modifiable", FieldKind::Bool),
                ]))),
            ),
            required(
                "preventativeInterventions",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("intervention", FieldKind::String),
                    required(
                        "expectedRiskReduction",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    ),
                    required("cost", FieldKind::Enum(COST_LEVELS)),
                    required(
                        "priority",
                        FieldKind::Int {
                            min: Some(1),
                            max: Some(10),
                        },
                    ),
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
    "You are a healthcare analytics specialist predicting patient readmission \
     risk within 30 days of discharge.\n\
     \n\
     Risk grading: 'low' is a score under 30, 'moderate' 30-50, 'high' 50-70, \
     'very_high' over 70. Strong predictors: previous admissions and emergency \
     visits, multiple comorbidities, CHF/COPD/pneumonia as primary diagnosis, \
     polypharmacy, absent follow-up, and weak social support. Rank risk \
     factors by contribution and interventions by priority and expected \
     impact, focusing interventions on modifiable factors.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient ID: {patient_id}\n\
     \n\
     Demographics:\n\
     Age: {age}\n\
     Gender: {gender}\n\
     Insurance: {insurance}\n\
     Social Support: {social_support}\n\
     \n\
     Clinical Data:\n\
     Primary Diagnosis: {primary_diagnosis}\n\
     Comorbidities: {comorbidities}\n\
     Length of Stay: {length_of_stay} days\n\
     Previous Admissions: {previous_admissions}\n\
     Emergency Visits: {emergency_visits}\n\
     \n\
     Discharge Information:\n\
     Number of Medications: {medications}\n\
     Follow-up Scheduled: {follow_up_scheduled}\n\
     Home Health Ordered: {home_health_ordered}\n\
     Patient Education Provided: {patient_education_provided}",
);

pub(crate) fn prompt(
    input: &ReadmissionInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let demographics = &input.demographics;
    let clinical = &input.clinical_data;
    let discharge = &input.discharge;
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("patient_id", input.patient_id.clone()),
        ("age", demographics.age.to_string()),
        ("gender", demographics.gender.clone()),
        ("insurance", demographics.insurance.clone()),
        (
            "social_support",
            demographics.social_support.as_str().to_string(),
        ),
        ("primary_diagnosis", clinical.primary_diagnosis.clone()),
        ("comorbidities", clinical.comorbidities.join(", ")),
        ("length_of_stay", clinical.length_of_stay.to_string()),
        (
            "previous_admissions",
            clinical.previous_admissions.to_string(),
        ),
        ("emergency_visits", clinical.emergency_visits.to_string()),
        ("medications", discharge.medications.to_string()),
        (
            "follow_up_scheduled",
            discharge.follow_up_scheduled.to_string(),
        ),
        (
            "home_health_ordered",
            discharge.home_health_ordered.to_string(),
        ),
        (
            "patient_education_provided",
            discharge.patient_education_provided.to_string(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn predicted_days_is_omitted_when_absent() {
        let risk = ReadmissionRisk {
            risk_score: 22,
            risk_category: RiskCategory::Low,
            predicted_days: None,
            top_risk_factors: vec![],
            preventative_interventions: vec![],
            confidence: 0.8,
        };
        let wire = serde_json::to_value(&risk).unwrap();
        assert_eq!(
            wire,
            json!({
                "riskScore": 22,
                "riskCategory": "low",
                "topRiskFactors": [],
                "preventativeInterventions": [],
                "confidence": 0.8
            })
        );
    }
}
