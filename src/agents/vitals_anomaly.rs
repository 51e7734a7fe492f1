//! Real-time vital signs anomaly detection with alert levels.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
pub(crate) const TREND_DIRECTIONS: &[&str] = &["stable", "improving", "worsening"];
pub(crate) const ALERT_LEVELS: &[&str] = &[
    "none",
    "monitor",
    "notify_nurse",
    "notify_doctor",
    "emergency",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressureReading {
    pub systolic: f64,
    pub diastolic: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSample {
    pub heart_rate: Option<f64>,
    pub blood_pressure: Option<BloodPressureReading>,
    /// Celsius.
    pub temperature: Option<f64>,
    /// Percentage.
    pub oxygen_saturation: Option<f64>,
    pub respiratory_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBaseline {
    pub heart_rate: Option<VitalRange>,
    pub blood_pressure: Option<BloodPressureReading>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContext {
    pub age: u32,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub baseline: Option<PatientBaseline>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsAnomalyInput {
    pub patient_id: String,
    /// ISO-8601 timestamp of the sample.
    pub timestamp: String,
    pub vitals: VitalsSample,
    pub patient_context: PatientContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Stable,
    Improving,
    Worsening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    None,
    Monitor,
    NotifyNurse,
    NotifyDoctor,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalAnomaly {
    /// Blood pressure is reported as separate systolic/diastolic anomalies so
    /// this stays a single number.
    pub vital_sign: String,
    pub current_value: f64,
    pub expected_range: ExpectedRange,
    pub deviation_score: f64,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    pub is_anomaly: bool,
    pub severity: AnomalySeverity,
    pub anomalies: Vec<VitalAnomaly>,
    pub recommendations: Vec<String>,
    pub alert_level: AlertLevel,
    pub confidence: f64,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("vitals-anomaly")
        .payload(Payload::Single)
        .fields(vec![
            required("isAnomaly", FieldKind::Bool),
            required("severity", FieldKind::Enum(SEVERITIES)),
            required(
                "anomalies",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("vitalSign", FieldKind::String)
                        .hint("e.g. heartRate, bloodPressureSystolic, oxygenSaturation"),
                    required("currentValue", FieldKind::Float { min: None, max: None })
                        .hint("the measured value as a number, never a string"),
                    required(
                        "expectedRange",
                        FieldKind::Object(vec![
                            required("min", FieldKind::Float { min: None, max: None }),
                            required("max", FieldKind::Float { min: None, max: None }),
                        ]),
                    ),
                    required(
                        "deviationScore",
                        FieldKind::Float {
                            min: Some(0.0),
                            max: Some(1.0),
                        },
                    )
                    .hint("0 is normal, 1 is extreme"),
                    required("trendDirection", FieldKind::Enum(TREND_DIRECTIONS)),
                ]))),
            ),
            required(
                "recommendations",
                FieldKind::List(Box::new(FieldKind::String)),
            )
            .hint("specific clinical actions"),
            required("alertLevel", FieldKind::Enum(ALERT_LEVELS)),
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
    "You are a critical care monitoring system that performs real-time \
     analysis of patient vital signs to detect anomalies and trigger alerts.\n\
     \n\
     Compare current vitals to the patient baseline if provided, otherwise use \
     age-appropriate standard ranges: heart rate 60-100 bpm (adult), blood \
     pressure under 120/80 normal and 140/90 or above hypertensive, \
     temperature 36.1-37.2 C, oxygen saturation 95% or above normal and under \
     90% critical, respiratory rate 12-20/min (adult). Report blood pressure \
     as separate bloodPressureSystolic and bloodPressureDiastolic anomalies \
     with numeric values. Account for conditions and medications that shift \
     normal ranges (e.g. beta-blockers lower heart rate). Multiple anomalies \
     raise overall severity; critical vitals trigger emergency alerts.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient ID: {patient_id}\n\
     Timestamp: {timestamp}\n\
     \n\
     Current Vital Signs:\n\
     {vitals_info}\n\
     \n\
     Patient Context:\n\
     Age: {age}\n\
     Conditions: {conditions}\n\
     Medications: {medications}\n\
     {baseline_info}",
);

fn vitals_info(vitals: &VitalsSample) -> String {
    let mut lines = Vec::new();
    if let Some(hr) = vitals.heart_rate {
        lines.push(format!("Heart Rate: {hr} bpm"));
    }
    if let Some(bp) = &vitals.blood_pressure {
        lines.push(format!(
            "Blood Pressure: {}/{} mmHg",
            bp.systolic, bp.diastolic
        ));
    }
    if let Some(t) = vitals.temperature {
        lines.push(format!("Temperature: {t} C"));
    }
    if let Some(spo2) = vitals.oxygen_saturation {
        lines.push(format!("Oxygen Saturation: {spo2}%"));
    }
    if let Some(rr) = vitals.respiratory_rate {
        lines.push(format!("Respiratory Rate: {rr}/min"));
    }
    if lines.is_empty() {
        "No vital signs provided".to_string()
    } else {
        lines.join("\n")
    }
}

fn baseline_info(baseline: Option<&PatientBaseline>) -> String {
    let Some(baseline) = baseline else {
        return String::new();
    };
    let mut lines = vec!["Baseline:".to_string()];
    if let Some(hr) = &baseline.heart_rate {
        lines.push(format!("- Heart Rate: {}-{} bpm", hr.min, hr.max));
    }
    if let Some(bp) = &baseline.blood_pressure {
        lines.push(format!(
            "- Blood Pressure: {}/{} mmHg",
            bp.systolic, bp.diastolic
        ));
    }
    lines.join("\n")
}

pub(crate) fn prompt(
    input: &VitalsAnomalyInput,
    format_instructions: &str,
) -> Result<String, RenderError> {
    let context = &input.patient_context;
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("patient_id", input.patient_id.clone()),
        ("timestamp", input.timestamp.clone()),
        ("vitals_info", vitals_info(&input.vitals)),
        ("age", context.age.to_string()),
        ("conditions", context.conditions.join(", ")),
        ("medications", context.medications.join(", ")),
        ("baseline_info", baseline_info(context.baseline.as_ref())),
    ])
}
