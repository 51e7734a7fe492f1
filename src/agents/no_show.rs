//! Appointment no-show likelihood prediction.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::prompt::PromptTemplate;
use crate::schema::{FieldKind, Payload, SchemaSpec, required};

pub(crate) const RISK_LEVELS: &[&str] = &["low", "moderate", "high"];
pub(crate) const EFFORT_LEVELS: &[&str] = &["low", "medium", "high"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportationAccess {
    Own,
    Public,
    Limited,
}

impl TransportationAccess {
    fn as_str(self) -> &'static str {
        match self {
            TransportationAccess::Own => "own",
            TransportationAccess::Public => "public",
            TransportationAccess::Limited => "limited",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub department: String,
    /// Days until the appointment.
    pub lead_time: u32,
    pub day_of_week: String,
    pub time_of_day: TimeOfDay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientHistory {
    pub total_appointments: u32,
    pub missed_appointments: u32,
    pub last_minute_cancellations: u32,
    pub average_lead_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowDemographics {
    pub age: u32,
    /// Miles from the facility.
    pub distance: f64,
    pub transportation_access: TransportationAccess,
    pub employment_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub reminders_sent: u32,
    pub responses_to_reminders: u32,
    pub portal_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowInput {
    pub patient_id: String,
    pub appointment_details: AppointmentDetails,
    pub patient_history: PatientHistory,
    pub demographics: NoShowDemographics,
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoShowRiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub factor: String,
    /// Relative contribution 0-1; weights approximately sum to one.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowRecommendation {
    pub action: String,
    pub expected_impact: u8,
    pub effort: Effort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowPrediction {
    pub probability: u8,
    pub risk_level: NoShowRiskLevel,
    pub contributing_factors: Vec<ContributingFactor>,
    pub recommendations: Vec<NoShowRecommendation>,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("no-show")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "probability",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .hint("likelihood of missing the appointment"),
            required("riskLevel", FieldKind::Enum(RISK_LEVELS)),
            required(
                "contributingFactors",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("factor", FieldKind::String),
                    required(
                        "weight",
                        FieldKind::Float {
                            min: Some(0.0),
                            max: Some(1.0),
                        },
                    )
                    .hint("relative contribution; weights should sum to about 1.0"),
                ]))),
            ),
            required(
                "recommendations",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("action", FieldKind::String),
                    required(
                        "expectedImpact",
                        FieldKind::Int {
                            min: Some(0),
                            max: Some(100),
                        },
                    )
                    .hint("expected percentage reduction in no-show probability"),
                    required("effort", FieldKind::Enum(EFFORT_LEVELS)),
                ]))),
            ),
        ])
        .build()
}

const PROMPT: PromptTemplate = PromptTemplate::new(
    "You are a healthcare operations analyst predicting appointment no-show \
     likelihood.\n\
     \n\
     Risk grading: 'low' is under 30% probability, 'moderate' 30-60%, 'high' \
     over 60%. Historical no-show rate is the strongest predictor; lead times \
     over 30 days, long travel distance, limited transportation, young age \
     (18-35), new-patient status and low reminder response all raise risk; \
     active portal users show up more reliably. Rank contributing factors by \
     weight, and order recommendations high impact and low effort first.\n\
     \n\
     {format_instructions}\n\
     \n\
     Patient ID: {patient_id}\n\
     \n\
     Appointment Details:\n\
     Type: {appointment_type}\n\
     Department: {department}\n\
     Lead Time: {lead_time} days\n\
     Day of Week: {day_of_week}\n\
     Time of Day: {time_of_day}\n\
     \n\
     Patient History:\n\
     Total Appointments: {total_appointments}\n\
     Missed Appointments: {missed_appointments}\n\
     Last Minute Cancellations: {last_minute_cancellations}\n\
     Average Lead Time: {average_lead_time} days\n\
     \n\
     Demographics:\n\
     Age: {age}\n\
     Distance: {distance} miles\n\
     Transportation Access: {transportation_access}\n\
     Employment Status: {employment_status}\n\
     \n\
     Engagement:\n\
     Reminders Sent: {reminders_sent}\n\
     Responses to Reminders: {responses_to_reminders}\n\
     Portal Active: {portal_active}",
);

pub(crate) fn prompt(input: &NoShowInput, format_instructions: &str) -> Result<String, RenderError> {
    let appointment = &input.appointment_details;
    let history = &input.patient_history;
    let demographics = &input.demographics;
    let engagement = &input.engagement;
    PROMPT.render(&[
        ("format_instructions", format_instructions.to_string()),
        ("patient_id", input.patient_id.clone()),
        ("appointment_type", appointment.appointment_type.clone()),
        ("department", appointment.department.clone()),
        ("lead_time", appointment.lead_time.to_string()),
        ("day_of_week", appointment.day_of_week.clone()),
        ("time_of_day", appointment.time_of_day.as_str().to_string()),
        (
            "total_appointments",
            history.total_appointments.to_string(),
        ),
        (
            "missed_appointments",
            history.missed_appointments.to_string(),
        ),
        (
            "last_minute_cancellations",
            history.last_minute_cancellations.to_string(),
        ),
        ("average_lead_time", history.average_lead_time.to_string()),
        ("age", demographics.age.to_string()),
        ("distance", demographics.distance.to_string()),
        (
            "transportation_access",
            demographics.transportation_access.as_str().to_string(),
        ),
        (
            "employment_status",
            demographics.employment_status.clone(),
        ),
        ("reminders_sent", engagement.reminders_sent.to_string()),
        (
            "responses_to_reminders",
            engagement.responses_to_reminders.to_string(),
        ),
        ("portal_active", engagement.portal_active.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appointment_type_uses_the_reserved_wire_name() {
        let details: AppointmentDetails = serde_json::from_value(json!({
            "type": "routine checkup",
            "department": "Cardiology",
            "leadTime": 45,
            "dayOfWeek": "Monday",
            "timeOfDay": "morning"
        }))
        .unwrap();
        assert_eq!(details.appointment_type, "routine checkup");
        assert_eq!(details.time_of_day, TimeOfDay::Morning);
    }
}
