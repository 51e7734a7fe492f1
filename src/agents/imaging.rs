//! Medical imaging analysis. Disabled: the endpoint is mounted but rejects
//! every request until a vision-capable completion backend is wired in. The
//! types and schema document the intended surface.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldKind, Payload, SchemaSpec, optional, required};

pub(crate) const FINDING_SEVERITIES: &[&str] = &["normal", "mild", "moderate", "severe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Xray,
    Ct,
    Mri,
    Ultrasound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingInput {
    pub image_type: ImageType,
    pub image_url: String,
    pub body_part: String,
    pub clinical_indication: String,
    pub patient_age: u32,
    pub patient_gender: String,
    pub prior_findings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

/// Normalized 0-1 bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingFinding {
    pub location: String,
    pub description: String,
    pub severity: FindingSeverity,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingAnalysis {
    pub findings: Vec<ImagingFinding>,
    pub impression: String,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
    pub critical_findings: bool,
    pub radiologist_review_required: bool,
}

pub(crate) fn spec() -> SchemaSpec {
    SchemaSpec::builder()
        .feature("imaging")
        .payload(Payload::Single)
        .fields(vec![
            required(
                "findings",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("location", FieldKind::String).hint("anatomical location"),
                    required("description", FieldKind::String),
                    required("severity", FieldKind::Enum(FINDING_SEVERITIES)),
                    required(
                        "confidence",
                        FieldKind::Float {
                            min: Some(0.0),
                            max: Some(1.0),
                        },
                    ),
                    optional(
                        "coordinates",
                        FieldKind::Object(vec![
                            required("x", FieldKind::Float { min: Some(0.0), max: Some(1.0) }),
                            required("y", FieldKind::Float { min: Some(0.0), max: Some(1.0) }),
                            required(
                                "width",
                                FieldKind::Float { min: Some(0.0), max: Some(1.0) },
                            ),
                            required(
                                "height",
                                FieldKind::Float { min: Some(0.0), max: Some(1.0) },
                            ),
                        ]),
                    ),
                ]))),
            ),
            required("impression", FieldKind::String)
                .hint("radiological impression in standard report format"),
            required(
                "recommendations",
                FieldKind::List(Box::new(FieldKind::String)),
            ),
            optional("comparison", FieldKind::String)
                .hint("comparison with prior findings when available"),
            required("criticalFindings", FieldKind::Bool),
            required("radiologistReviewRequired", FieldKind::Bool),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    #[test]
    fn the_documented_schema_accepts_a_full_report() {
        let raw = r#"{
            "findings": [{
                "location": "Right lower lobe",
                "description": "Patchy opacities consistent with pneumonia",
                "severity": "moderate",
                "confidence": 0.85,
                "coordinates": {"x": 0.3, "y": 0.6, "width": 0.2, "height": 0.15}
            }],
            "impression": "Findings consistent with right lower lobe pneumonia.",
            "recommendations": ["Clinical correlation recommended"],
            "criticalFindings": false,
            "radiologistReviewRequired": true
        }"#;
        let analysis: ImagingAnalysis = extract(raw, &spec()).unwrap();
        assert_eq!(analysis.findings[0].severity, FindingSeverity::Moderate);
        assert!(analysis.radiologist_review_required);
        assert!(analysis.comparison.is_none());
    }
}
