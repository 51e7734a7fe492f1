//! Response shape descriptions and conformance checking.
//!
//! A [`SchemaSpec`] describes the shape a model reply must take for one
//! feature: the top-level payload (a single object or a list of objects) and
//! the per-field constraints. Specs are built once at startup by the registry
//! and are read-only afterward.
//!
//! Conformance walks a parsed reply field by field and returns a copy holding
//! only the declared fields, with integer-valued floats normalized to
//! integers. Unknown fields are dropped, never rejected, so the gateway keeps
//! working when model output drifts.

use bon::Builder;
use serde_json::{Map, Value};

use crate::errors::ExtractionError;

/// The top-level container a reply must parse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Exactly one JSON object.
    Single,
    /// A JSON array of objects. A bare object is tolerated and wrapped into a
    /// one-element list; an empty array is a valid empty result.
    Many,
}

/// The semantic type of one field, with its constraint.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Bool,
    /// Integer with an optional inclusive range.
    Int { min: Option<i64>, max: Option<i64> },
    /// Float with an optional inclusive range.
    Float { min: Option<f64>, max: Option<f64> },
    /// String restricted to a fixed set of values.
    Enum(&'static [&'static str]),
    List(Box<FieldKind>),
    /// Nested object with its own field list.
    Object(Vec<FieldSpec>),
}

/// One field of a response schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Short description carried into the generated format instructions.
    pub hint: Option<&'static str>,
}

impl FieldSpec {
    pub fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }
}

pub fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
        hint: None,
    }
}

pub fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
        hint: None,
    }
}

/// One response shape: payload container plus ordered field constraints.
#[derive(Debug, Clone, Builder)]
pub struct SchemaSpec {
    pub feature: &'static str,
    pub payload: Payload,
    pub fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// Checks one reply object against the field list.
    ///
    /// Returns a copy holding only the declared fields. `path` locates the
    /// object inside the reply for error reporting (empty at the top level).
    pub fn conform_object(
        &self,
        object: &Map<String, Value>,
        path: &str,
    ) -> Result<Map<String, Value>, ExtractionError> {
        conform_fields(&self.fields, object, path)
    }

    /// Derives the format-instructions block embedded into this feature's
    /// prompt, replacing the hand-maintained instruction strings the per
    /// feature handlers used to carry.
    pub fn format_instructions(&self) -> String {
        let mut out = String::new();
        match self.payload {
            Payload::Many => {
                out.push_str("You must return a JSON array of objects. Each object must have:\n");
            }
            Payload::Single => {
                out.push_str("You must return a single JSON object with:\n");
            }
        }
        describe_fields(&self.fields, 0, &mut out);
        if self.payload == Payload::Many {
            out.push_str("If nothing applies, return an empty array [].\n");
        }
        out.push_str("Return ONLY valid JSON, no markdown code blocks, no additional text.");
        out
    }
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn conform_fields(
    fields: &[FieldSpec],
    object: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, ExtractionError> {
    let mut out = Map::new();
    for field in fields {
        let at = join_path(path, field.name);
        match object.get(field.name) {
            None => {
                if field.required {
                    return Err(ExtractionError::ValidationFailed {
                        field: at,
                        violation: "required field is missing".to_string(),
                    });
                }
            }
            Some(Value::Null) => {
                if field.required {
                    return Err(ExtractionError::ValidationFailed {
                        field: at,
                        violation: "required field is null".to_string(),
                    });
                }
            }
            Some(value) => {
                out.insert(field.name.to_string(), conform_value(&field.kind, value, &at)?);
            }
        }
    }
    Ok(out)
}

fn conform_value(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, ExtractionError> {
    match kind {
        FieldKind::String => value
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| type_violation(path, "a string", value)),
        FieldKind::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| type_violation(path, "a boolean", value)),
        FieldKind::Int { min, max } => {
            let n = as_integer(value).ok_or_else(|| type_violation(path, "an integer", value))?;
            if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                return Err(range_violation(path, &n.to_string(), *min, *max));
            }
            Ok(Value::from(n))
        }
        FieldKind::Float { min, max } => {
            let n = value
                .as_f64()
                .ok_or_else(|| type_violation(path, "a number", value))?;
            if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                return Err(range_violation(path, &n.to_string(), *min, *max));
            }
            Ok(Value::from(n))
        }
        FieldKind::Enum(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| type_violation(path, "a string", value))?;
            if !allowed.iter().any(|candidate| *candidate == s) {
                return Err(ExtractionError::ValidationFailed {
                    field: path.to_string(),
                    violation: format!(
                        "value \"{s}\" is not one of [{}]",
                        allowed.join(", ")
                    ),
                });
            }
            Ok(Value::String(s.to_owned()))
        }
        FieldKind::List(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| type_violation(path, "an array", value))?;
            let conformed = items
                .iter()
                .enumerate()
                .map(|(i, item)| conform_value(inner, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(conformed))
        }
        FieldKind::Object(fields) => {
            let object = value
                .as_object()
                .ok_or_else(|| type_violation(path, "an object", value))?;
            conform_fields(fields, object, path).map(Value::Object)
        }
    }
}

/// Models routinely emit `95.0` where an integer is declared; tolerate any
/// float with a zero fraction and normalize it.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}

fn type_violation(path: &str, expected: &str, value: &Value) -> ExtractionError {
    ExtractionError::ValidationFailed {
        field: path.to_string(),
        violation: format!("expected {expected}, got {}", json_kind(value)),
    }
}

fn range_violation(
    path: &str,
    value: &str,
    min: Option<impl std::fmt::Display>,
    max: Option<impl std::fmt::Display>,
) -> ExtractionError {
    let range = match (min, max) {
        (Some(min), Some(max)) => format!("{min} to {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "unbounded".to_string(),
    };
    ExtractionError::ValidationFailed {
        field: path.to_string(),
        violation: format!("value {value} is outside the allowed range ({range})"),
    }
}

fn describe_fields(fields: &[FieldSpec], depth: usize, out: &mut String) {
    for field in fields {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("- ");
        out.push_str(field.name);
        out.push_str(": ");
        match &field.kind {
            FieldKind::Object(nested) => {
                out.push_str("object with:");
                finish_line(field, out);
                describe_fields(nested, depth + 1, out);
            }
            FieldKind::List(inner) => match inner.as_ref() {
                FieldKind::Object(nested) => {
                    out.push_str("array of objects, each with:");
                    finish_line(field, out);
                    describe_fields(nested, depth + 1, out);
                }
                other => {
                    out.push_str(&format!("array of {}", describe_scalar(other)));
                    finish_line(field, out);
                }
            },
            other => {
                out.push_str(&describe_scalar(other));
                finish_line(field, out);
            }
        }
    }
}

fn finish_line(field: &FieldSpec, out: &mut String) {
    if !field.required {
        out.push_str(" (optional)");
    }
    if let Some(hint) = field.hint {
        out.push_str(" (");
        out.push_str(hint);
        out.push(')');
    }
    out.push('\n');
}

fn describe_scalar(kind: &FieldKind) -> String {
    match kind {
        FieldKind::String => "string".to_string(),
        FieldKind::Bool => "boolean (true or false)".to_string(),
        FieldKind::Int {
            min: Some(min),
            max: Some(max),
        } => format!("integer between {min} and {max}"),
        FieldKind::Int { .. } => "integer".to_string(),
        FieldKind::Float {
            min: Some(min),
            max: Some(max),
        } => format!("number between {min} and {max}"),
        FieldKind::Float { .. } => "number".to_string(),
        FieldKind::Enum(allowed) => {
            let quoted: Vec<String> = allowed.iter().map(|v| format!("\"{v}\"")).collect();
            format!("one of {}", quoted.join(", "))
        }
        FieldKind::List(inner) => format!("array of {}", describe_scalar(inner)),
        FieldKind::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interaction_spec() -> SchemaSpec {
        SchemaSpec::builder()
            .feature("drug-interaction")
            .payload(Payload::Many)
            .fields(vec![
                required("severity", FieldKind::Enum(&["low", "moderate", "high", "severe"])),
                required("msg", FieldKind::String),
                required("drugs", FieldKind::List(Box::new(FieldKind::String))),
                optional("recommendation", FieldKind::String),
            ])
            .build()
    }

    #[test]
    fn conform_keeps_declared_fields_and_drops_unknown_ones() {
        let spec = interaction_spec();
        let reply = json!({
            "severity": "high",
            "msg": "Increased bleeding risk",
            "drugs": ["Aspirin", "Warfarin"],
            "llm_debug_note": "should disappear"
        });
        let conformed = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap();
        assert_eq!(conformed.len(), 3);
        assert!(!conformed.contains_key("llm_debug_note"));
        assert_eq!(conformed["severity"], json!("high"));
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let spec = interaction_spec();
        let reply = json!({"severity": "low", "drugs": []});
        let err = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap_err();
        match err {
            ExtractionError::ValidationFailed { field, violation } => {
                assert_eq!(field, "msg");
                assert!(violation.contains("missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undeclared_enum_value_names_field_and_value() {
        let spec = interaction_spec();
        let reply = json!({"severity": "extreme", "msg": "x", "drugs": []});
        let err = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap_err();
        match err {
            ExtractionError::ValidationFailed { field, violation } => {
                assert_eq!(field, "severity");
                assert!(violation.contains("\"extreme\""));
                assert!(violation.contains("severe"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_field_may_be_absent_or_null() {
        let spec = interaction_spec();
        for reply in [
            json!({"severity": "low", "msg": "x", "drugs": []}),
            json!({"severity": "low", "msg": "x", "drugs": [], "recommendation": null}),
        ] {
            let conformed = spec
                .conform_object(reply.as_object().unwrap(), "")
                .unwrap();
            assert!(!conformed.contains_key("recommendation"));
        }
    }

    #[test]
    fn integer_range_is_inclusive() {
        let spec = SchemaSpec::builder()
            .feature("test")
            .payload(Payload::Single)
            .fields(vec![required(
                "confidence",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )])
            .build();

        for ok in [0i64, 100] {
            let reply = json!({"confidence": ok});
            assert!(spec.conform_object(reply.as_object().unwrap(), "").is_ok());
        }
        let reply = json!({"confidence": 101});
        let err = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }

    #[test]
    fn integer_valued_float_is_normalized() {
        let spec = SchemaSpec::builder()
            .feature("test")
            .payload(Payload::Single)
            .fields(vec![required(
                "confidence",
                FieldKind::Int {
                    min: Some(0),
                    max: Some(100),
                },
            )])
            .build();
        let reply = json!({"confidence": 95.0});
        let conformed = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap();
        assert_eq!(conformed["confidence"], json!(95));
    }

    #[test]
    fn fractional_value_for_integer_field_is_rejected() {
        let spec = SchemaSpec::builder()
            .feature("test")
            .payload(Payload::Single)
            .fields(vec![required("confidence", FieldKind::Int { min: None, max: None })])
            .build();
        let reply = json!({"confidence": 95.5});
        assert!(spec.conform_object(reply.as_object().unwrap(), "").is_err());
    }

    #[test]
    fn nested_violations_carry_the_full_path() {
        let spec = SchemaSpec::builder()
            .feature("test")
            .payload(Payload::Single)
            .fields(vec![required(
                "conditions",
                FieldKind::List(Box::new(FieldKind::Object(vec![required(
                    "probability",
                    FieldKind::Int {
                        min: Some(0),
                        max: Some(100),
                    },
                )]))),
            )])
            .build();
        let reply = json!({"conditions": [{"probability": 40}, {"probability": 400}]});
        let err = spec
            .conform_object(reply.as_object().unwrap(), "")
            .unwrap_err();
        match err {
            ExtractionError::ValidationFailed { field, .. } => {
                assert_eq!(field, "conditions[1].probability");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn format_instructions_list_the_constraints() {
        let text = interaction_spec().format_instructions();
        assert!(text.starts_with("You must return a JSON array of objects."));
        assert!(text.contains("- severity: one of \"low\", \"moderate\", \"high\", \"severe\""));
        assert!(text.contains("- drugs: array of string"));
        assert!(text.contains("- recommendation: string (optional)"));
        assert!(text.contains("empty array []"));
        assert!(text.contains("ONLY valid JSON"));
    }

    #[test]
    fn format_instructions_describe_nested_objects() {
        let spec = SchemaSpec::builder()
            .feature("test")
            .payload(Payload::Single)
            .fields(vec![required(
                "anomalies",
                FieldKind::List(Box::new(FieldKind::Object(vec![
                    required("vitalSign", FieldKind::String),
                    required("deviationScore", FieldKind::Float { min: Some(0.0), max: Some(1.0) }),
                ]))),
            )])
            .build();
        let text = spec.format_instructions();
        assert!(text.contains("- anomalies: array of objects, each with:"));
        assert!(text.contains("  - vitalSign: string"));
        assert!(text.contains("  - deviationScore: number between 0 and 1"));
    }
}
