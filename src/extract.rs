//! Turning raw model text into schema-conformant typed values.
//!
//! Replies arrive as opaque text: often clean JSON, sometimes wrapped in a
//! markdown code fence, occasionally a bare object where a list was asked for.
//! The pipeline here is de-fence, parse, normalize the top-level shape, then
//! conform every element against the feature's [`SchemaSpec`]. On success the
//! conformed value deserializes into the feature's response type; on any
//! malformation the caller gets a typed [`ExtractionError`] and never a
//! partial result.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ExtractionError;
use crate::schema::{Payload, SchemaSpec, json_kind};

/// Upper bound on diagnostic excerpts of model text carried inside errors.
const EXCERPT_CHARS: usize = 200;

/// Bounded prefix of a reply for diagnostics; never the full text.
pub(crate) fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Strips a wrapping markdown code fence, if present.
///
/// Removes a leading triple-backtick marker together with its language tag and
/// a trailing triple-backtick marker, then re-trims. Idempotent: already-clean
/// text passes through unchanged. Prose around the fence is not recovered;
/// such replies fail the structural parse downstream.
pub fn strip_code_fence(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```") {
        t = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

/// Runs the full extraction pipeline, returning the conformed JSON value: an
/// array for [`Payload::Many`] specs, an object for [`Payload::Single`].
pub fn extract_value(raw: &str, spec: &SchemaSpec) -> Result<Value, ExtractionError> {
    let cleaned = strip_code_fence(raw);
    let parsed: Value =
        serde_json::from_str(cleaned).map_err(|source| ExtractionError::Malformed {
            source,
            excerpt: excerpt(cleaned),
        })?;

    match (spec.payload, parsed) {
        (Payload::Many, Value::Array(items)) => {
            let mut conformed = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let object = item.as_object().ok_or(ExtractionError::UnexpectedShape {
                    expected: "an array of objects",
                    actual: json_kind(item),
                })?;
                conformed.push(Value::Object(
                    spec.conform_object(object, &format!("[{i}]"))?,
                ));
            }
            Ok(Value::Array(conformed))
        }
        // Models sometimes collapse a one-item array to a bare object.
        (Payload::Many, Value::Object(object)) => Ok(Value::Array(vec![Value::Object(
            spec.conform_object(&object, "")?,
        )])),
        (Payload::Single, Value::Object(object)) => {
            Ok(Value::Object(spec.conform_object(&object, "")?))
        }
        (Payload::Many, other) => Err(ExtractionError::UnexpectedShape {
            expected: "an array of objects",
            actual: json_kind(&other),
        }),
        (Payload::Single, other) => Err(ExtractionError::UnexpectedShape {
            expected: "an object",
            actual: json_kind(&other),
        }),
    }
}

/// Extracts a reply and deserializes the conformed value into the feature's
/// response type.
pub fn extract<T: DeserializeOwned>(raw: &str, spec: &SchemaSpec) -> Result<T, ExtractionError> {
    let value = extract_value(raw, spec)?;
    serde_json::from_value(value).map_err(|e| ExtractionError::ValidationFailed {
        field: spec.feature.to_string(),
        violation: format!("conformed reply did not match the response type: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, required};
    use rstest::rstest;
    use serde_json::json;

    fn icd10_spec() -> SchemaSpec {
        SchemaSpec::builder()
            .feature("icd10")
            .payload(Payload::Many)
            .fields(vec![
                required("code", FieldKind::String),
                required("desc", FieldKind::String),
                required(
                    "confidence",
                    FieldKind::Int {
                        min: Some(0),
                        max: Some(100),
                    },
                ),
            ])
            .build()
    }

    #[rstest]
    #[case("{\"a\": 1}", "{\"a\": 1}")]
    #[case("```json\n{\"a\": 1}\n```", "{\"a\": 1}")]
    #[case("```\n{\"a\": 1}\n```", "{\"a\": 1}")]
    #[case("```JSON\n{\"a\": 1}\n```", "{\"a\": 1}")]
    #[case("  ```json\n{\"a\": 1}\n```  ", "{\"a\": 1}")]
    #[case("```json {\"a\": 1} ```", "{\"a\": 1}")]
    fn strips_fence_variants(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_code_fence(input), expected);
    }

    #[test]
    fn de_fencing_is_idempotent() {
        let fenced = "```json\n{\"code\": \"J00\"}\n```";
        let once = strip_code_fence(fenced);
        let twice = strip_code_fence(once);
        assert_eq!(once, twice);
        assert_eq!(twice, "{\"code\": \"J00\"}");
    }

    #[test]
    fn fenced_single_object_extracts_as_one_element_list() {
        let raw = "```json\n{\"code\":\"E11.40\",\"desc\":\"Type 2 diabetes\",\"confidence\":95}\n```";
        let value = extract_value(raw, &icd10_spec()).unwrap();
        assert_eq!(
            value,
            json!([{"code": "E11.40", "desc": "Type 2 diabetes", "confidence": 95}])
        );
    }

    #[test]
    fn bare_object_equals_its_bracketed_form() {
        let spec = icd10_spec();
        let object = "{\"code\":\"J00\",\"desc\":\"Common cold\",\"confidence\":80}";
        let wrapped = format!("[{object}]");
        assert_eq!(
            extract_value(object, &spec).unwrap(),
            extract_value(&wrapped, &spec).unwrap()
        );
    }

    #[test]
    fn empty_array_is_an_empty_collection_not_an_error() {
        let value = extract_value("[]", &icd10_spec()).unwrap();
        assert_eq!(value, json!([]));
    }

    #[test]
    fn malformed_reply_carries_the_literal_excerpt() {
        let err = extract_value("not json", &icd10_spec()).unwrap_err();
        match err {
            ExtractionError::Malformed { excerpt, .. } => assert_eq!(excerpt, "not json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn excerpt_is_bounded_and_char_safe() {
        let long = "ü".repeat(5000);
        let bounded = excerpt(&long);
        assert_eq!(bounded.chars().count(), 200);

        let err = extract_value(&long, &icd10_spec()).unwrap_err();
        assert!(err.to_string().len() < 600);
    }

    #[test]
    fn scalar_top_level_is_an_unexpected_shape() {
        let err = extract_value("42", &icd10_spec()).unwrap_err();
        match err {
            ExtractionError::UnexpectedShape { expected, actual } => {
                assert_eq!(expected, "an array of objects");
                assert_eq!(actual, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn array_reply_for_single_spec_is_an_unexpected_shape() {
        let spec = SchemaSpec::builder()
            .feature("summarization")
            .payload(Payload::Single)
            .fields(vec![required("summary", FieldKind::String)])
            .build();
        let err = extract_value("[{\"summary\": \"x\"}]", &spec).unwrap_err();
        match err {
            ExtractionError::UnexpectedShape { expected, actual } => {
                assert_eq!(expected, "an object");
                assert_eq!(actual, "array");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_object_array_element_is_an_unexpected_shape() {
        let err = extract_value("[\"just a string\"]", &icd10_spec()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedShape { .. }));
    }

    #[test]
    fn extract_builds_the_typed_response() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Suggestion {
            code: String,
            desc: String,
            confidence: u8,
        }

        let raw = "```json\n[{\"code\":\"E11.40\",\"desc\":\"Type 2 diabetes\",\"confidence\":95}]\n```";
        let suggestions: Vec<Suggestion> = extract(raw, &icd10_spec()).unwrap();
        assert_eq!(
            suggestions,
            vec![Suggestion {
                code: "E11.40".to_string(),
                desc: "Type 2 diabetes".to_string(),
                confidence: 95,
            }]
        );
    }

    #[test]
    fn missing_field_never_yields_a_defaulted_result() {
        let raw = "[{\"code\":\"J00\",\"confidence\":80}]";
        let err = extract_value(raw, &icd10_spec()).unwrap_err();
        match err {
            ExtractionError::ValidationFailed { field, .. } => assert_eq!(field, "[0].desc"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
