//! Inbound notes request and its validation rules.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Topic is required")]
    MissingTopic,

    #[error("Subject is required")]
    MissingSubject,
}

/// Raw request body as received. Fields are untyped so that wrong types are
/// reported as missing fields instead of deserialization failures.
#[derive(Debug, Default, Deserialize)]
pub struct RawNotesRequest {
    #[serde(default)]
    pub topic: Option<Value>,
    #[serde(default)]
    pub subject: Option<Value>,
}

impl RawNotesRequest {
    /// Parse a request body. Anything that is not a JSON object yields an empty request.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// A validated notes request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesRequest {
    /// Topic as supplied by the caller (not trimmed).
    pub topic: String,

    /// Subject context for the system prompt.
    pub subject: String,
}

impl TryFrom<RawNotesRequest> for NotesRequest {
    type Error = ValidationError;

    /// `topic` is checked before `subject`.
    fn try_from(raw: RawNotesRequest) -> Result<Self, Self::Error> {
        let topic = match raw.topic {
            Some(Value::String(t)) if !t.trim().is_empty() => t,
            _ => return Err(ValidationError::MissingTopic),
        };
        let subject = match raw.subject {
            Some(value) if !is_falsy(&value) => subject_text(value),
            _ => return Err(ValidationError::MissingSubject),
        };
        Ok(Self { topic, subject })
    }
}

/// Falsy JSON values: `null`, `false`, zero and the empty string.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Strings are used as-is; anything else is rendered as JSON text.
fn subject_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl NotesRequest {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        RawNotesRequest::from_slice(body).try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = NotesRequest::parse(br#"{"topic":"Newton's Laws","subject":"Physics"}"#).unwrap();
        assert_eq!(req.topic, "Newton's Laws");
        assert_eq!(req.subject, "Physics");
    }

    #[test]
    fn test_topic_kept_verbatim() {
        let req = NotesRequest::parse(br#"{"topic":"  Limits ","subject":"Math"}"#).unwrap();
        assert_eq!(req.topic, "  Limits ");
    }

    #[test]
    fn test_empty_and_whitespace_topic() {
        for body in [
            r#"{"topic":"","subject":"Math"}"#,
            r#"{"topic":"   \t\n","subject":"Math"}"#,
            r#"{"subject":"Math"}"#,
            r#"{"topic":null,"subject":"Math"}"#,
            r#"{"topic":42,"subject":"Math"}"#,
        ] {
            assert_eq!(
                NotesRequest::parse(body.as_bytes()),
                Err(ValidationError::MissingTopic),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_missing_subject() {
        for body in [
            r#"{"topic":"Derivatives","subject":""}"#,
            r#"{"topic":"Derivatives"}"#,
            r#"{"topic":"Derivatives","subject":null}"#,
            r#"{"topic":"Derivatives","subject":false}"#,
            r#"{"topic":"Derivatives","subject":0}"#,
            r#"{"topic":"Derivatives","subject":0.0}"#,
        ] {
            assert_eq!(
                NotesRequest::parse(body.as_bytes()),
                Err(ValidationError::MissingSubject),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_truthy_non_string_subjects_accepted() {
        for (body, expected) in [
            (r#"{"topic":"Derivatives","subject":42}"#, "42"),
            (r#"{"topic":"Derivatives","subject":true}"#, "true"),
            (r#"{"topic":"Derivatives","subject":{"name":"Math"}}"#, r#"{"name":"Math"}"#),
            (r#"{"topic":"Derivatives","subject":[]}"#, "[]"),
        ] {
            let req = NotesRequest::parse(body.as_bytes()).unwrap_or_else(|e| panic!("{body}: {e}"));
            assert_eq!(req.subject, expected);
        }
    }

    #[test]
    fn test_whitespace_subject_is_accepted() {
        let req = NotesRequest::parse(br#"{"topic":"Derivatives","subject":" "}"#).unwrap();
        assert_eq!(req.subject, " ");
    }

    #[test]
    fn test_topic_checked_first() {
        assert_eq!(
            NotesRequest::parse(br#"{"topic":"","subject":""}"#),
            Err(ValidationError::MissingTopic)
        );
    }

    #[test]
    fn test_non_object_body() {
        assert_eq!(NotesRequest::parse(b"not json"), Err(ValidationError::MissingTopic));
        assert_eq!(NotesRequest::parse(b"[1,2]"), Err(ValidationError::MissingTopic));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ValidationError::MissingTopic.to_string(), "Topic is required");
        assert_eq!(ValidationError::MissingSubject.to_string(), "Subject is required");
    }
}
