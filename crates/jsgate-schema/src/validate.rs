//! # Body Classification
//!
//! Classifies a drained request body against a compiled schema.
//!
//! The classification separates three kinds of client mistakes that need
//! different answers: a body that is not JSON at all ([`MalformedInput`]),
//! a JSON document that breaks the schema ([`BodyRejection::SchemaViolation`],
//! itemized), and failures that are not the client's fault
//! ([`BodyRejection::Internal`]). The outcome depends only on the bytes and
//! the schema.

use std::fmt;

use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;

use crate::compiler::CompiledSchema;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the offending location in the document.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// Validator's description of the failure.
    pub message: String,
}

impl Violation {
    /// Dotted form of [`Violation::instance_path`]; `(root)` for the document root.
    pub fn field(&self) -> String {
        if self.instance_path.is_empty() {
            return "(root)".to_string();
        }
        self.instance_path
            .trim_start_matches('/')
            .split('/')
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field(), self.message)
    }
}

/// Violations for one document, in validator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True if there are none.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Client-facing message per violation, order preserved.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(Violation::to_string).collect()
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Why a body could not be read as a JSON document.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedInput {
    /// No body, or only whitespace.
    #[error("empty body")]
    Empty,

    /// Not syntactically valid JSON.
    #[error("invalid JSON syntax at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    /// The document ends before it is complete.
    #[error("unexpected end of JSON input at line {line}, column {column}")]
    Truncated { line: usize, column: usize },
}

/// A body that must not reach the downstream handler.
#[derive(Error, Debug)]
pub enum BodyRejection {
    /// The body is missing or not JSON.
    #[error("malformed body: {0}")]
    MalformedInput(MalformedInput),

    /// The body is JSON but breaks the schema.
    #[error("schema validation failed: {0}")]
    SchemaViolation(ValidationViolations),

    /// Something failed that the client cannot fix. The cause is for logs only.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl From<MalformedInput> for BodyRejection {
    fn from(kind: MalformedInput) -> Self {
        Self::MalformedInput(kind)
    }
}

impl From<ValidationViolations> for BodyRejection {
    fn from(violations: ValidationViolations) -> Self {
        Self::SchemaViolation(violations)
    }
}

/// Result of checking one body.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// The body conforms; the chain continues.
    Valid,
    /// The body was rejected.
    Rejected(BodyRejection),
}

impl ValidationOutcome {
    /// True for [`ValidationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// `Ok(())` when valid, the rejection otherwise.
    pub fn into_result(self) -> Result<(), BodyRejection> {
        match self {
            Self::Valid => Ok(()),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<BodyRejection> for ValidationOutcome {
    fn from(rejection: BodyRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<Result<(), BodyRejection>> for ValidationOutcome {
    fn from(result: Result<(), BodyRejection>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(rejection) => Self::Rejected(rejection),
        }
    }
}

/// Parse `body` and check it against `schema`.
pub fn validate_body(schema: &CompiledSchema, body: &[u8]) -> ValidationOutcome {
    let instance = match parse_body(body) {
        Ok(instance) => instance,
        Err(rejection) => return rejection.into(),
    };

    match schema.validate_value(&instance) {
        Ok(()) => ValidationOutcome::Valid,
        Err(violations) => {
            tracing::debug!(count = violations.len(), "body violates schema");
            BodyRejection::SchemaViolation(violations).into()
        }
    }
}

pub(crate) fn parse_body(body: &[u8]) -> Result<Value, BodyRejection> {
    if body.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
        return Err(MalformedInput::Empty.into());
    }

    serde_json::from_slice(body).map_err(|e| {
        let (line, column) = (e.line(), e.column());
        match e.classify() {
            Category::Eof => MalformedInput::Truncated { line, column }.into(),
            Category::Syntax | Category::Data => MalformedInput::Syntax { line, column }.into(),
            Category::Io => BodyRejection::Internal(format!("reading JSON body: {e}")),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::JsonSchemaCompiler;
    use crate::source::SchemaSource;

    const TEST_SCHEMA: &str = r#"{
        "title": "test",
        "type": "object",
        "properties": {
            "value1": { "type": "integer" },
            "value2": { "type": "boolean" }
        },
        "required": ["value1"],
        "additionalProperties": false
    }"#;

    fn schema(text: &str) -> CompiledSchema {
        CompiledSchema::compile(SchemaSource::new(text), &JsonSchemaCompiler::default()).unwrap()
    }

    fn rejection(outcome: ValidationOutcome) -> BodyRejection {
        match outcome {
            ValidationOutcome::Rejected(r) => r,
            ValidationOutcome::Valid => panic!("expected rejection, got Valid"),
        }
    }

    #[test]
    fn empty_and_blank_bodies_are_empty() {
        let sc = schema("{}");
        for body in [&b""[..], b"   ", b"\n\t \r"] {
            assert!(matches!(
                rejection(validate_body(&sc, body)),
                BodyRejection::MalformedInput(MalformedInput::Empty)
            ));
        }
    }

    #[test]
    fn non_json_whitespace_is_syntax_error() {
        let sc = schema("{}");
        for body in [&b"\x0C"[..], b" \x0C\n"] {
            assert!(matches!(
                rejection(validate_body(&sc, body)),
                BodyRejection::MalformedInput(MalformedInput::Syntax { .. })
            ));
        }
    }

    #[test]
    fn unquoted_key_is_syntax_error() {
        let sc = schema("{}");
        assert!(matches!(
            rejection(validate_body(&sc, b"{a: 1")),
            BodyRejection::MalformedInput(MalformedInput::Syntax { .. })
        ));
    }

    #[test]
    fn trailing_garbage_is_syntax_error() {
        let sc = schema("{}");
        assert!(matches!(
            rejection(validate_body(&sc, br#"{"a": 1} x"#)),
            BodyRejection::MalformedInput(MalformedInput::Syntax { .. })
        ));
    }

    #[test]
    fn unterminated_object_is_truncated() {
        let sc = schema("{}");
        assert!(matches!(
            rejection(validate_body(&sc, br#"{"a": 1"#)),
            BodyRejection::MalformedInput(MalformedInput::Truncated { .. })
        ));
    }

    #[test]
    fn wrong_type_is_violation_naming_the_field() {
        let sc = schema(TEST_SCHEMA);
        let BodyRejection::SchemaViolation(v) =
            rejection(validate_body(&sc, br#"{"value1": "bad type"}"#))
        else {
            panic!("expected SchemaViolation");
        };
        let messages = v.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("value1: "), "got: {messages:?}");
    }

    #[test]
    fn extra_and_missing_fields_are_violations() {
        let sc = schema(TEST_SCHEMA);
        assert!(matches!(
            rejection(validate_body(&sc, br#"{"value1": 1, "value3": 3}"#)),
            BodyRejection::SchemaViolation(_)
        ));

        let BodyRejection::SchemaViolation(v) =
            rejection(validate_body(&sc, br#"{"value2": true}"#))
        else {
            panic!("expected SchemaViolation");
        };
        assert!(v.messages()[0].starts_with("(root): "));
        assert!(v.messages()[0].contains("value1"));
    }

    #[test]
    fn multiple_violations_keep_order() {
        let sc = schema(
            r#"{"type":"object","properties":{"a":{"type":"integer"},"b":{"type":"string"}}}"#,
        );
        let BodyRejection::SchemaViolation(v) =
            rejection(validate_body(&sc, br#"{"a": "x", "b": 2}"#))
        else {
            panic!("expected SchemaViolation");
        };
        assert_eq!(v.len(), 2);
        let fields: Vec<String> = v.violations().iter().map(Violation::field).collect();
        assert!(fields.contains(&"a".to_string()));
        assert!(fields.contains(&"b".to_string()));
    }

    #[test]
    fn conforming_body_is_valid() {
        let sc = schema(TEST_SCHEMA);
        assert!(validate_body(&sc, br#"{"value1": 1, "value2": true}"#).is_valid());
    }

    #[test]
    fn field_unescapes_pointer_tokens() {
        let v = Violation {
            instance_path: "/a~1b/0/c~0d".to_string(),
            schema_path: "/properties".to_string(),
            message: "oops".to_string(),
        };
        assert_eq!(v.field(), "a/b.0.c~d");
        assert_eq!(v.to_string(), "a/b.0.c~d: oops");
    }

    #[test]
    fn violations_display_joins_with_semicolons() {
        let v = ValidationViolations::new(vec![
            Violation {
                instance_path: String::new(),
                schema_path: "/required".to_string(),
                message: "error 1".to_string(),
            },
            Violation {
                instance_path: "/x".to_string(),
                schema_path: "/properties/x/type".to_string(),
                message: "error 2".to_string(),
            },
        ]);
        assert_eq!(v.to_string(), "(root): error 1; x: error 2");
        assert_eq!(ValidationViolations::new(Vec::new()).to_string(), "");
    }

    #[test]
    fn outcome_result_round_trip() {
        assert!(ValidationOutcome::from(Ok(())).into_result().is_ok());
        let outcome = ValidationOutcome::from(BodyRejection::from(MalformedInput::Empty));
        assert!(!outcome.is_valid());
        assert!(matches!(
            outcome.into_result(),
            Err(BodyRejection::MalformedInput(MalformedInput::Empty))
        ));
    }
}
