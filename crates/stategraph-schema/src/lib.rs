//! # stategraph-schema - Structured-input validation
//!
//! Declarative validation for caller-supplied records before they enter a
//! workflow: each field is declared with a type, whether it is required, and
//! optional constraints (numeric bounds, email shape). Validation is
//! all-or-nothing - it never partially applies; either every declared rule
//! holds and a validated record comes back, or every problem found is
//! reported together in [`ValidationErrors`].
//!
//! # Examples
//!
//! ```rust
//! use stategraph_schema::{FieldKind, FieldSpec, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .field(FieldSpec::new("name", FieldKind::String))
//!     .field(FieldSpec::new("email", FieldKind::Email))
//!     .field(FieldSpec::new("query", FieldKind::String))
//!     .field(
//!         FieldSpec::new("order_id", FieldKind::Integer)
//!             .optional()
//!             .ge(10_000.0)
//!             .le(99_999.0),
//!     );
//!
//! let valid = schema.validate(&json!({
//!     "name": "Joe User",
//!     "email": "joe.user@example.com",
//!     "query": "I forgot my password.",
//! }));
//! assert!(valid.is_ok());
//!
//! let errors = schema
//!     .validate(&json!({"name": "Joe User", "email": "not-an-email"}))
//!     .unwrap_err();
//! assert_eq!(errors.errors().len(), 2); // bad email AND missing query
//! ```

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        // One local part, one domain with at least one dot, no whitespace.
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
    })
}

/// The type a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string
    String,
    /// A whole number
    Integer,
    /// Any JSON number
    Float,
    /// A boolean
    Bool,
    /// A string shaped like an email address
    Email,
    /// A JSON array
    List,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Float => "a number",
            FieldKind::Bool => "a boolean",
            FieldKind::Email => "an email address",
            FieldKind::List => "a list",
        }
    }
}

/// Declaration of one field: name, type, and constraints
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    ge: Option<f64>,
    le: Option<f64>,
}

impl FieldSpec {
    /// Declare a required field of the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            ge: None,
            le: None,
        }
    }

    /// Mark the field optional; absent values validate and are omitted
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Require numeric values to be at least this
    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    /// Require numeric values to be at most this
    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    /// Check one present value, appending any problems
    fn check(&self, value: &Value, problems: &mut Vec<FieldError>) {
        let mut problem = |message: String| {
            problems.push(FieldError {
                field: self.name.clone(),
                message,
            })
        };

        let numeric = match (self.kind, value) {
            (FieldKind::String, Value::String(_)) => None,
            (FieldKind::Bool, Value::Bool(_)) => None,
            (FieldKind::List, Value::Array(_)) => None,
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => n.as_f64(),
            (FieldKind::Float, Value::Number(n)) => n.as_f64(),
            (FieldKind::Email, Value::String(s)) => {
                if !email_regex().is_match(s) {
                    problem(format!("'{s}' is not a valid email address"));
                }
                None
            }
            (kind, other) => {
                problem(format!("expected {}, got {other}", kind.describe()));
                return;
            }
        };

        if let Some(n) = numeric {
            if let Some(ge) = self.ge {
                if n < ge {
                    problem(format!("value {n} is below the minimum of {ge}"));
                }
            }
            if let Some(le) = self.le {
                if n > le {
                    problem(format!("value {n} is above the maximum of {le}"));
                }
            }
        }
    }
}

/// One per-field problem found during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field the problem belongs to
    pub field: String,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation failed; carries every per-field problem found
#[derive(Debug, Clone, Error)]
#[error("validation failed:\n  - {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  - "))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// All problems, in field declaration order (undeclared fields last)
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

/// A declared record shape
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field declaration
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Validate a raw record against the schema
    ///
    /// Returns the validated record containing exactly the declared fields
    /// that were present, or every problem found: missing required fields,
    /// type mismatches, bound and format violations, and undeclared fields.
    pub fn validate(&self, input: &Value) -> Result<Value, ValidationErrors> {
        let input_obj = match input.as_object() {
            Some(obj) => obj,
            None => {
                return Err(ValidationErrors(vec![FieldError {
                    field: "<input>".to_string(),
                    message: "input must be a JSON object".to_string(),
                }]))
            }
        };

        let mut problems = Vec::new();
        let mut record = Map::new();

        for spec in &self.fields {
            match input_obj.get(&spec.name) {
                Some(value) => {
                    spec.check(value, &mut problems);
                    record.insert(spec.name.clone(), value.clone());
                }
                None if spec.required => problems.push(FieldError {
                    field: spec.name.clone(),
                    message: "field is required".to_string(),
                }),
                None => {}
            }
        }

        for key in input_obj.keys() {
            if !self.fields.iter().any(|spec| spec.name == *key) {
                problems.push(FieldError {
                    field: key.clone(),
                    message: "field is not declared in the schema".to_string(),
                });
            }
        }

        if problems.is_empty() {
            Ok(Value::Object(record))
        } else {
            Err(ValidationErrors(problems))
        }
    }
}
