//! Field-level schema for book payloads.
//!
//! The schema is a static table consulted by [`validate`]; handlers never
//! inspect payload types themselves. Validation is pure and returns only the
//! fields it checked.

use std::fmt;

use serde_json::{Map, Value};

use super::models::{Book, BookPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Integer => f.write_str("integer"),
        }
    }
}

/// Type and constraints of one book field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub minimum: Option<i64>,
    /// Immutable fields are required on create and rejected on update.
    pub mutable: bool,
}

impl FieldSpec {
    const fn string(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::String,
            minimum: None,
            mutable: true,
        }
    }

    const fn integer(name: &'static str, minimum: Option<i64>) -> Self {
        Self {
            name,
            ty: FieldType::Integer,
            minimum,
            mutable: true,
        }
    }

    const fn immutable(self) -> Self {
        Self {
            mutable: false,
            ..self
        }
    }

    fn check(&self, value: &Value) -> Result<(), ViolationKind> {
        let wrong_type = ViolationKind::WrongType { expected: self.ty };
        match self.ty {
            FieldType::String => value.is_string().then_some(()).ok_or(wrong_type),
            FieldType::Integer => {
                let n = value.as_i64().ok_or(wrong_type)?;
                match self.minimum {
                    Some(minimum) if n < minimum => Err(ViolationKind::BelowMinimum { minimum }),
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Every field a book has. `year` is any integer.
pub const BOOK_SCHEMA: &[FieldSpec] = &[
    FieldSpec::string("isbn").immutable(),
    FieldSpec::string("amazon_url"),
    FieldSpec::string("author"),
    FieldSpec::string("language"),
    FieldSpec::integer("pages", Some(0)),
    FieldSpec::string("publisher"),
    FieldSpec::string("title"),
    FieldSpec::integer("year", None),
];

fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    BOOK_SCHEMA.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// All fields required.
    Create,
    /// Any subset of the mutable fields.
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    WrongType { expected: FieldType },
    BelowMinimum { minimum: i64 },
    UnknownField,
    Immutable,
    NotAnObject,
    Invalid { reason: String },
}

impl ViolationKind {
    /// Stable machine-readable code used in error details.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::Missing => "required",
            ViolationKind::WrongType { .. } => "type",
            ViolationKind::BelowMinimum { .. } => "minimum",
            ViolationKind::UnknownField => "unknown_field",
            ViolationKind::Immutable => "immutable",
            ViolationKind::NotAnObject => "not_an_object",
            ViolationKind::Invalid { .. } => "invalid",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => f.write_str("is required"),
            ViolationKind::WrongType { expected } => write!(f, "must be of type {}", expected),
            ViolationKind::BelowMinimum { minimum } => {
                write!(f, "must be greater than or equal to {}", minimum)
            }
            ViolationKind::UnknownField => f.write_str("is not a recognized field"),
            ViolationKind::Immutable => f.write_str("cannot be changed"),
            ViolationKind::NotAnObject => f.write_str("payload must be a JSON object"),
            ViolationKind::Invalid { reason } => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
}

impl FieldViolation {
    fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.field, self.kind)
        }
    }
}

/// A payload failed the schema. Carries every violation found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid book payload: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    fn single(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, kind)],
        }
    }

    #[cfg(test)]
    pub(crate) fn has(&self, field: &str, code: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.kind.code() == code)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `payload` against [`BOOK_SCHEMA`] and return the validated fields.
pub fn validate(payload: &Value, mode: ValidationMode) -> Result<Map<String, Value>, ValidationError> {
    let Some(object) = payload.as_object() else {
        return Err(ValidationError::single("", ViolationKind::NotAnObject));
    };

    let mut violations = Vec::new();

    for key in object.keys() {
        match field_spec(key) {
            None => violations.push(FieldViolation::new(key, ViolationKind::UnknownField)),
            Some(spec) if mode == ValidationMode::Update && !spec.mutable => {
                violations.push(FieldViolation::new(key, ViolationKind::Immutable))
            }
            Some(_) => {}
        }
    }

    let mut validated = Map::new();
    for spec in BOOK_SCHEMA {
        if mode == ValidationMode::Update && !spec.mutable {
            continue;
        }
        match object.get(spec.name) {
            None if mode == ValidationMode::Create => {
                violations.push(FieldViolation::new(spec.name, ViolationKind::Missing))
            }
            None => {}
            Some(value) => match spec.check(value) {
                Ok(()) => {
                    validated.insert(spec.name.to_string(), value.clone());
                }
                Err(kind) => violations.push(FieldViolation::new(spec.name, kind)),
            },
        }
    }

    if violations.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationError { violations })
    }
}

/// Validate a create payload into a complete [`Book`].
pub fn validate_new_book(payload: &Value) -> Result<Book, ValidationError> {
    let fields = validate(payload, ValidationMode::Create)?;
    from_fields(fields)
}

/// Validate an update payload into a [`BookPatch`].
pub fn validate_patch(payload: &Value) -> Result<BookPatch, ValidationError> {
    let fields = validate(payload, ValidationMode::Update)?;
    from_fields(fields)
}

fn from_fields<T: serde::de::DeserializeOwned>(fields: Map<String, Value>) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        ValidationError::single(
            "",
            ViolationKind::Invalid {
                reason: err.to_string(),
            },
        )
    })
}
