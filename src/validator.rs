//! Whitelist and schema checks over a parsed tree.
//!
//! The walk is pre-order and stops at the first violation. Shape checks are
//! repeated here so trees built by hand get the same guarantees as parsed ones.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

use crate::{
    ast::{Node, Operator},
    options::{FieldType, FieldTypeDefinition, WhitelistOptions},
    value::{Scalar, Value},
};

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID pattern is valid")
});

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A query used a field, operator or value outside the caller's policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is not allowed. Allowed fields: {}", .allowed.join(", "))]
    FieldNotAllowed { field: String, allowed: Vec<String> },

    #[error(
        "Operator '{operator}' is not allowed on field '{field}'. Allowed operators: {}",
        join_operators(.allowed)
    )]
    OperatorNotAllowed {
        field: String,
        operator: Operator,
        allowed: Vec<Operator>,
    },

    #[error("Operator '{operator}' on field '{field}' requires {expected}")]
    InvalidValueShape {
        field: String,
        operator: Operator,
        expected: &'static str,
    },

    #[error("Operator '{operator}' on field '{field}' requires a string value")]
    StringRequired { field: String, operator: Operator },

    #[error("Value for field '{field}' was rejected by its custom validator")]
    CustomValidation { field: String, operator: Operator },

    #[error("Field '{field}' does not accept null values")]
    NullNotAllowed { field: String, operator: Operator },

    #[error("Invalid value for field '{field}': expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        operator: Operator,
        expected: FieldType,
        found: String,
    },

    #[error(
        "Invalid value for field '{field}': {found} is not one of [{}]",
        .allowed.join(", ")
    )]
    EnumMismatch {
        field: String,
        operator: Operator,
        allowed: Vec<String>,
        found: String,
    },
}

fn join_operators(operators: &[Operator]) -> String {
    operators
        .iter()
        .map(|op| op.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::FieldNotAllowed { field, .. }
            | ValidationError::OperatorNotAllowed { field, .. }
            | ValidationError::InvalidValueShape { field, .. }
            | ValidationError::StringRequired { field, .. }
            | ValidationError::CustomValidation { field, .. }
            | ValidationError::NullNotAllowed { field, .. }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::EnumMismatch { field, .. } => field,
        }
    }

    /// The offending operator; field whitelist failures are reported before
    /// the operator is looked at and carry none.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            ValidationError::FieldNotAllowed { .. } => None,
            ValidationError::OperatorNotAllowed { operator, .. }
            | ValidationError::InvalidValueShape { operator, .. }
            | ValidationError::StringRequired { operator, .. }
            | ValidationError::CustomValidation { operator, .. }
            | ValidationError::NullNotAllowed { operator, .. }
            | ValidationError::TypeMismatch { operator, .. }
            | ValidationError::EnumMismatch { operator, .. } => Some(*operator),
        }
    }
}

/// Validates every comparison in `node` against `whitelist`.
pub fn validate(node: &Node, whitelist: &WhitelistOptions) -> Result<(), ValidationError> {
    match node {
        Node::Comparison { field, op, value } => validate_comparison(field, *op, value, whitelist),
        Node::Logical { left, right, .. } => {
            validate(left, whitelist)?;
            validate(right, whitelist)
        }
        Node::Not(child) => validate(child, whitelist),
    }
}

fn validate_comparison(
    field: &str,
    op: Operator,
    value: &Value,
    whitelist: &WhitelistOptions,
) -> Result<(), ValidationError> {
    if let Some(allowed) = &whitelist.allowed_fields {
        if !allowed.contains(field) {
            return Err(ValidationError::FieldNotAllowed {
                field: field.to_string(),
                allowed: allowed.iter().cloned().collect(),
            });
        }
    }

    if let Some(allowed) = &whitelist.allowed_operators {
        if !allowed.contains(&op) {
            return Err(ValidationError::OperatorNotAllowed {
                field: field.to_string(),
                operator: op,
                allowed: allowed.iter().copied().collect(),
            });
        }
    }

    if !Node::has_valid_shape(op, value) {
        return Err(ValidationError::InvalidValueShape {
            field: field.to_string(),
            operator: op,
            expected: expected_shape(op),
        });
    }

    let Some(definition) = whitelist.field_types.as_ref().and_then(|m| m.get(field)) else {
        return Ok(());
    };
    let checker = TypeChecker {
        field,
        op,
        definition,
    };

    if let Some(predicate) = &definition.validator {
        if !predicate(value) {
            return Err(ValidationError::CustomValidation {
                field: field.to_string(),
                operator: op,
            });
        }
    }

    match (op, value) {
        (Operator::In | Operator::NotIn, Value::List(items)) => items
            .iter()
            .try_for_each(|item| checker.check(item, definition.field_type)),
        (Operator::Between, Value::Range(lower, upper)) => {
            // A null bound leaves that side open and is not type-checked
            [lower, upper]
                .into_iter()
                .filter(|bound| !bound.is_null())
                .try_for_each(|bound| checker.check(bound, definition.field_type))
        }
        (op, value) if op.is_pattern() => match value {
            Value::Scalar(scalar @ Scalar::String(_)) => {
                checker.check(scalar, definition.field_type)
            }
            _ => Err(ValidationError::StringRequired {
                field: field.to_string(),
                operator: op,
            }),
        },
        (_, Value::Scalar(scalar)) => checker.check(scalar, definition.field_type),
        (_, Value::List(items)) if definition.accepts_arrays => {
            let element_type = definition.element_type.unwrap_or(definition.field_type);
            items
                .iter()
                .try_for_each(|item| checker.check(item, element_type))
        }
        _ => Err(ValidationError::InvalidValueShape {
            field: field.to_string(),
            operator: op,
            expected: "a single value",
        }),
    }
}

fn expected_shape(op: Operator) -> &'static str {
    match op {
        Operator::In | Operator::NotIn => "an array value",
        Operator::Between => "a [lower, upper] range",
        _ => "a single value",
    }
}

struct TypeChecker<'a> {
    field: &'a str,
    op: Operator,
    definition: &'a FieldTypeDefinition,
}

impl TypeChecker<'_> {
    fn check(&self, value: &Scalar, field_type: FieldType) -> Result<(), ValidationError> {
        if value.is_null() {
            return if self.definition.allow_null {
                Ok(())
            } else {
                Err(ValidationError::NullNotAllowed {
                    field: self.field.to_string(),
                    operator: self.op,
                })
            };
        }

        let ok = match field_type {
            FieldType::String => matches!(value, Scalar::String(_)),
            FieldType::Number => match value {
                Scalar::Integer(_) => true,
                Scalar::Float(n) => n.is_finite(),
                _ => false,
            },
            FieldType::Boolean => matches!(value, Scalar::Boolean(_)),
            FieldType::Date | FieldType::Datetime => value.as_str().is_some_and(is_date_like),
            FieldType::Uuid => value.as_str().is_some_and(|s| UUID_PATTERN.is_match(s)),
            FieldType::Json => !matches!(value, Scalar::Null),
            FieldType::Enum => return self.check_enum(value),
        };

        if ok {
            Ok(())
        } else {
            Err(ValidationError::TypeMismatch {
                field: self.field.to_string(),
                operator: self.op,
                expected: field_type,
                found: describe(value),
            })
        }
    }

    fn check_enum(&self, value: &Scalar) -> Result<(), ValidationError> {
        let allowed = self.definition.enum_values.as_deref().unwrap_or_default();
        let found = allowed.iter().any(|candidate| scalar_eq(candidate, value));
        if found {
            return Ok(());
        }
        Err(ValidationError::EnumMismatch {
            field: self.field.to_string(),
            operator: self.op,
            allowed: allowed.iter().map(describe).collect(),
            found: describe(value),
        })
    }
}

/// Equality with `1` and `1.0` treated as the same number.
fn scalar_eq(a: &Scalar, b: &Scalar) -> bool {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn describe(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("\"{}\"", s),
        other => format!("{} {}", other.type_name(), other.as_text()),
    }
}

/// Calendar dates and date-times in the ISO 8601 / RFC 3339 / RFC 2822 forms.
fn is_date_like(text: &str) -> bool {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
        || NAIVE_DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_forms() {
        assert!(is_date_like("2024-01-01"));
        assert!(is_date_like("2024-01-01T10:30:00Z"));
        assert!(is_date_like("2024-01-01T10:30:00.123+02:00"));
        assert!(is_date_like("2024-01-01 10:30:00"));
        assert!(!is_date_like("2024-13-01"));
        assert!(!is_date_like("yesterday"));
    }

    #[test]
    fn test_uuid_pattern() {
        assert!(UUID_PATTERN.is_match("123e4567-e89b-12d3-a456-426614174000"));
        assert!(UUID_PATTERN.is_match("123E4567-E89B-42D3-A456-426614174000"));
        assert!(!UUID_PATTERN.is_match("123e4567-e89b-62d3-a456-426614174000"));
        assert!(!UUID_PATTERN.is_match("not-a-uuid"));
    }
}
