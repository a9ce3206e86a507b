//! Extension argument validation -- pure logic, no database access.
//!
//! Checks a value map against an extension's argument schema: required
//! arguments, type conformance, numeric bounds (inclusive), string
//! enumerations, patterns, and lengths. Object and array arguments recurse.
//! Validation stops at the first violation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::extension_spec::{ArgumentKind, ArgumentSpec, ExtensionSpec};
use crate::masking::is_masked;

/// What is wrong with an argument value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    #[error("is required")]
    Missing,

    #[error("must be of type {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("must be at least {minimum}")]
    BelowMinimum { minimum: String },

    #[error("must be at most {maximum}")]
    AboveMaximum { maximum: String },

    #[error("must be one of: {}", .allowed.join(", "))]
    NotAllowed { allowed: Vec<String> },

    #[error("must match pattern {pattern}")]
    PatternMismatch { pattern: String },

    #[error("must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("must be at most {max} characters long")]
    TooLong { max: usize },
}

/// The first rule an argument value broke, with its dotted path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("argument '{path}' {kind}")]
pub struct ArgumentViolation {
    pub path: String,
    pub kind: ViolationKind,
}

impl ArgumentViolation {
    /// Wrap the violation in a validation error naming the extension.
    pub fn for_extension(&self, extension_name: &str) -> CoreError {
        CoreError::Validation(format!("Extension '{extension_name}' is invalid: {self}"))
    }
}

/// Validate `values` against every argument declared by `spec`.
///
/// A value equal to the masking placeholder counts as missing. Keys without a
/// schema entry are not checked.
pub fn validate_arguments(
    values: &Map<String, Value>,
    spec: &ExtensionSpec,
) -> Result<(), ArgumentViolation> {
    validate_map(values, &spec.arguments, "")
}

/// Validate an extension's values, mapping a violation to [`CoreError`].
pub fn validate_extension_values(
    values: &Map<String, Value>,
    spec: &ExtensionSpec,
) -> Result<(), CoreError> {
    validate_arguments(values, spec).map_err(|v| v.for_extension(&spec.name))
}

fn validate_map(
    values: &Map<String, Value>,
    arguments: &BTreeMap<String, ArgumentSpec>,
    prefix: &str,
) -> Result<(), ArgumentViolation> {
    for (name, arg) in arguments {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match values.get(name) {
            Some(value) if !is_absent(value, arg) => validate_value(value, arg, &path)?,
            _ if arg.required => {
                return Err(ArgumentViolation {
                    path,
                    kind: ViolationKind::Missing,
                })
            }
            _ => {}
        }
    }
    Ok(())
}

/// Null and empty strings are missing. The placeholder is missing only where
/// the argument is secret; elsewhere it is an ordinary string.
fn is_absent(value: &Value, arg: &ArgumentSpec) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || (arg.is_secret() && is_masked(value)),
        _ => false,
    }
}

fn validate_value(value: &Value, arg: &ArgumentSpec, path: &str) -> Result<(), ArgumentViolation> {
    let fail = |kind| {
        Err(ArgumentViolation {
            path: path.to_string(),
            kind,
        })
    };
    let wrong_type = || ViolationKind::WrongType {
        expected: arg.type_name(),
        found: json_type_name(value),
    };

    match &arg.kind {
        ArgumentKind::String {
            allowed,
            pattern,
            min_length,
            max_length,
        } => {
            let Some(s) = value.as_str() else {
                return fail(wrong_type());
            };
            let len = s.chars().count();
            if let Some(min) = *min_length {
                if len < min {
                    return fail(ViolationKind::TooShort { min });
                }
            }
            if let Some(max) = *max_length {
                if len > max {
                    return fail(ViolationKind::TooLong { max });
                }
            }
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|a| a == s) {
                    return fail(ViolationKind::NotAllowed {
                        allowed: allowed.clone(),
                    });
                }
            }
            if let Some(pattern) = pattern {
                if !pattern.is_match(s) {
                    return fail(ViolationKind::PatternMismatch {
                        pattern: pattern.as_str().to_string(),
                    });
                }
            }
            Ok(())
        }
        ArgumentKind::Number { minimum, maximum } => {
            let Some(n) = value.as_f64() else {
                return fail(wrong_type());
            };
            if let Some(min) = *minimum {
                if n < min {
                    return fail(ViolationKind::BelowMinimum {
                        minimum: min.to_string(),
                    });
                }
            }
            if let Some(max) = *maximum {
                if n > max {
                    return fail(ViolationKind::AboveMaximum {
                        maximum: max.to_string(),
                    });
                }
            }
            Ok(())
        }
        ArgumentKind::Integer { minimum, maximum } => {
            let Some(n) = value.as_i64() else {
                return fail(wrong_type());
            };
            if let Some(min) = *minimum {
                if n < min {
                    return fail(ViolationKind::BelowMinimum {
                        minimum: min.to_string(),
                    });
                }
            }
            if let Some(max) = *maximum {
                if n > max {
                    return fail(ViolationKind::AboveMaximum {
                        maximum: max.to_string(),
                    });
                }
            }
            Ok(())
        }
        ArgumentKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                fail(wrong_type())
            }
        }
        ArgumentKind::Object { properties } => match value.as_object() {
            Some(inner) => validate_map(inner, properties, path),
            None => fail(wrong_type()),
        },
        ArgumentKind::Array { items } => {
            let Some(elements) = value.as_array() else {
                return fail(wrong_type());
            };
            if let Some(items) = items {
                for (i, element) in elements.iter().enumerate() {
                    let element_path = format!("{path}[{i}]");
                    if items.is_secret() && is_masked(element) {
                        return Err(ArgumentViolation {
                            path: element_path,
                            kind: ViolationKind::Missing,
                        });
                    }
                    validate_value(element, items, &element_path)?;
                }
            }
            Ok(())
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
