//! Typed field values and the per-field coercion rules.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use thiserror::Error;

use crate::{FieldType, ModelInstance};

/// A validated, typed field value.
///
/// Equality is structural: two [`Value::Model`] values are equal when their
/// instances hold equal fields, regardless of whether they share an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent optional value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Finite float value.
    Float(f64),
    /// String value.
    Str(String),
    /// List value.
    List(Vec<Value>),
    /// Nested model instance, possibly shared.
    Model(Arc<ModelInstance>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float, if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the nested instance, if this is a model value.
    pub fn as_model(&self) -> Option<&Arc<ModelInstance>> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Model(instance) => instance.serialize(serializer),
        }
    }
}

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    /// A required field is absent.
    #[error("field required")]
    Missing,
    /// The field is not part of the composed schema.
    #[error("unknown field")]
    Unknown,
    /// `null` given for a required field.
    #[error("value may not be null")]
    Null,
    /// The raw value has the wrong shape.
    #[error("expected {expected}, found {found}")]
    InvalidType { expected: String, found: String },
    /// A string could not be parsed into the expected type.
    #[error("invalid {expected} string: {value:?}")]
    InvalidString { expected: String, value: String },
    /// A number with a fractional part given for an integer field.
    #[error("expected an integer, found a number with a fractional part")]
    Fractional,
    /// A number outside the representable range.
    #[error("number out of range")]
    OutOfRange,
}

/// Names the JSON kind of a raw value for error messages.
pub(crate) fn json_kind(raw: &serde_json::Value) -> &'static str {
    match raw {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn invalid_type(field_type: &FieldType, raw: &serde_json::Value) -> FieldErrorKind {
    FieldErrorKind::InvalidType {
        expected: field_type.expected(),
        found: json_kind(raw).to_string(),
    }
}

/// Checks and coerces a non-null raw value against a scalar type.
///
/// Lists and model-typed fields are handled by the flat validator, which
/// needs error paths and nested schemas; passing one here is a type error.
pub(crate) fn coerce_scalar(
    field_type: &FieldType,
    raw: &serde_json::Value,
) -> Result<Value, FieldErrorKind> {
    use serde_json::Value as Json;

    match field_type {
        FieldType::Bool => match raw {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(invalid_type(field_type, raw)),
            },
            Json::String(s) => parse_bool(s).map(Value::Bool).ok_or_else(|| {
                FieldErrorKind::InvalidString {
                    expected: "bool".to_string(),
                    value: s.clone(),
                }
            }),
            _ => Err(invalid_type(field_type, raw)),
        },
        FieldType::Int => match raw {
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    Err(FieldErrorKind::OutOfRange)
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    float_to_int(f)
                }
            }
            Json::String(s) => {
                s.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| FieldErrorKind::InvalidString {
                        expected: "int".to_string(),
                        value: s.clone(),
                    })
            }
            _ => Err(invalid_type(field_type, raw)),
        },
        FieldType::Float => match raw {
            Json::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or(FieldErrorKind::OutOfRange),
            Json::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(|| FieldErrorKind::InvalidString {
                    expected: "float".to_string(),
                    value: s.clone(),
                }),
            _ => Err(invalid_type(field_type, raw)),
        },
        FieldType::Str => match raw {
            Json::String(s) => Ok(Value::Str(s.clone())),
            _ => Err(invalid_type(field_type, raw)),
        },
        FieldType::List(_) | FieldType::Model(_) => Err(invalid_type(field_type, raw)),
    }
}

fn float_to_int(f: f64) -> Result<Value, FieldErrorKind> {
    if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(FieldErrorKind::OutOfRange);
    }
    if f.fract() != 0.0 {
        return Err(FieldErrorKind::Fractional);
    }
    Ok(Value::Int(f as i64))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_coerce_bool_lax_inputs() {
        assert_eq!(coerce_scalar(&FieldType::Bool, &json!(true)), Ok(Value::Bool(true)));
        assert_eq!(coerce_scalar(&FieldType::Bool, &json!(0)), Ok(Value::Bool(false)));
        assert_eq!(coerce_scalar(&FieldType::Bool, &json!("Yes")), Ok(Value::Bool(true)));
        assert!(matches!(
            coerce_scalar(&FieldType::Bool, &json!("maybe")),
            Err(FieldErrorKind::InvalidString { .. })
        ));
        assert!(matches!(
            coerce_scalar(&FieldType::Bool, &json!(2)),
            Err(FieldErrorKind::InvalidType { .. })
        ));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_scalar(&FieldType::Int, &json!(42)), Ok(Value::Int(42)));
        assert_eq!(coerce_scalar(&FieldType::Int, &json!(3.0)), Ok(Value::Int(3)));
        assert_eq!(coerce_scalar(&FieldType::Int, &json!(" 7 ")), Ok(Value::Int(7)));
        assert_eq!(
            coerce_scalar(&FieldType::Int, &json!(3.5)),
            Err(FieldErrorKind::Fractional)
        );
        assert_eq!(
            coerce_scalar(&FieldType::Int, &json!(u64::MAX)),
            Err(FieldErrorKind::OutOfRange)
        );
        assert!(coerce_scalar(&FieldType::Int, &json!(true)).is_err());
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_scalar(&FieldType::Float, &json!(1)), Ok(Value::Float(1.0)));
        assert_eq!(
            coerce_scalar(&FieldType::Float, &json!("2.5")),
            Ok(Value::Float(2.5))
        );
        assert!(coerce_scalar(&FieldType::Float, &json!("inf")).is_err());
    }

    #[test]
    fn test_coerce_str_is_strict() {
        assert_eq!(
            coerce_scalar(&FieldType::Str, &json!("x")),
            Ok(Value::Str("x".to_string()))
        );
        assert_eq!(
            coerce_scalar(&FieldType::Str, &json!(1)),
            Err(FieldErrorKind::InvalidType {
                expected: "str".to_string(),
                found: "int".to_string(),
            })
        );
    }
}
