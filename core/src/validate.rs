//! Flat document validation.
//!
//! Validates a flat input document against a [`ComposedSchema`]. Every field,
//! own or merged through a link, is checked with the type rule its declaring
//! model gives it; prefixing only changes the name the value is read from.
//! All field errors are collected so callers can report every problem in one
//! pass.
//!
//! # Examples
//!
//! ```
//! use schema_link_core::*;
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .define(
//!         ModelDefinition::new("Database")
//!             .with_field(FieldDescriptor::required("host", FieldType::Str))
//!             .with_field(FieldDescriptor::required("port", FieldType::Int)),
//!     )
//!     .unwrap();
//! let schema = registry
//!     .define(ModelDefinition::new("Service").with_link(LinkDecl::new("db", "Database")))
//!     .unwrap();
//!
//! let document = json!({"db_host": "h"});
//! let failure = validate(&schema, document.as_object().unwrap(), &ValidateOptions::default())
//!     .unwrap_err();
//! assert_eq!(failure.errors.len(), 1);
//! assert_eq!(failure.errors[0].field, "db_port");
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::value::{FieldErrorKind, Value, coerce_scalar, json_kind};
use crate::{ComposedField, ComposedSchema, FieldType, reconstruct};

/// A flat input document: field name to raw value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// What to do with input fields the schema does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    /// Report each unknown field as an error (the default).
    #[default]
    Reject,
    /// Silently drop unknown fields.
    Drop,
}

/// Options for validation and instance building.
///
/// # Examples
///
/// ```
/// use schema_link_core::{UnknownFields, ValidateOptions};
///
/// let options: ValidateOptions = serde_json::from_str(r#"{"unknown_fields": "drop"}"#).unwrap();
/// assert_eq!(options.unknown_fields, UnknownFields::Drop);
/// assert!(options.inherit_links);
/// assert!(options.reconcile);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateOptions {
    /// Handling of undeclared input fields.
    pub unknown_fields: UnknownFields,
    /// Fill a nested model's missing link fields from a sibling model value.
    pub inherit_links: bool,
    /// Share structurally equal instances after building.
    pub reconcile: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Reject,
            inherit_links: true,
            reconcile: true,
        }
    }
}

impl ValidateOptions {
    /// Options that drop unknown fields instead of rejecting them.
    pub fn lenient() -> Self {
        Self {
            unknown_fields: UnknownFields::Drop,
            ..Self::default()
        }
    }
}

/// One field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct FieldError {
    /// Final field name; nested problems use a dotted path (`bar.f_a`).
    pub field: String,
    /// What went wrong.
    pub kind: FieldErrorKind,
}

/// Every field error found while validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Model the document was validated against.
    pub model: String,
    /// Errors in schema field order, then unknown fields.
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Returns `true` if an error is tagged with this field name.
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Gets every tagged field name.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error(s) for {}",
            self.errors.len(),
            self.model
        )?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Flat mapping of final field names to validated values.
///
/// Values appear in composed schema order. Consumed by
/// [`reconstruct`](crate::reconstruct).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInstance {
    model: String,
    values: Vec<(String, Value)>,
}

impl ValidatedInstance {
    /// Model the document was validated against.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Looks up a value by final field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All values in composed order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Consumes the instance, returning its values.
    pub fn into_values(self) -> Vec<(String, Value)> {
        self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validates a flat document against a composed schema.
///
/// Missing fields take their default, or `null` when optional; missing
/// required fields, values failing their type rule and (unless dropped by
/// `options`) unknown fields are all reported.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] listing every field error.
pub fn validate(
    schema: &ComposedSchema,
    document: &Document,
    options: &ValidateOptions,
) -> Result<ValidatedInstance, ValidationFailure> {
    let mut errors = Vec::new();
    let values = validate_fields(schema, document, options, "", &mut errors);

    if errors.is_empty() {
        Ok(ValidatedInstance {
            model: schema.name().to_string(),
            values,
        })
    } else {
        debug!(model = %schema.name(), errors = errors.len(), "document failed validation");
        Err(ValidationFailure {
            model: schema.name().to_string(),
            errors,
        })
    }
}

fn tag(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn validate_fields(
    schema: &ComposedSchema,
    document: &Document,
    options: &ValidateOptions,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Vec<(String, Value)> {
    let document = if options.inherit_links {
        inherit_linked_values(schema, document)
    } else {
        Cow::Borrowed(document)
    };

    let mut values = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let field_tag = tag(path, &field.name);
        let value = match document.get(&field.name) {
            None => match &field.default {
                Some(default) => Some(default.clone()),
                None if field.is_required() => {
                    errors.push(FieldError {
                        field: field_tag,
                        kind: FieldErrorKind::Missing,
                    });
                    None
                }
                None => Some(Value::Null),
            },
            Some(raw) if raw.is_null() => {
                if field.is_required() {
                    errors.push(FieldError {
                        field: field_tag,
                        kind: FieldErrorKind::Null,
                    });
                    None
                } else {
                    Some(Value::Null)
                }
            }
            Some(raw) => check_value(field.field_type(), field, raw, options, &field_tag, errors),
        };
        if let Some(value) = value {
            values.push((field.name.clone(), value));
        }
    }

    for key in document.keys() {
        if schema.contains(key) {
            continue;
        }
        match options.unknown_fields {
            UnknownFields::Reject => errors.push(FieldError {
                field: tag(path, key),
                kind: FieldErrorKind::Unknown,
            }),
            UnknownFields::Drop => {
                debug!(model = %schema.name(), field = %tag(path, key), "dropped unknown field");
            }
        }
    }

    values
}

fn check_value(
    field_type: &FieldType,
    field: &ComposedField,
    raw: &serde_json::Value,
    options: &ValidateOptions,
    field_tag: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let invalid_type = || FieldErrorKind::InvalidType {
        expected: field_type.expected(),
        found: json_kind(raw).to_string(),
    };

    match field_type {
        FieldType::List(inner) => {
            let Some(items) = raw.as_array() else {
                errors.push(FieldError {
                    field: field_tag.to_string(),
                    kind: invalid_type(),
                });
                return None;
            };
            let mut values = Vec::with_capacity(items.len());
            let mut failed = false;
            for (index, item) in items.iter().enumerate() {
                let item_tag = tag(field_tag, &index.to_string());
                if item.is_null() {
                    errors.push(FieldError {
                        field: item_tag,
                        kind: FieldErrorKind::Null,
                    });
                    failed = true;
                    continue;
                }
                match check_value(inner, field, item, options, &item_tag, errors) {
                    Some(value) => values.push(value),
                    None => failed = true,
                }
            }
            (!failed).then_some(Value::List(values))
        }
        FieldType::Model(_) => {
            let (Some(object), Some(nested)) = (raw.as_object(), field.nested.as_ref()) else {
                errors.push(FieldError {
                    field: field_tag.to_string(),
                    kind: invalid_type(),
                });
                return None;
            };
            let before = errors.len();
            let values = validate_fields(nested, object, options, field_tag, errors);
            if errors.len() > before {
                return None;
            }
            let validated = ValidatedInstance {
                model: nested.name().to_string(),
                values,
            };
            Some(Value::Model(Arc::new(reconstruct(nested, validated))))
        }
        scalar => match coerce_scalar(scalar, raw) {
            Ok(value) => Some(value),
            Err(kind) => {
                errors.push(FieldError {
                    field: field_tag.to_string(),
                    kind,
                });
                None
            }
        },
    }
}

/// Fills a nested model's link fields from a sibling model value.
///
/// For every model-typed field `F` whose model links `L -> T`, when another
/// model-typed field of type `T` holds an object, each `L_x` key missing
/// from `F`'s object is copied from the sibling's `x`. When several siblings
/// share type `T`, the last one declared is the source. Values already
/// present are never overridden.
fn inherit_linked_values<'d>(schema: &ComposedSchema, document: &'d Document) -> Cow<'d, Document> {
    let mut sources: HashMap<&str, &str> = HashMap::new();
    for field in schema.fields() {
        if let FieldType::Model(model) = field.field_type() {
            sources.insert(model.as_str(), field.name.as_str());
        }
    }
    if sources.len() < 2 {
        return Cow::Borrowed(document);
    }

    let mut document = Cow::Borrowed(document);
    for field in schema.fields() {
        let (FieldType::Model(_), Some(nested)) = (field.field_type(), field.nested.as_ref()) else {
            continue;
        };
        for link in nested.links() {
            let Some(&source_name) = sources.get(link.schema.name()) else {
                continue;
            };
            if source_name == field.name {
                continue;
            }

            let copies: Vec<(String, serde_json::Value)> = {
                let (Some(dest), Some(source)) = (
                    document.get(&field.name).and_then(|v| v.as_object()),
                    document.get(source_name).and_then(|v| v.as_object()),
                ) else {
                    continue;
                };
                link.schema
                    .fields()
                    .iter()
                    .filter_map(|linked| {
                        let key = link.prefixed(&linked.name);
                        if dest.contains_key(&key) {
                            return None;
                        }
                        source.get(&linked.name).map(|value| (key, value.clone()))
                    })
                    .collect()
            };
            if copies.is_empty() {
                continue;
            }

            debug!(
                field = %field.name,
                link = %link.name,
                source = %source_name,
                copied = copies.len(),
                "inherited linked values from sibling"
            );
            if let Some(dest) = document
                .to_mut()
                .get_mut(&field.name)
                .and_then(|v| v.as_object_mut())
            {
                dest.extend(copies);
            }
        }
    }
    document
}
