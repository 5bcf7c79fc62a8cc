//! Build-time error types.
//!
//! [`SchemaError`] covers everything that can go wrong while declaring or
//! composing models. These errors are fatal for the schema shape involved
//! and must be fixed by the schema author. Per-document problems are
//! reported separately as [`ValidationFailure`](crate::ValidationFailure).

use thiserror::Error;

use crate::ValidationFailure;

/// Errors raised while checking or composing model definitions.
///
/// Each variant describes a specific structural problem. No partial
/// composed schema is ever produced when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Catalog version string is empty.
    #[error("catalog version cannot be empty")]
    EmptyCatalogVersion,
    /// Model name is empty or whitespace-only.
    #[error("model name cannot be empty")]
    EmptyModelName,
    /// A field of `model` has an empty name.
    #[error("field name cannot be empty in model {model}")]
    EmptyFieldName { model: String },
    /// A link of `model` has an empty name.
    #[error("link name cannot be empty in model {model}")]
    EmptyLinkName { model: String },
    /// Two models share a name.
    #[error("duplicate model: {0}")]
    DuplicateModel(String),
    /// Two own fields of a model share a name.
    #[error("duplicate field in model {model}: {field}")]
    DuplicateField { model: String, field: String },
    /// Two links of a model share a name.
    #[error("duplicate link in model {model}: {link}")]
    DuplicateLink { model: String, link: String },
    /// A link has the same name as an own field of its model.
    #[error("link {link} in model {model} has the same name as a field")]
    LinkShadowsField { model: String, link: String },
    /// A partial link selects no field at all.
    #[error("link {link} in model {model} selects no fields")]
    EmptyLinkSelection { model: String, link: String },
    /// A link or model-typed field references an unregistered model.
    #[error("unknown model {name} referenced by {referenced_by}")]
    UnknownModel { name: String, referenced_by: String },
    /// A partial link selects a field its target does not declare.
    #[error("link {link} in model {model} selects unknown field {field}")]
    UnknownLinkField {
        model: String,
        link: String,
        field: String,
    },
    /// Composing a model requires composing itself.
    #[error("schema cycle detected: {path}")]
    SchemaCycle { path: String },
    /// Two sources produce the same final field name.
    #[error("field collision on {field}: {first} and {second}")]
    FieldCollision {
        field: String,
        first: String,
        second: String,
    },
    /// A declared default does not pass the field's own type rule.
    #[error("invalid default for {model}.{field}: {reason}")]
    InvalidDefault {
        model: String,
        field: String,
        reason: String,
    },
}

/// Errors from the combined validate-and-build entry point on a registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The requested model could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The document did not validate.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}
