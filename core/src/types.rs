//! Model definition types.
//!
//! This module defines the declarative side of the crate: what a model is
//! made of before composition. The types are designed for serialization with
//! [`serde`] so whole catalogs can round-trip through JSON or YAML.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version of the catalog contract (semver).
///
/// Embedded in every [`SchemaCatalog`](crate::SchemaCatalog) to track
/// compatibility across catalog versions.
pub const CATALOG_CONTRACT_VERSION: &str = "1.0.0";

/// Declared type of a field.
///
/// Serialized as a type string: `"bool"`, `"int"`, `"float"`, `"str"`,
/// `"list[T]"`, or the name of another model for a nested model-typed field.
///
/// # Examples
///
/// ```
/// use schema_link_core::FieldType;
///
/// let ty: FieldType = "list[int]".parse().unwrap();
/// assert_eq!(ty, FieldType::List(Box::new(FieldType::Int)));
/// assert_eq!(ty.to_string(), "list[int]");
///
/// let nested: FieldType = "Database".parse().unwrap();
/// assert_eq!(nested.model_name(), Some("Database"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// Boolean value.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Finite 64-bit float.
    Float,
    /// UTF-8 string.
    Str,
    /// Homogeneous list.
    List(Box<FieldType>),
    /// Nested value of another registered model.
    Model(String),
}

impl FieldType {
    /// Returns the model name this type refers to, looking through lists.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            FieldType::Model(name) => Some(name),
            FieldType::List(inner) => inner.model_name(),
            _ => None,
        }
    }

    /// Short human-readable name used in error messages.
    pub fn expected(&self) -> String {
        match self {
            FieldType::Model(name) => format!("object ({name})"),
            FieldType::List(_) => "array".to_string(),
            other => other.to_string(),
        }
    }
}

/// Error returned when a type string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field type: {0:?}")]
pub struct ParseFieldTypeError(pub String);

impl std::str::FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "bool" => return Ok(FieldType::Bool),
            "int" => return Ok(FieldType::Int),
            "float" => return Ok(FieldType::Float),
            "str" => return Ok(FieldType::Str),
            _ => {}
        }

        if let Some(inner) = trimmed
            .strip_prefix("list[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let inner = inner
                .parse::<FieldType>()
                .map_err(|_| ParseFieldTypeError(s.to_string()))?;
            return Ok(FieldType::List(Box::new(inner)));
        }

        let is_identifier = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !trimmed.starts_with(|c: char| c.is_ascii_digit());
        if is_identifier {
            Ok(FieldType::Model(trimmed.to_string()))
        } else {
            Err(ParseFieldTypeError(s.to_string()))
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = ParseFieldTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Float => f.write_str("float"),
            FieldType::Str => f.write_str("str"),
            FieldType::List(inner) => write!(f, "list[{inner}]"),
            FieldType::Model(name) => f.write_str(name),
        }
    }
}

fn default_required() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// A declared field of a model.
///
/// Use [`required`](FieldDescriptor::required) and
/// [`optional`](FieldDescriptor::optional) to create fields, then chain
/// builder methods like [`with_default`](FieldDescriptor::with_default).
///
/// # Examples
///
/// ```
/// use schema_link_core::{FieldDescriptor, FieldType};
///
/// let host = FieldDescriptor::required("host", FieldType::Str);
/// assert!(host.required);
///
/// let port = FieldDescriptor::required("port", FieldType::Int)
///     .with_default(serde_json::json!(5432));
/// assert!(!port.required);
/// assert_eq!(port.default, Some(serde_json::json!(5432)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within its model.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present in input.
    #[serde(default = "default_required", skip_serializing_if = "is_true")]
    pub required: bool,
    /// Raw default used when the field is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// Creates a required field.
    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required: true,
            default: None,
            description: None,
        }
    }

    /// Creates an optional field; a missing value becomes `null`.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_link_core::{FieldDescriptor, FieldType};
    ///
    /// let field = FieldDescriptor::optional("comment", FieldType::Str);
    /// assert!(!field.required);
    /// assert!(field.default.is_none());
    /// ```
    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// Sets a default value. A field with a default is never required.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// A named link from a host model to a target model.
///
/// All of the target's fields are merged into the host under the
/// `"{name}_"` prefix, unless `only` restricts the link to a subset of the
/// target's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDecl {
    /// Link name, used as field prefix.
    pub name: String,
    /// Name of the target model.
    pub target: String,
    /// Selected target fields (partial link).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
}

impl LinkDecl {
    /// Creates a link merging every field of `target`.
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            only: None,
        }
    }

    /// Creates a link merging only the listed fields of `target`.
    pub fn partial(name: &str, target: &str, fields: &[&str]) -> Self {
        Self {
            only: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..Self::new(name, target)
        }
    }

    /// Returns `true` if this link selects a subset of the target.
    pub fn is_partial(&self) -> bool {
        self.only.is_some()
    }
}

/// Declaration of a model: its own fields plus its links.
///
/// A definition is inert until it is registered with a
/// [`SchemaRegistry`](crate::SchemaRegistry), which composes it.
///
/// # Examples
///
/// ```
/// use schema_link_core::*;
///
/// let database = ModelDefinition::new("Database")
///     .with_field(FieldDescriptor::required("host", FieldType::Str))
///     .with_field(FieldDescriptor::required("port", FieldType::Int));
///
/// let service = ModelDefinition::new("Service")
///     .with_field(FieldDescriptor::required("title", FieldType::Str))
///     .with_link(LinkDecl::new("db", "Database"));
///
/// assert_eq!(service.link_names(), vec!["db"]);
/// assert!(database.find_field("port").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model name, unique within a registry.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Own fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Links, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDecl>,
}

impl ModelDefinition {
    /// Creates an empty definition with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builds a definition from its parts in one call.
    pub fn define(name: &str, fields: Vec<FieldDescriptor>, links: Vec<LinkDecl>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            fields,
            links,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds an own field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a link.
    pub fn with_link(mut self, link: LinkDecl) -> Self {
        self.links.push(link);
        self
    }

    /// Finds an own field by name.
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a link by name.
    pub fn find_link(&self, name: &str) -> Option<&LinkDecl> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Gets all link names in declaration order.
    pub fn link_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse_scalars() {
        assert_eq!("bool".parse::<FieldType>().unwrap(), FieldType::Bool);
        assert_eq!("int".parse::<FieldType>().unwrap(), FieldType::Int);
        assert_eq!("float".parse::<FieldType>().unwrap(), FieldType::Float);
        assert_eq!("str".parse::<FieldType>().unwrap(), FieldType::Str);
    }

    #[test]
    fn test_field_type_parse_nested_list_of_models() {
        let ty: FieldType = "list[list[Foo]]".parse().unwrap();
        assert_eq!(ty.model_name(), Some("Foo"));
        assert_eq!(ty.to_string(), "list[list[Foo]]");
    }

    #[test]
    fn test_field_type_rejects_garbage() {
        assert!("list[".parse::<FieldType>().is_err());
        assert!("".parse::<FieldType>().is_err());
        assert!("9lives".parse::<FieldType>().is_err());
        assert!("a-b".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_descriptor_serde_defaults() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "port", "type": "int"}"#).unwrap();
        assert!(field.required);
        assert_eq!(field.field_type, FieldType::Int);

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json, serde_json::json!({"name": "port", "type": "int"}));
    }

    #[test]
    fn test_with_default_makes_optional() {
        let field = FieldDescriptor::required("port", FieldType::Int)
            .with_default(serde_json::json!(80));
        assert!(!field.required);
    }

    #[test]
    fn test_partial_link() {
        let link = LinkDecl::partial("f", "Foo", &["a"]);
        assert!(link.is_partial());
        assert_eq!(link.only, Some(vec!["a".to_string()]));
        assert!(!LinkDecl::new("f", "Foo").is_partial());
    }
}
