use serde::{Deserialize, Serialize};

use crate::ModelDefinition;

/// Serializable bundle of model definitions.
///
/// A catalog groups related [`ModelDefinition`] values with version metadata
/// so a whole family of linked models can be shipped as one JSON or YAML
/// file. Definitions may reference each other in any order; the registry
/// resolves links once every definition is present.
///
/// # Examples
///
/// ```
/// use schema_link_core::*;
///
/// let mut catalog = SchemaCatalog::new("1.0.0");
/// catalog.name = Some("services".into());
/// catalog.models.push(
///     ModelDefinition::new("Service").with_link(LinkDecl::new("db", "Database")),
/// );
/// catalog.models.push(
///     ModelDefinition::new("Database")
///         .with_field(FieldDescriptor::required("host", FieldType::Str)),
/// );
///
/// assert_eq!(catalog.model_count(), 2);
/// let registry = SchemaRegistry::from_catalog(&catalog).unwrap();
/// assert!(registry.composed("Service").unwrap().contains("db_host"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Catalog contract version (populated from
    /// [`CATALOG_CONTRACT_VERSION`](crate::CATALOG_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Catalog format version (semver string).
    pub version: String,
    /// Optional catalog name.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional catalog description.
    #[serde(default)]
    pub description: Option<String>,
    /// Model definitions included in this catalog.
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    ///
    /// The `schema_version` is automatically set from
    /// [`CATALOG_CONTRACT_VERSION`](crate::CATALOG_CONTRACT_VERSION).
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::CATALOG_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            models: Vec::new(),
        }
    }

    /// Adds a model definition.
    pub fn with_model(mut self, model: ModelDefinition) -> Self {
        self.models.push(model);
        self
    }

    /// Finds a model definition by name.
    pub fn find_model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Returns the number of models in this catalog.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}
