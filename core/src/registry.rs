//! Model registry with composed schema cache.
//!
//! Provides [`SchemaRegistry`], the lookup table of declared models. Every
//! model accepted by the registry has already been composed, so lookups and
//! validation only need shared access and the registry can be used from many
//! threads at once.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::compose::Composer;
use crate::{
    BuildError, ComposedSchema, Document, ModelDefinition, ModelInstance, SchemaCatalog,
    SchemaError, ValidateOptions, check_catalog, check_definition, validate_and_build,
};

/// In-memory collection of model definitions and their composed schemas.
///
/// Registration is transactional: when [`define`](Self::define) or
/// [`define_all`](Self::define_all) fails, the registry is left exactly as
/// it was.
///
/// # Examples
///
/// ```
/// use schema_link_core::*;
/// use serde_json::json;
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .define(
///         ModelDefinition::new("Database")
///             .with_field(FieldDescriptor::required("host", FieldType::Str))
///             .with_field(FieldDescriptor::required("port", FieldType::Int)),
///     )
///     .unwrap();
/// registry
///     .define(
///         ModelDefinition::new("Service")
///             .with_field(FieldDescriptor::required("title", FieldType::Str))
///             .with_link(LinkDecl::new("db", "Database")),
///     )
///     .unwrap();
///
/// let document = json!({"title": "x", "db_host": "h", "db_port": 1});
/// let instance = registry
///     .validate_and_build("Service", document.as_object().unwrap(), &ValidateOptions::default())
///     .unwrap();
/// assert_eq!(instance.link("db").unwrap().get("port"), Some(&Value::Int(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: HashMap<String, Arc<ModelDefinition>>,
    composed: HashMap<String, Arc<ComposedSchema>>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every model of a catalog.
    ///
    /// Models may reference each other in any order.
    ///
    /// # Errors
    ///
    /// Returns the first problem found by [`check_catalog`] or by
    /// composition.
    pub fn from_catalog(catalog: &SchemaCatalog) -> Result<Self, SchemaError> {
        if let Some(err) = check_catalog(catalog).into_iter().next() {
            return Err(err);
        }
        let mut registry = Self::new();
        registry.define_all(catalog.models.clone())?;
        Ok(registry)
    }

    /// Registers a model and composes it.
    ///
    /// Every link target and nested model type must already be registered.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the definition fails its structural
    /// checks, duplicates a registered name, or cannot be composed.
    pub fn define(
        &mut self,
        definition: ModelDefinition,
    ) -> Result<Arc<ComposedSchema>, SchemaError> {
        let name = definition.name.clone();
        self.define_all(vec![definition])?;
        self.composed
            .get(&name)
            .cloned()
            .ok_or(SchemaError::UnknownModel {
                name,
                referenced_by: "registry".to_string(),
            })
    }

    /// Registers a batch of models, then composes all of them.
    ///
    /// Models in the batch may reference each other in any order, which is
    /// what catalogs need.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found; nothing from the batch is
    /// registered in that case.
    pub fn define_all(&mut self, definitions: Vec<ModelDefinition>) -> Result<(), SchemaError> {
        let mut next = self.clone();
        let mut batch = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if let Some(err) = check_definition(&definition).into_iter().next() {
                return Err(err);
            }
            if next.definitions.contains_key(&definition.name) {
                return Err(SchemaError::DuplicateModel(definition.name));
            }
            batch.push(definition.name.clone());
            next.order.push(definition.name.clone());
            next.definitions
                .insert(definition.name.clone(), Arc::new(definition));
        }

        {
            let mut composer = Composer::new(&next.definitions, &mut next.composed);
            for name in &batch {
                composer.compose(name, "registry")?;
            }
        }

        debug!(models = batch.len(), total = next.order.len(), "registered models");
        *self = next;
        Ok(())
    }

    /// Returns the cached composed schema of a model.
    ///
    /// Composition is idempotent: every call returns the same `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownModel`] if the model is not registered.
    pub fn compose(&self, name: &str) -> Result<Arc<ComposedSchema>, SchemaError> {
        self.composed
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownModel {
                name: name.to_string(),
                referenced_by: "caller".to_string(),
            })
    }

    /// Looks up a model definition by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ModelDefinition>> {
        self.definitions.get(name)
    }

    /// Looks up a composed schema by model name.
    pub fn composed(&self, name: &str) -> Option<&Arc<ComposedSchema>> {
        self.composed.get(name)
    }

    /// Returns `true` if a model with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns an iterator over model names in registration order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Validates a flat document against a registered model and builds the
    /// reconciled instance.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Schema`] for an unknown model and
    /// [`BuildError::Validation`] when the document does not validate.
    pub fn validate_and_build(
        &self,
        name: &str,
        document: &Document,
        options: &ValidateOptions,
    ) -> Result<ModelInstance, BuildError> {
        let schema = self.compose(name)?;
        Ok(validate_and_build(&schema, document, options)?)
    }
}
