//! Schema composition.
//!
//! A model's composed schema is its own fields followed, for each link in
//! declaration order, by the target's composed fields renamed
//! `"{link}_{field}"`. Composition recurses through links and model-typed
//! fields, rejects cycles and name collisions, and is cached per model so
//! every caller shares one immutable [`ComposedSchema`].
//!
//! # Example
//!
//! ```
//! use schema_link_core::*;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .define(
//!         ModelDefinition::new("Database")
//!             .with_field(FieldDescriptor::required("host", FieldType::Str))
//!             .with_field(FieldDescriptor::required("port", FieldType::Int)),
//!     )
//!     .unwrap();
//! let service = registry
//!     .define(
//!         ModelDefinition::new("Service")
//!             .with_field(FieldDescriptor::required("title", FieldType::Str))
//!             .with_link(LinkDecl::new("db", "Database")),
//!     )
//!     .unwrap();
//!
//! assert_eq!(service.field_names(), vec!["title", "db_host", "db_port"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::value::{Value, coerce_scalar};
use crate::{FieldDescriptor, FieldType, LinkDecl, ModelDefinition, SchemaError};

/// Where a composed field comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSource {
    /// Model that declares the field.
    pub model: String,
    /// Field name as declared by that model.
    pub field: String,
    /// Links followed from the composed model to reach the declaring model.
    pub link_path: Vec<String>,
}

impl FieldSource {
    /// Returns `true` if the field is declared by the composed model itself.
    pub fn is_own(&self) -> bool {
        self.link_path.is_empty()
    }
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.field)?;
        if !self.link_path.is_empty() {
            write!(f, " (via link {})", self.link_path.join("."))?;
        }
        Ok(())
    }
}

/// One field of a composed schema.
#[derive(Debug, Clone)]
pub struct ComposedField {
    /// Final (prefixed) field name.
    pub name: String,
    /// Descriptor as declared by the owning model; its name is unprefixed.
    pub descriptor: FieldDescriptor,
    /// Default coerced by the field's own type rule.
    pub default: Option<Value>,
    /// Declaring model and link path.
    pub source: FieldSource,
    /// Composed schema of the model a model-typed field holds.
    pub nested: Option<Arc<ComposedSchema>>,
}

impl ComposedField {
    /// Declared type of the field.
    pub fn field_type(&self) -> &FieldType {
        &self.descriptor.field_type
    }

    /// Whether the field must be present in input.
    pub fn is_required(&self) -> bool {
        self.descriptor.required && self.default.is_none()
    }
}

/// A link of a composed schema, with the target's own composed schema.
#[derive(Debug, Clone)]
pub struct ComposedLink {
    /// Link name.
    pub name: String,
    /// Target schema; a projection of the target for partial links.
    pub schema: Arc<ComposedSchema>,
}

impl ComposedLink {
    /// Final field name in the host for a field name of the target schema.
    pub fn prefixed(&self, field: &str) -> String {
        format!("{}_{}", self.name, field)
    }
}

/// Immutable merged field set of a model and everything it links to.
///
/// Created once per model by the registry and shared through `Arc`; safe to
/// validate against from many threads at once.
#[derive(Debug, Clone)]
pub struct ComposedSchema {
    definition: Arc<ModelDefinition>,
    fields: Vec<ComposedField>,
    links: Vec<ComposedLink>,
}

impl ComposedSchema {
    /// Definition this schema was composed from.
    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// All composed fields: own fields first, then link fields.
    pub fn fields(&self) -> &[ComposedField] {
        &self.fields
    }

    /// Links in declaration order.
    pub fn links(&self) -> &[ComposedLink] {
        &self.links
    }

    /// Finds a composed field by final name.
    pub fn field(&self, name: &str) -> Option<&ComposedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a link by name.
    pub fn link(&self, name: &str) -> Option<&ComposedLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Returns `true` if a field with this final name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Gets all final field names in composed order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Iterates over the fields declared by the model itself.
    pub fn own_fields(&self) -> impl Iterator<Item = &ComposedField> {
        self.fields.iter().filter(|f| f.source.is_own())
    }

    /// Number of composed fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Restricts the schema to the named own fields, dropping links.
    fn project(&self, only: &[String]) -> ComposedSchema {
        let fields = self
            .own_fields()
            .filter(|f| only.iter().any(|name| *name == f.name))
            .cloned()
            .collect();
        ComposedSchema {
            definition: Arc::clone(&self.definition),
            fields,
            links: Vec::new(),
        }
    }
}

/// Recursive composer over a set of declared definitions.
///
/// `cache` holds every schema composed so far; `stack` is the chain of
/// models currently being composed and drives cycle detection.
pub(crate) struct Composer<'a> {
    definitions: &'a HashMap<String, Arc<ModelDefinition>>,
    cache: &'a mut HashMap<String, Arc<ComposedSchema>>,
    stack: Vec<String>,
}

impl<'a> Composer<'a> {
    pub(crate) fn new(
        definitions: &'a HashMap<String, Arc<ModelDefinition>>,
        cache: &'a mut HashMap<String, Arc<ComposedSchema>>,
    ) -> Self {
        Self {
            definitions,
            cache,
            stack: Vec::new(),
        }
    }

    pub(crate) fn compose(
        &mut self,
        name: &str,
        referenced_by: &str,
    ) -> Result<Arc<ComposedSchema>, SchemaError> {
        if let Some(position) = self.stack.iter().position(|m| m == name) {
            let path = self.stack[position..]
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(SchemaError::SchemaCycle { path });
        }

        if let Some(schema) = self.cache.get(name) {
            trace!(model = %name, "composed schema cache hit");
            return Ok(Arc::clone(schema));
        }

        let definition = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownModel {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })?;

        self.stack.push(name.to_string());
        let result = self.compose_definition(definition);
        self.stack.pop();

        let schema = Arc::new(result?);
        debug!(
            model = %name,
            fields = schema.len(),
            links = schema.links.len(),
            "composed schema"
        );
        self.cache.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn compose_definition(
        &mut self,
        definition: Arc<ModelDefinition>,
    ) -> Result<ComposedSchema, SchemaError> {
        let mut merged = FieldSet::default();

        for descriptor in &definition.fields {
            let nested = match descriptor.field_type.model_name() {
                Some(model) => {
                    let referenced_by = format!("{}.{}", definition.name, descriptor.name);
                    Some(self.compose(model, &referenced_by)?)
                }
                None => None,
            };
            let default = coerce_default(&definition.name, descriptor)?;
            merged.push(ComposedField {
                name: descriptor.name.clone(),
                descriptor: descriptor.clone(),
                default,
                source: FieldSource {
                    model: definition.name.clone(),
                    field: descriptor.name.clone(),
                    link_path: Vec::new(),
                },
                nested,
            })?;
        }

        let mut links = Vec::with_capacity(definition.links.len());
        for link in &definition.links {
            let target = self.compose(
                &link.target,
                &format!("{}.{}", definition.name, link.name),
            )?;
            let schema = match &link.only {
                Some(only) => Arc::new(project_target(&definition.name, link, &target, only)?),
                None => target,
            };

            let composed = ComposedLink {
                name: link.name.clone(),
                schema,
            };
            for field in composed.schema.fields() {
                let mut source = field.source.clone();
                source.link_path.insert(0, link.name.clone());
                merged.push(ComposedField {
                    name: composed.prefixed(&field.name),
                    source,
                    ..field.clone()
                })?;
            }
            links.push(composed);
        }

        Ok(ComposedSchema {
            definition,
            fields: merged.fields,
            links,
        })
    }
}

fn project_target(
    model: &str,
    link: &LinkDecl,
    target: &ComposedSchema,
    only: &[String],
) -> Result<ComposedSchema, SchemaError> {
    for field in only {
        if target.definition().find_field(field).is_none() {
            return Err(SchemaError::UnknownLinkField {
                model: model.to_string(),
                link: link.name.clone(),
                field: field.clone(),
            });
        }
    }
    Ok(target.project(only))
}

fn coerce_default(
    model: &str,
    descriptor: &FieldDescriptor,
) -> Result<Option<Value>, SchemaError> {
    let Some(raw) = &descriptor.default else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(Some(Value::Null));
    }
    default_value(&descriptor.field_type, raw)
        .map(Some)
        .map_err(|reason| SchemaError::InvalidDefault {
            model: model.to_string(),
            field: descriptor.name.clone(),
            reason,
        })
}

fn default_value(field_type: &FieldType, raw: &serde_json::Value) -> Result<Value, String> {
    match field_type {
        FieldType::Model(_) => Err("model-typed fields only accept a null default".to_string()),
        FieldType::List(inner) => raw
            .as_array()
            .ok_or_else(|| format!("expected array, found {raw}"))?
            .iter()
            .map(|item| default_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        scalar => coerce_scalar(scalar, raw).map_err(|kind| kind.to_string()),
    }
}

/// Ordered field list with collision detection on final names.
#[derive(Default)]
struct FieldSet {
    fields: Vec<ComposedField>,
    index: HashMap<String, usize>,
}

impl FieldSet {
    fn push(&mut self, field: ComposedField) -> Result<(), SchemaError> {
        if let Some(&existing) = self.index.get(&field.name) {
            return Err(SchemaError::FieldCollision {
                field: field.name.clone(),
                first: self.fields[existing].source.to_string(),
                second: field.source.to_string(),
            });
        }
        self.index.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::SchemaRegistry;

    fn database() -> ModelDefinition {
        ModelDefinition::new("Database")
            .with_field(FieldDescriptor::required("host", FieldType::Str))
            .with_field(FieldDescriptor::required("port", FieldType::Int))
    }

    #[test]
    fn test_compose_without_links_keeps_own_fields() {
        let mut registry = SchemaRegistry::new();
        let schema = registry.define(database()).unwrap();
        assert_eq!(schema.field_names(), vec!["host", "port"]);
        assert!(schema.links().is_empty());
        assert!(schema.fields().iter().all(|f| f.source.is_own()));
    }

    #[test]
    fn test_compose_prefixes_link_fields_in_declaration_order() {
        let mut registry = SchemaRegistry::new();
        registry.define(database()).unwrap();
        registry
            .define(ModelDefinition::new("Cache").with_field(FieldDescriptor::required(
                "url",
                FieldType::Str,
            )))
            .unwrap();
        let schema = registry
            .define(
                ModelDefinition::new("Service")
                    .with_field(FieldDescriptor::required("title", FieldType::Str))
                    .with_link(LinkDecl::new("cache", "Cache"))
                    .with_link(LinkDecl::new("db", "Database")),
            )
            .unwrap();

        assert_eq!(
            schema.field_names(),
            vec!["title", "cache_url", "db_host", "db_port"]
        );
        let port = schema.field("db_port").unwrap();
        assert_eq!(port.descriptor.name, "port");
        assert_eq!(port.source.link_path, vec!["db"]);
        assert_eq!(port.source.to_string(), "Database.port (via link db)");
    }

    #[test]
    fn test_compose_nested_links() {
        let mut registry = SchemaRegistry::new();
        registry.define(database()).unwrap();
        registry
            .define(ModelDefinition::new("Backend").with_link(LinkDecl::new("db", "Database")))
            .unwrap();
        let schema = registry
            .define(ModelDefinition::new("App").with_link(LinkDecl::new("api", "Backend")))
            .unwrap();

        assert_eq!(schema.field_names(), vec!["api_db_host", "api_db_port"]);
        let host = schema.field("api_db_host").unwrap();
        assert_eq!(host.source.link_path, vec!["api", "db"]);
        assert_eq!(host.source.model, "Database");
    }

    #[test]
    fn test_compose_rejects_self_link() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .define(ModelDefinition::new("Node").with_link(LinkDecl::new("next", "Node")))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::SchemaCycle {
                path: "Node -> Node".to_string()
            }
        );
        assert!(!registry.contains("Node"));
    }

    #[test]
    fn test_compose_rejects_transitive_cycle() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .define_all(vec![
                ModelDefinition::new("A").with_link(LinkDecl::new("b", "B")),
                ModelDefinition::new("B").with_link(LinkDecl::new("c", "C")),
                ModelDefinition::new("C").with_link(LinkDecl::new("a", "A")),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::SchemaCycle {
                path: "A -> B -> C -> A".to_string()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_compose_rejects_collision_with_own_field() {
        let mut registry = SchemaRegistry::new();
        registry.define(database()).unwrap();
        let err = registry
            .define(
                ModelDefinition::new("Service")
                    .with_field(FieldDescriptor::required("db_host", FieldType::Str))
                    .with_link(LinkDecl::new("db", "Database")),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::FieldCollision {
                field: "db_host".to_string(),
                first: "Service.db_host".to_string(),
                second: "Database.host (via link db)".to_string(),
            }
        );
    }

    #[test]
    fn test_compose_rejects_overlapping_link_prefixes() {
        let mut registry = SchemaRegistry::new();
        registry
            .define(ModelDefinition::new("T").with_field(FieldDescriptor::required(
                "b_c",
                FieldType::Int,
            )))
            .unwrap();
        registry
            .define(ModelDefinition::new("U").with_field(FieldDescriptor::required(
                "c",
                FieldType::Int,
            )))
            .unwrap();
        let err = registry
            .define(
                ModelDefinition::new("Host")
                    .with_link(LinkDecl::new("a", "T"))
                    .with_link(LinkDecl::new("a_b", "U")),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::FieldCollision { ref field, .. } if field == "a_b_c"));
    }

    #[test]
    fn test_compose_partial_link() {
        let mut registry = SchemaRegistry::new();
        registry
            .define(
                ModelDefinition::new("Foo")
                    .with_field(FieldDescriptor::required("a", FieldType::Int))
                    .with_field(FieldDescriptor::required("b", FieldType::Str)),
            )
            .unwrap();
        let schema = registry
            .define(
                ModelDefinition::new("PartialBar")
                    .with_field(FieldDescriptor::required("c", FieldType::Float))
                    .with_link(LinkDecl::partial("f", "Foo", &["a"])),
            )
            .unwrap();

        assert_eq!(schema.field_names(), vec!["c", "f_a"]);
        assert!(!schema.contains("f_b"));
        assert_eq!(schema.link("f").unwrap().schema.name(), "Foo");
    }

    #[test]
    fn test_compose_partial_link_unknown_field() {
        let mut registry = SchemaRegistry::new();
        registry.define(database()).unwrap();
        let err = registry
            .define(ModelDefinition::new("S").with_link(LinkDecl::partial("db", "Database", &["user"])))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownLinkField {
                model: "S".to_string(),
                link: "db".to_string(),
                field: "user".to_string(),
            }
        );
    }

    #[test]
    fn test_compose_unknown_target() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .define(ModelDefinition::new("S").with_link(LinkDecl::new("db", "Database")))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownModel {
                name: "Database".to_string(),
                referenced_by: "S.db".to_string(),
            }
        );
    }

    #[test]
    fn test_compose_coerces_defaults() {
        let mut registry = SchemaRegistry::new();
        let schema = registry
            .define(
                ModelDefinition::new("Database")
                    .with_field(FieldDescriptor::required("port", FieldType::Int).with_default(json!("5432")))
                    .with_field(
                        FieldDescriptor::required("tags", FieldType::List(Box::new(FieldType::Str)))
                            .with_default(json!(["a"])),
                    ),
            )
            .unwrap();
        assert_eq!(schema.field("port").unwrap().default, Some(Value::Int(5432)));
        assert_eq!(
            schema.field("tags").unwrap().default,
            Some(Value::List(vec![Value::Str("a".to_string())]))
        );
    }

    #[test]
    fn test_compose_rejects_invalid_default() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .define(
                ModelDefinition::new("Database")
                    .with_field(FieldDescriptor::required("port", FieldType::Int).with_default(json!("abc"))),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref field, .. } if field == "port"));
    }

    #[test]
    fn test_compose_is_cached() {
        let mut registry = SchemaRegistry::new();
        let first = registry.define(database()).unwrap();
        let second = registry.compose("Database").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
