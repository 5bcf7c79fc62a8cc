//! Instance reconstruction.
//!
//! Splits a flat [`ValidatedInstance`] back into one [`ModelInstance`] per
//! link target plus the host instance. Every composed field records the link
//! path it was merged through, so partitioning is exact: composition has
//! already rejected any prefix overlap as a field collision.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{ComposedSchema, ModelDefinition, ValidatedInstance, Value};

/// A constructed value of one model.
///
/// Holds the model's own field values plus one sub-instance per link. Link
/// sub-instances are reference counted: after
/// [`reconcile`](crate::reconcile) several hosts may point at the same one.
///
/// Equality is structural over the model name, field values and links.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    definition: Arc<ModelDefinition>,
    fields: Vec<(String, Value)>,
    links: Vec<(String, Arc<ModelInstance>)>,
}

impl ModelInstance {
    pub(crate) fn from_parts(
        definition: Arc<ModelDefinition>,
        fields: Vec<(String, Value)>,
        links: Vec<(String, Arc<ModelInstance>)>,
    ) -> Self {
        Self {
            definition,
            fields,
            links,
        }
    }

    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        Arc<ModelDefinition>,
        Vec<(String, Value)>,
        Vec<(String, Arc<ModelInstance>)>,
    ) {
        (self.definition, self.fields, self.links)
    }

    /// Name of the instance's model.
    pub fn model(&self) -> &str {
        &self.definition.name
    }

    /// Definition of the instance's model.
    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    /// Looks up an own field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Looks up a link sub-instance.
    pub fn link(&self, name: &str) -> Option<&Arc<ModelInstance>> {
        self.links.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    /// Own field values in declaration order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Link sub-instances in declaration order.
    pub fn links(&self) -> &[(String, Arc<ModelInstance>)] {
        &self.links
    }

    /// Flattens the instance back to final field names.
    ///
    /// Own fields come first, then each link's flattened fields with the
    /// link prefix, matching the composed schema order. Model-typed own
    /// fields stay nested.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_link_core::*;
    /// use serde_json::json;
    ///
    /// let mut registry = SchemaRegistry::new();
    /// registry
    ///     .define(ModelDefinition::new("T").with_field(FieldDescriptor::required("x", FieldType::Int)))
    ///     .unwrap();
    /// let schema = registry
    ///     .define(ModelDefinition::new("H").with_link(LinkDecl::new("a", "T")))
    ///     .unwrap();
    ///
    /// let document = json!({"a_x": 1});
    /// let validated = validate(&schema, document.as_object().unwrap(), &ValidateOptions::default()).unwrap();
    /// let instance = reconstruct(&schema, validated.clone());
    /// assert_eq!(instance.flatten(), validated.into_values());
    /// ```
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut flat = self.fields.clone();
        for (link, instance) in &self.links {
            flat.extend(
                instance
                    .flatten()
                    .into_iter()
                    .map(|(name, value)| (format!("{link}_{name}"), value)),
            );
        }
        flat
    }
}

impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        self.definition.name == other.definition.name
            && self.fields == other.fields
            && self.links == other.links
    }
}

impl Serialize for ModelInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.links.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for (name, instance) in &self.links {
            map.serialize_entry(name, &**instance)?;
        }
        map.end()
    }
}

/// Builds the instance graph for a validated flat mapping.
///
/// The result holds exactly the validated values, regrouped: own fields on
/// the host, link fields on one sub-instance per link with the prefix
/// stripped, recursively.
pub fn reconstruct(schema: &ComposedSchema, validated: ValidatedInstance) -> ModelInstance {
    let mut values: HashMap<String, Value> = validated.into_values().into_iter().collect();
    build(schema, &mut values, "")
}

fn build(schema: &ComposedSchema, values: &mut HashMap<String, Value>, prefix: &str) -> ModelInstance {
    let fields = schema
        .own_fields()
        .map(|field| {
            let value = values
                .remove(&format!("{prefix}{}", field.name))
                .unwrap_or(Value::Null);
            (field.name.clone(), value)
        })
        .collect();

    let links = schema
        .links()
        .iter()
        .map(|link| {
            let sub_prefix = format!("{prefix}{}_", link.name);
            let instance = build(&link.schema, values, &sub_prefix);
            (link.name.clone(), Arc::new(instance))
        })
        .collect();

    ModelInstance::from_parts(Arc::clone(schema.definition()), fields, links)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        Document, FieldDescriptor, FieldType, LinkDecl, SchemaRegistry, ValidateOptions, validate,
    };

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .define_all(vec![
                ModelDefinition::new("Database")
                    .with_field(FieldDescriptor::required("host", FieldType::Str))
                    .with_field(FieldDescriptor::required("port", FieldType::Int)),
                ModelDefinition::new("Backend")
                    .with_field(FieldDescriptor::required("name", FieldType::Str))
                    .with_link(LinkDecl::new("db", "Database")),
                ModelDefinition::new("App")
                    .with_field(FieldDescriptor::required("title", FieldType::Str))
                    .with_link(LinkDecl::new("api", "Backend"))
                    .with_link(LinkDecl::new("db", "Database")),
            ])
            .unwrap();
        registry
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reconstruct_single_link() {
        let registry = registry();
        let schema = registry.composed("Backend").unwrap();
        let validated = validate(
            schema,
            &doc(json!({"name": "x", "db_host": "h", "db_port": 1})),
            &ValidateOptions::default(),
        )
        .unwrap();

        let instance = reconstruct(schema, validated);
        assert_eq!(instance.model(), "Backend");
        assert_eq!(instance.fields().len(), 1);
        let db = instance.link("db").unwrap();
        assert_eq!(db.model(), "Database");
        assert_eq!(db.get("host"), Some(&Value::Str("h".to_string())));
        assert_eq!(db.get("port"), Some(&Value::Int(1)));
        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({"name": "x", "db": {"host": "h", "port": 1}})
        );
    }

    #[test]
    fn test_reconstruct_nested_links() {
        let registry = registry();
        let schema = registry.composed("App").unwrap();
        let document = doc(json!({
            "title": "t",
            "api_name": "backend",
            "api_db_host": "inner",
            "api_db_port": 2,
            "db_host": "outer",
            "db_port": 3,
        }));
        let validated = validate(schema, &document, &ValidateOptions::default()).unwrap();
        let instance = reconstruct(schema, validated.clone());

        let inner = instance.link("api").unwrap().link("db").unwrap();
        assert_eq!(inner.get("host"), Some(&Value::Str("inner".to_string())));
        let outer = instance.link("db").unwrap();
        assert_eq!(outer.get("port"), Some(&Value::Int(3)));

        assert_eq!(instance.flatten(), validated.into_values());
    }

    #[test]
    fn test_reconstruct_matches_standalone_validation() {
        let registry = registry();
        let host = registry.composed("Backend").unwrap();
        let target = registry.composed("Database").unwrap();

        let composed = reconstruct(
            host,
            validate(
                host,
                &doc(json!({"name": "x", "db_host": "h", "db_port": "7"})),
                &ValidateOptions::default(),
            )
            .unwrap(),
        );
        let standalone = reconstruct(
            target,
            validate(
                target,
                &doc(json!({"host": "h", "port": "7"})),
                &ValidateOptions::default(),
            )
            .unwrap(),
        );

        assert_eq!(**composed.link("db").unwrap(), standalone);
    }
}
