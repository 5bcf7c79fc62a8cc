//! Shared instance reconciliation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{ModelInstance, Value};

/// Shares structurally equal instances across an instance graph.
///
/// Every link sub-instance and model-typed field value reachable from
/// `root` is grouped by definition identity and field-value equality. One
/// instance per group is kept and every other reference is pointed at it.
/// Field values never change, only which references are shared; instances
/// with any differing value stay independent.
///
/// The pass is bottom-up, so hosts whose sub-instances were merged compare
/// equal in turn. Nothing is remembered between calls.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use schema_link_core::*;
/// use serde_json::json;
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .define(ModelDefinition::new("T").with_field(FieldDescriptor::required("x", FieldType::Int)))
///     .unwrap();
/// let schema = registry
///     .define(
///         ModelDefinition::new("H")
///             .with_link(LinkDecl::new("a", "T"))
///             .with_link(LinkDecl::new("b", "T")),
///     )
///     .unwrap();
///
/// let document = json!({"a_x": 1, "b_x": 1});
/// let validated = validate(&schema, document.as_object().unwrap(), &ValidateOptions::default()).unwrap();
/// let instance = reconcile(reconstruct(&schema, validated));
/// assert!(Arc::ptr_eq(instance.link("a").unwrap(), instance.link("b").unwrap()));
/// ```
pub fn reconcile(root: ModelInstance) -> ModelInstance {
    let mut pool = Pool::default();
    let root = pool.rebuild(root);
    debug!(model = %root.model(), merged = pool.merged, "reconciled instance graph");
    root
}

/// Canonical instances seen so far, by model name.
#[derive(Default)]
struct Pool {
    canonical: HashMap<String, Vec<Arc<ModelInstance>>>,
    merged: usize,
}

impl Pool {
    fn rebuild(&mut self, instance: ModelInstance) -> ModelInstance {
        let (definition, fields, links) = instance.into_parts();
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name, self.value(value)))
            .collect();
        let links = links
            .into_iter()
            .map(|(name, instance)| (name, self.share(instance)))
            .collect();
        ModelInstance::from_parts(definition, fields, links)
    }

    fn value(&mut self, value: Value) -> Value {
        match value {
            Value::Model(instance) => Value::Model(self.share(instance)),
            Value::List(items) => Value::List(items.into_iter().map(|v| self.value(v)).collect()),
            other => other,
        }
    }

    fn share(&mut self, instance: Arc<ModelInstance>) -> Arc<ModelInstance> {
        let rebuilt = self.rebuild(Arc::unwrap_or_clone(instance));
        let candidates = self
            .canonical
            .entry(rebuilt.model().to_string())
            .or_default();

        let existing = candidates
            .iter()
            .find(|c| Arc::ptr_eq(c.definition(), rebuilt.definition()) && ***c == rebuilt);
        if let Some(existing) = existing {
            self.merged += 1;
            return Arc::clone(existing);
        }

        let shared = Arc::new(rebuilt);
        candidates.push(Arc::clone(&shared));
        shared
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        Document, FieldDescriptor, FieldType, LinkDecl, ModelDefinition, SchemaRegistry,
        ValidateOptions, reconstruct, validate,
    };

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .define_all(vec![
                ModelDefinition::new("T")
                    .with_field(FieldDescriptor::required("x", FieldType::Int))
                    .with_field(FieldDescriptor::optional("y", FieldType::Str)),
                ModelDefinition::new("H")
                    .with_link(LinkDecl::new("a", "T"))
                    .with_link(LinkDecl::new("b", "T")),
                ModelDefinition::new("Outer")
                    .with_link(LinkDecl::new("left", "H"))
                    .with_link(LinkDecl::new("right", "H")),
                ModelDefinition::new("Bar")
                    .with_field(FieldDescriptor::required("c", FieldType::Float))
                    .with_link(LinkDecl::new("t", "T")),
                ModelDefinition::new("App")
                    .with_field(FieldDescriptor::required("foo", FieldType::Model("T".to_string())))
                    .with_field(FieldDescriptor::required("bar", FieldType::Model("Bar".to_string()))),
            ])
            .unwrap();
        registry
    }

    fn build(registry: &SchemaRegistry, model: &str, value: serde_json::Value) -> ModelInstance {
        let schema = registry.composed(model).unwrap();
        let document: Document = value.as_object().cloned().unwrap();
        let options = ValidateOptions {
            inherit_links: false,
            ..ValidateOptions::default()
        };
        reconstruct(schema, validate(schema, &document, &options).unwrap())
    }

    #[test]
    fn test_reconcile_shares_equal_links() {
        let registry = registry();
        let instance = build(&registry, "H", json!({"a_x": 1, "a_y": "s", "b_x": 1, "b_y": "s"}));
        assert!(!Arc::ptr_eq(
            instance.link("a").unwrap(),
            instance.link("b").unwrap()
        ));

        let reconciled = reconcile(instance.clone());
        assert!(Arc::ptr_eq(
            reconciled.link("a").unwrap(),
            reconciled.link("b").unwrap()
        ));
        assert_eq!(reconciled, instance);
    }

    #[test]
    fn test_reconcile_keeps_differing_links() {
        let registry = registry();
        let instance = reconcile(build(&registry, "H", json!({"a_x": 1, "b_x": 2})));
        assert!(!Arc::ptr_eq(
            instance.link("a").unwrap(),
            instance.link("b").unwrap()
        ));
        assert_eq!(instance.link("a").unwrap().get("x"), Some(&Value::Int(1)));
        assert_eq!(instance.link("b").unwrap().get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_reconcile_null_differs_from_value() {
        let registry = registry();
        let instance = reconcile(build(&registry, "H", json!({"a_x": 1, "b_x": 1, "b_y": "s"})));
        assert!(!Arc::ptr_eq(
            instance.link("a").unwrap(),
            instance.link("b").unwrap()
        ));
    }

    #[test]
    fn test_reconcile_bottom_up() {
        let registry = registry();
        let instance = reconcile(build(
            &registry,
            "Outer",
            json!({
                "left_a_x": 1, "left_b_x": 2,
                "right_a_x": 1, "right_b_x": 2,
            }),
        ));

        let left = instance.link("left").unwrap();
        let right = instance.link("right").unwrap();
        assert!(Arc::ptr_eq(left, right));
        assert!(Arc::ptr_eq(
            left.link("a").unwrap(),
            right.link("a").unwrap()
        ));
    }

    #[test]
    fn test_reconcile_shares_model_field_with_link() {
        let registry = registry();
        let instance = reconcile(build(
            &registry,
            "App",
            json!({"foo": {"x": 5}, "bar": {"c": 1.0, "t_x": 5}}),
        ));

        let foo = instance.get("foo").and_then(Value::as_model).unwrap();
        let bar = instance.get("bar").and_then(Value::as_model).unwrap();
        assert!(Arc::ptr_eq(foo, bar.link("t").unwrap()));
    }
}
