//! Linked model schemas: composition, flat validation and instance
//! reconciliation.
//!
//! A [`ModelDefinition`] declares its own fields plus named links to other
//! models. Composition merges every linked model's fields into the host
//! under `{link}_{field}` names, so one flat document can configure the host
//! and everything it links to:
//!
//! - [`SchemaRegistry`]: registers definitions and caches each
//!   [`ComposedSchema`], rejecting cycles and field-name collisions.
//! - [`validate`]: checks a flat [`Document`] against a composed schema,
//!   collecting every field error into one [`ValidationFailure`].
//! - [`reconstruct`]: splits validated data into one [`ModelInstance`] per
//!   link.
//! - [`reconcile`]: shares structurally equal instances across the graph.
//!
//! [`validate_and_build`] runs the three validation-time stages in order.
//! Catalogs ([`SchemaCatalog`]) bundle definitions for shipping and are
//! checked with [`check_catalog`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
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
//!     .define(
//!         ModelDefinition::new("Service")
//!             .with_field(FieldDescriptor::required("title", FieldType::Str))
//!             .with_link(LinkDecl::new("primary", "Database"))
//!             .with_link(LinkDecl::new("replica", "Database")),
//!     )
//!     .unwrap();
//! assert_eq!(
//!     schema.field_names(),
//!     vec!["title", "primary_host", "primary_port", "replica_host", "replica_port"]
//! );
//!
//! let document = json!({
//!     "title": "x",
//!     "primary_host": "h", "primary_port": "5432",
//!     "replica_host": "h", "replica_port": 5432,
//! });
//! let instance = validate_and_build(
//!     &schema,
//!     document.as_object().unwrap(),
//!     &ValidateOptions::default(),
//! )
//! .unwrap();
//!
//! let primary = instance.link("primary").unwrap();
//! assert_eq!(primary.get("port"), Some(&Value::Int(5432)));
//! assert!(Arc::ptr_eq(primary, instance.link("replica").unwrap()));
//! ```

mod catalog;
mod check;
mod compose;
mod error;
mod pipeline;
mod reconcile;
mod reconstruct;
mod registry;
mod types;
mod validate;
mod value;

pub use catalog::SchemaCatalog;
pub use check::{check_catalog, check_definition};
pub use compose::{ComposedField, ComposedLink, ComposedSchema, FieldSource};
pub use error::{BuildError, SchemaError};
pub use pipeline::validate_and_build;
pub use reconcile::reconcile;
pub use reconstruct::{ModelInstance, reconstruct};
pub use registry::SchemaRegistry;
pub use types::*;
pub use validate::{
    Document, FieldError, UnknownFields, ValidateOptions, ValidatedInstance, ValidationFailure,
    validate,
};
pub use value::{FieldErrorKind, Value};
