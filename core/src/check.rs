//! Definition and catalog checks.
//!
//! Validates structural invariants of model definitions and catalogs,
//! catching errors such as empty names and duplicate fields or links before
//! composition runs. Cross-model problems (unknown targets, cycles,
//! collisions) are found by the composer.
//!
//! # Examples
//!
//! ```
//! use schema_link_core::*;
//!
//! let ok = ModelDefinition::new("Database")
//!     .with_field(FieldDescriptor::required("host", FieldType::Str));
//! assert!(check_definition(&ok).is_empty());
//!
//! // Invalid: the same link name twice
//! let bad = ModelDefinition::new("Service")
//!     .with_link(LinkDecl::new("db", "Database"))
//!     .with_link(LinkDecl::new("db", "Cache"));
//! assert!(!check_definition(&bad).is_empty());
//! ```

use std::collections::HashSet;

use crate::{ModelDefinition, SchemaCatalog, SchemaError};

/// Checks a full catalog.
///
/// Checks for an empty version string, duplicate model names, and checks
/// each definition individually.
///
/// # Examples
///
/// ```
/// use schema_link_core::*;
///
/// let mut catalog = SchemaCatalog::new("1.0.0");
/// catalog.models.push(ModelDefinition::new("Database"));
/// assert!(check_catalog(&catalog).is_empty());
///
/// // Duplicate model → error
/// catalog.models.push(ModelDefinition::new("Database"));
/// let errors = check_catalog(&catalog);
/// assert!(errors.iter().any(|e| matches!(e, SchemaError::DuplicateModel(_))));
/// ```
pub fn check_catalog(catalog: &SchemaCatalog) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if catalog.version.trim().is_empty() {
        errors.push(SchemaError::EmptyCatalogVersion);
        return errors;
    }

    let mut seen_models: HashSet<&str> = HashSet::new();
    for model in &catalog.models {
        let name = model.name.as_str();
        if !seen_models.insert(name) {
            errors.push(SchemaError::DuplicateModel(name.to_string()));
            return errors;
        }
        errors.extend(check_definition(model));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Checks a single model definition.
///
/// Checks for an empty model name, empty or duplicate field names, empty or
/// duplicate link names, links named like an own field, and partial links
/// that select nothing. Names are compared exactly as declared.
pub fn check_definition(definition: &ModelDefinition) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    let model = definition.name.as_str();
    if model.trim().is_empty() {
        errors.push(SchemaError::EmptyModelName);
        return errors;
    }

    let mut seen_fields: HashSet<&str> = HashSet::new();
    for field in &definition.fields {
        let name = field.name.as_str();
        if name.trim().is_empty() {
            errors.push(SchemaError::EmptyFieldName {
                model: model.to_string(),
            });
            return errors;
        }
        if !seen_fields.insert(name) {
            errors.push(SchemaError::DuplicateField {
                model: model.to_string(),
                field: name.to_string(),
            });
            return errors;
        }
    }

    let mut seen_links: HashSet<&str> = HashSet::new();
    for link in &definition.links {
        let name = link.name.as_str();
        if name.trim().is_empty() {
            errors.push(SchemaError::EmptyLinkName {
                model: model.to_string(),
            });
            return errors;
        }
        if !seen_links.insert(name) {
            errors.push(SchemaError::DuplicateLink {
                model: model.to_string(),
                link: name.to_string(),
            });
            return errors;
        }
        // The built instance keys own fields and links in one namespace.
        if seen_fields.contains(name) {
            errors.push(SchemaError::LinkShadowsField {
                model: model.to_string(),
                link: name.to_string(),
            });
            return errors;
        }
        if link.only.as_ref().is_some_and(|only| only.is_empty()) {
            errors.push(SchemaError::EmptyLinkSelection {
                model: model.to_string(),
                link: name.to_string(),
            });
            return errors;
        }
    }

    errors
}
