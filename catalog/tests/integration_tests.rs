use std::path::Path;
use std::sync::Arc;

use schema_link_catalog::{CatalogError, LinkConfig, ModelCatalog, read_file};
use schema_link_core::{
    Document, FieldDescriptor, FieldType, LinkDecl, ModelDefinition, SchemaCatalog, SchemaError,
    UnknownFields, Value, validate_and_build,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_catalog() -> SchemaCatalog {
    SchemaCatalog::new("1.0.0")
        .with_model(
            ModelDefinition::new("Service")
                .with_field(FieldDescriptor::required("title", FieldType::Str))
                .with_link(LinkDecl::new("primary", "Database"))
                .with_link(LinkDecl::new("replica", "Database")),
        )
        .with_model(
            ModelDefinition::new("Database")
                .with_field(FieldDescriptor::required("host", FieldType::Str))
                .with_field(
                    FieldDescriptor::required("port", FieldType::Int)
                        .with_default(serde_json::json!(5432)),
                ),
        )
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    let f = std::fs::File::create(path).unwrap();
    serde_json::to_writer_pretty(f, value).unwrap();
}

// ---------------------------------------------------------------------------
// Catalog files
// ---------------------------------------------------------------------------

#[test]
fn test_json_catalog_validates_documents() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("models.json");
    write_json(&catalog_path, &sample_catalog());

    let document_path = dir.path().join("service.yaml");
    std::fs::write(
        &document_path,
        "title: api\nprimary_host: db\nreplica_host: db\n",
    )
    .unwrap();

    let catalog = ModelCatalog::from_file(&catalog_path).unwrap();
    let schema = catalog.get("Service").unwrap();
    let document: Document = read_file(&document_path).unwrap();
    let instance = validate_and_build(schema, &document, &Default::default()).unwrap();

    let primary = instance.link("primary").unwrap();
    assert_eq!(primary.get("port"), Some(&Value::Int(5432)));
    assert!(Arc::ptr_eq(primary, instance.link("replica").unwrap()));
}

#[test]
fn test_directory_with_cycle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("a.json"),
        &ModelDefinition::new("A").with_link(LinkDecl::new("b", "B")),
    );
    write_json(
        &dir.path().join("b.json"),
        &ModelDefinition::new("B").with_link(LinkDecl::new("a", "A")),
    );

    let err = ModelCatalog::from_dir(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Schema(SchemaError::SchemaCycle { .. })
    ));
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        ModelCatalog::from_file(&path),
        Err(CatalogError::JsonError(_))
    ));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_resolves_relative_catalogs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("models")).unwrap();
    write_json(&dir.path().join("models").join("catalog.json"), &sample_catalog());

    let config_path = dir.path().join("schema-link.yml");
    std::fs::write(
        &config_path,
        "version: \"1.0\"\ncatalogs:\n  - missing.yaml\n  - models/catalog.json\nvalidation:\n  unknown_fields: drop\n",
    )
    .unwrap();

    let config = LinkConfig::load(&config_path).unwrap();
    assert_eq!(config.validation.unknown_fields, UnknownFields::Drop);

    let catalog = config.load_catalog(dir.path()).unwrap();
    assert_eq!(catalog.models().collect::<Vec<_>>(), vec!["Service", "Database"]);
}
