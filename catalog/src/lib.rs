//! Catalog loading and configuration for linked model schemas.
//!
//! This crate loads [`ModelDefinition`](schema_link_core::ModelDefinition)s
//! from JSON or YAML files, composes them into a ready-to-use registry and
//! reads the YAML configuration that names catalogs and validation options.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_link_catalog::{LinkConfig, ModelCatalog, read_file};
//! use schema_link_core::{Document, validate_and_build};
//!
//! // Load a catalog bundle
//! let catalog = ModelCatalog::from_file("models.yaml").unwrap();
//!
//! // Use the builder for fallback chains
//! let catalog = ModelCatalog::builder()
//!     .from_dir("models/")
//!     .from_file("models.yaml")
//!     .build()
//!     .unwrap();
//!
//! // Validate a document with the configured options
//! let config = LinkConfig::load("schema-link.yml").unwrap();
//! let document: Document = read_file("service.json").unwrap();
//! let schema = catalog.get("Service").unwrap();
//! let instance = validate_and_build(schema, &document, &config.validation).unwrap();
//! ```

mod config;
mod error;
mod loader;

pub use config::LinkConfig;
pub use error::{CatalogError, Result};
pub use loader::{CatalogBuilder, CatalogSource, FileFormat, ModelCatalog, read_file};
