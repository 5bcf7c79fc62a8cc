//! Error types for catalog loading.
//!
//! Provides a unified error type covering I/O, JSON and YAML parsing,
//! unsupported file kinds and schema composition failures.

use std::path::PathBuf;

use schema_link_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while loading catalogs or configuration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension is not `.json`, `.yaml` or `.yml`.
    #[error("unsupported catalog format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The loaded definitions do not compose.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// All configured loader sources failed.
    #[error("no catalog sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;
