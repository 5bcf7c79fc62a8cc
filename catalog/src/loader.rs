//! Catalog loading with builder pattern and fallback chains.
//!
//! Provides [`ModelCatalog`], a composed [`SchemaRegistry`] loaded from disk,
//! and [`CatalogBuilder`] for trying several sources in order.
//!
//! # Loading patterns
//!
//! ```no_run
//! use schema_link_catalog::ModelCatalog;
//!
//! // Load a SchemaCatalog bundle (JSON or YAML)
//! let catalog = ModelCatalog::from_file("models.yaml").unwrap();
//! assert!(catalog.get("Service").is_some());
//!
//! // Load a directory holding one ModelDefinition per file
//! let catalog = ModelCatalog::from_dir("models/").unwrap();
//!
//! // Use the builder for a fallback chain
//! let catalog = ModelCatalog::builder()
//!     .from_dir("models/")
//!     .from_file("models.json")
//!     .build()
//!     .unwrap();
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use schema_link_core::{ComposedSchema, ModelDefinition, SchemaCatalog, SchemaRegistry};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Describes where a [`ModelCatalog`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Loaded from a single [`SchemaCatalog`] file.
    File(PathBuf),
    /// Loaded from a directory of individual model definition files.
    Directory(PathBuf),
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<CatalogSource>),
}

/// Serialization format of a catalog or document file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl FileFormat {
    /// Detects the format from a path's extension, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_link_catalog::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_path("a/models.YML"), Some(FileFormat::Yaml));
    /// assert_eq!(FileFormat::from_path("doc.json"), Some(FileFormat::Json));
    /// assert_eq!(FileFormat::from_path("notes.txt"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Reads a JSON or YAML file, picking the parser from the extension.
///
/// # Errors
///
/// Returns [`CatalogError::UnsupportedFormat`] for other extensions,
/// [`CatalogError::IoError`] if the file cannot be opened, and
/// [`CatalogError::JsonError`] or [`CatalogError::YamlError`] if parsing
/// fails.
pub fn read_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let format =
        FileFormat::from_path(path).ok_or_else(|| CatalogError::UnsupportedFormat(path.to_path_buf()))?;
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let value = match format {
        FileFormat::Json => serde_json::from_reader(reader)?,
        FileFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    Ok(value)
}

/// A composed model registry loaded from disk.
///
/// Every model has been composed while loading, so lookups never fail for
/// schema reasons and the catalog can be shared across threads.
///
/// # Examples
///
/// ```no_run
/// use schema_link_catalog::ModelCatalog;
///
/// let catalog = ModelCatalog::from_file("models.yaml").unwrap();
/// println!("Loaded {} models", catalog.len());
///
/// for name in catalog.models() {
///     let schema = catalog.get(name).unwrap();
///     println!("  {name}: {} fields", schema.len());
/// }
/// ```
#[derive(Debug)]
pub struct ModelCatalog {
    registry: SchemaRegistry,
    source: CatalogSource,
}

impl ModelCatalog {
    /// Returns a new [`CatalogBuilder`] for configuring a fallback chain.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Loads a [`SchemaCatalog`] from a `.json`, `.yaml` or `.yml` file and
    /// composes every model in it.
    ///
    /// # Errors
    ///
    /// Returns the read errors of [`read_file`], or
    /// [`CatalogError::Schema`] if the catalog fails its checks or does not
    /// compose.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let catalog: SchemaCatalog = read_file(path)?;
        let registry = SchemaRegistry::from_catalog(&catalog)?;
        debug!(path = %path.display(), models = registry.len(), "loaded catalog file");

        Ok(Self {
            registry,
            source: CatalogSource::File(path.to_path_buf()),
        })
    }

    /// Loads every `.json`, `.yaml` and `.yml` file in a directory as one
    /// [`ModelDefinition`], then composes them together.
    ///
    /// Files are read in name order; other files are skipped. Definitions
    /// may reference each other regardless of file order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::IoError`] if the directory or a file cannot be
    /// read, a parse error for an invalid file, or [`CatalogError::Schema`]
    /// if the definitions do not compose.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && FileFormat::from_path(&file_path).is_some() {
                files.push(file_path);
            }
        }
        files.sort();

        let mut definitions = Vec::with_capacity(files.len());
        for file in &files {
            let definition: ModelDefinition = read_file(file)?;
            definitions.push(definition);
        }

        let mut registry = SchemaRegistry::new();
        registry.define_all(definitions)?;
        debug!(path = %path.display(), models = registry.len(), "loaded catalog directory");

        Ok(Self {
            registry,
            source: CatalogSource::Directory(path.to_path_buf()),
        })
    }

    /// Looks up a composed schema by model name.
    pub fn get(&self, model: &str) -> Option<&Arc<ComposedSchema>> {
        self.registry.composed(model)
    }

    /// Returns `true` if the catalog defines `model`.
    pub fn contains(&self, model: &str) -> bool {
        self.registry.contains(model)
    }

    /// Returns the number of models in the catalog.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if the catalog holds no models.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Returns an iterator over model names in load order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.registry.models()
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Consumes the catalog, returning the registry.
    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }
}

/// Builder for constructing a [`ModelCatalog`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`CatalogError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use schema_link_catalog::ModelCatalog;
///
/// let catalog = ModelCatalog::builder()
///     .from_file("/etc/app/models.yaml")
///     .from_dir("./models/")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    sources: Vec<CatalogSource>,
}

impl CatalogBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a [`SchemaCatalog`] file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogSource::File(path.into()));
        self
    }

    /// Adds a directory of model definition files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogSource::Directory(path.into()));
        self
    }

    /// Adds a path as a source, as a directory if it is one and as a
    /// catalog file otherwise.
    pub fn from_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            self.from_dir(path)
        } else {
            self.from_file(path)
        }
    }

    /// Attempts to load a catalog from the configured sources in order.
    ///
    /// Returns the first successfully loaded catalog. If all sources fail,
    /// returns [`CatalogError::NoSourcesAvailable`].
    pub fn build(self) -> Result<ModelCatalog> {
        if self.sources.is_empty() {
            return Err(CatalogError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                CatalogSource::File(path) => ModelCatalog::from_file(path),
                CatalogSource::Directory(path) => ModelCatalog::from_dir(path),
                CatalogSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut catalog) => {
                    catalog.source = CatalogSource::Multiple(all_sources);
                    return Ok(catalog);
                }
                Err(err) => debug!(source = ?source, error = %err, "catalog source failed"),
            }
        }

        Err(CatalogError::NoSourcesAvailable)
    }
}
