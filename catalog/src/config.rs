//! Link configuration files.
//!
//! Defines the YAML-serializable configuration naming which catalogs to load
//! and how documents are validated against them.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! catalogs:
//!   - models/
//!   - /etc/app/models.yaml
//! validation:
//!   unknown_fields: drop
//!   inherit_links: true
//!   reconcile: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use schema_link_core::ValidateOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::ModelCatalog;

fn default_version() -> String {
    "1.0".to_string()
}

/// Top-level link configuration.
///
/// Loaded from a YAML file (typically `schema-link.yml` next to the model
/// catalogs).
///
/// # Examples
///
/// ```no_run
/// use schema_link_catalog::LinkConfig;
///
/// let config = LinkConfig::load("schema-link.yml").unwrap();
/// let catalog = config.load_catalog("./").unwrap();
/// println!("{} models", catalog.len());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Configuration format version (e.g., `"1.0"`).
    #[serde(default = "default_version")]
    pub version: String,
    /// Catalog files or directories, tried in order until one loads.
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
    /// Validation options applied to every document.
    #[serde(default)]
    pub validation: ValidateOptions,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            catalogs: Vec::new(),
            validation: ValidateOptions::default(),
        }
    }
}

impl LinkConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::CatalogError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::CatalogError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::CatalogError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::CatalogError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Catalog paths with relative entries resolved against `base_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use schema_link_catalog::LinkConfig;
    ///
    /// let config: LinkConfig = serde_yaml::from_str("catalogs: [models, /abs/models.yaml]").unwrap();
    /// assert_eq!(
    ///     config.catalog_paths("/srv/app"),
    ///     vec![PathBuf::from("/srv/app/models"), PathBuf::from("/abs/models.yaml")]
    /// );
    /// ```
    pub fn catalog_paths(&self, base_dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let base_dir = base_dir.as_ref();
        self.catalogs
            .iter()
            .map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                }
            })
            .collect()
    }

    /// Loads the first catalog in [`catalogs`](Self::catalogs) that loads.
    ///
    /// # Errors
    ///
    /// Returns [`NoSourcesAvailable`](crate::CatalogError::NoSourcesAvailable)
    /// if no catalog is listed or none of them loads.
    pub fn load_catalog(&self, base_dir: impl AsRef<Path>) -> Result<ModelCatalog> {
        self.catalog_paths(base_dir)
            .into_iter()
            .fold(ModelCatalog::builder(), |builder, path| builder.from_path(path))
            .build()
    }
}
