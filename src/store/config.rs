//! Store configuration
//!
//! `StoreOptions` is what a `DocumentStore` is opened with. `StoreConfig` is
//! the serializable file form; every field has a default, so an empty JSON
//! object is a valid configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::CacheConfig;
use crate::document::Document;
use crate::observability::Event;
use crate::schema::{DefaultsFn, DocumentSchema, SchemaRegistry};

use super::errors::{StoreError, StoreResult};

pub const DEFAULT_DOC_TYPE: &str = "memo";
pub const DEFAULT_STORAGE_PATH: &str = "memo";

/// Settings a store is opened with.
///
/// `schema` and `defaults` are optional here so that a misconfigured store
/// is reported at open time rather than at first use.
#[derive(Clone)]
pub struct StoreOptions {
    pub doc_type: String,
    pub autoid: bool,
    pub storage_path: PathBuf,
    pub schema: Option<DocumentSchema>,
    pub defaults: Option<DefaultsFn>,
}

impl StoreOptions {
    /// Options for a type without schema or defaults
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            autoid: false,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            schema: None,
            defaults: None,
        }
    }

    /// Options for a registered type
    pub fn from_registry(registry: &SchemaRegistry, doc_type: &str) -> StoreResult<Self> {
        let definition = registry.require(doc_type)?;
        Ok(Self {
            schema: Some(definition.schema.clone()),
            defaults: Some(definition.defaults.clone()),
            ..Self::new(doc_type)
        })
    }

    pub fn with_autoid(mut self, autoid: bool) -> Self {
        self.autoid = autoid;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_defaults<F>(mut self, defaults: F) -> Self
    where
        F: Fn() -> Document + Send + Sync + 'static,
    {
        self.defaults = Some(Arc::new(defaults));
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        let registry = SchemaRegistry::builtin();
        match registry.get(DEFAULT_DOC_TYPE) {
            Some(definition) => Self {
                schema: Some(definition.schema.clone()),
                defaults: Some(definition.defaults.clone()),
                ..Self::new(DEFAULT_DOC_TYPE)
            },
            None => Self::new(DEFAULT_DOC_TYPE),
        }
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("doc_type", &self.doc_type)
            .field("autoid", &self.autoid)
            .field("storage_path", &self.storage_path)
            .field("schema", &self.schema)
            .field("defaults", &self.defaults.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub doc_type: String,
    pub autoid: bool,
    pub storage_path: PathBuf,
    pub cache_max_size: usize,
    pub cache_alert_ratio: f64,
    /// Directory of additional type definition files
    pub schema_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            autoid: false,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            cache_max_size: cache.max_size,
            cache_alert_ratio: cache.alert_ratio,
            schema_dir: None,
        }
    }
}

impl StoreConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let config: StoreConfig = serde_json::from_str(&content).map_err(|e| {
            StoreError::config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;

        info!(
            event = %Event::ConfigLoaded,
            path = %path.display(),
            doc_type = %config.doc_type,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.doc_type.is_empty() {
            return Err(StoreError::config("doc_type must not be empty"));
        }
        if self.storage_path.as_os_str().is_empty() {
            return Err(StoreError::config("storage_path must not be empty"));
        }
        self.cache_config().validate().map_err(StoreError::config)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.cache_max_size,
            alert_ratio: self.cache_alert_ratio,
        }
    }

    /// Resolve the configured type against `registry`
    pub fn into_options(self, registry: &SchemaRegistry) -> StoreResult<StoreOptions> {
        Ok(StoreOptions::from_registry(registry, &self.doc_type)?
            .with_autoid(self.autoid)
            .with_storage_path(self.storage_path))
    }
}
