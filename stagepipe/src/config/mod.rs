//! Declarative pipeline configuration.
//!
//! A [`PipelineConfig`] names pipelines as ordered lists of stage references.
//! A reference is either a stage registered in a [`StageRegistry`] or the name
//! of another pipeline in the same configuration, which is then nested.
//!
//! ```json
//! {
//!   "logging": { "level": "info" },
//!   "pipelines": [
//!     { "name": "payment", "stages": ["apply_coupons", "apply_taxes", "process_payment"] },
//!     { "name": "order", "stages": ["create_order", "payment", "send_invoice"] }
//!   ]
//! }
//! ```

mod registry;

pub use registry::StageRegistry;

use crate::errors::{ConfigError, ConstructionError};
use crate::observability::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One named pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// The pipeline name.
    pub name: String,
    /// Stage or pipeline references, in execution order.
    #[serde(default)]
    pub stages: Vec<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PipelineDefinition {
    /// Creates a definition with the given stage references.
    #[must_use]
    pub fn new(name: impl Into<String>, stages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            stages: stages.into_iter().map(Into::into).collect(),
            description: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Pipeline definitions.
    #[serde(default)]
    pub pipelines: Vec<PipelineDefinition>,
}

impl PipelineConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pipeline definition.
    #[must_use]
    pub fn with_pipeline(mut self, definition: PipelineDefinition) -> Self {
        self.pipelines.push(definition);
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the definitions are
    /// invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn pipeline(&self, name: &str) -> Option<&PipelineDefinition> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Checks names without resolving references.
    ///
    /// # Errors
    ///
    /// Returns an error for blank names or duplicate pipeline names.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        let mut seen = HashSet::new();
        for definition in &self.pipelines {
            if definition.name.trim().is_empty() {
                return Err(ConstructionError::EmptyName);
            }
            if definition.stages.iter().any(|s| s.trim().is_empty()) {
                return Err(ConstructionError::EmptyName);
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(ConstructionError::duplicate(&definition.name));
            }
        }
        Ok(())
    }
}
