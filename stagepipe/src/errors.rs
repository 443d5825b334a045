//! Error types for stagepipe.
//!
//! The engine never wraps stage failures: whatever error type a pipeline is
//! parameterised with reaches the caller unchanged. [`StageError`] is the
//! default error type for pipelines that don't bring their own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The default failure type raised by stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// A named stage refused or failed to process the payload.
    #[error("Stage '{stage}' failed: {message}")]
    Failed {
        /// The stage that aborted the chain.
        stage: String,
        /// Human readable reason.
        message: String,
        /// Whether retrying the stage may succeed.
        retryable: bool,
    },

    /// Any other error raised from inside a stage.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Creates a permanent failure for `stage`.
    #[must_use]
    pub fn failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a transient failure for `stage`.
    #[must_use]
    pub fn retryable(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns the name of the stage that failed, when known.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Failed { stage, .. } => Some(stage),
            Self::Other(_) => None,
        }
    }

    /// Returns true if the failure is marked as transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { retryable: true, .. })
    }
}

/// Metadata about a construction error for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONTRACT-004-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised while assembling pipelines from names.
///
/// Reported at construction time so a malformed pipeline never runs.
#[derive(Debug, Clone, Error)]
pub enum ConstructionError {
    /// A pipeline references a stage that is neither registered nor defined.
    #[error("Pipeline '{pipeline}' references unknown stage '{stage}'")]
    UnknownStage {
        /// The pipeline holding the reference.
        pipeline: String,
        /// The unresolved reference.
        stage: String,
    },

    /// The requested pipeline is not defined.
    #[error("Unknown pipeline '{name}'")]
    UnknownPipeline {
        /// The requested name.
        name: String,
    },

    /// A stage or pipeline name was registered twice.
    #[error("Duplicate definition for '{name}'")]
    Duplicate {
        /// The conflicting name.
        name: String,
    },

    /// A stage or pipeline was given an empty name.
    #[error("Stage and pipeline names cannot be empty or whitespace-only")]
    EmptyName,

    /// A pipeline includes itself, directly or through other pipelines.
    #[error("Pipeline includes itself: {}", path.join(" -> "))]
    Cycle {
        /// The chain of pipeline references forming the cycle.
        path: Vec<String>,
    },
}

impl ConstructionError {
    /// Creates an unknown stage error.
    #[must_use]
    pub fn unknown_stage(pipeline: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::UnknownStage {
            pipeline: pipeline.into(),
            stage: stage.into(),
        }
    }

    /// Creates a duplicate definition error.
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::Duplicate { name: name.into() }
    }

    /// Returns structured diagnostics for this error.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        match self {
            Self::UnknownStage { pipeline, stage } => {
                ContractErrorInfo::new("CONTRACT-004-MISSING_DEP", format!("Stage '{stage}' not found"))
                    .with_fix_hint(
                        "Register the stage before building, or define a pipeline with that name.",
                    )
                    .with_context_entry("pipeline", pipeline)
                    .with_context_entry("stage", stage)
            }
            Self::UnknownPipeline { name } => {
                ContractErrorInfo::new("CONTRACT-004-MISSING_PIPELINE", format!("Pipeline '{name}' not found"))
                    .with_fix_hint("Check the pipeline name against the configuration.")
                    .with_context_entry("pipeline", name)
            }
            Self::Duplicate { name } => {
                ContractErrorInfo::new("CONTRACT-004-CONFLICT", format!("'{name}' is defined twice"))
                    .with_fix_hint("Rename one of the definitions.")
                    .with_context_entry("name", name)
            }
            Self::EmptyName => ContractErrorInfo::new("CONTRACT-004-EMPTY", "Empty name")
                .with_fix_hint("Give every stage and pipeline a non-blank name."),
            Self::Cycle { path } => ContractErrorInfo::new(
                "CONTRACT-004-CYCLE",
                format!("Pipeline nesting forms a cycle: {}", path.join(" -> ")),
            )
            .with_fix_hint("Remove one of the nested pipeline references in the cycle."),
        }
    }
}

/// Errors raised while loading or applying a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration describes an invalid pipeline.
    #[error("{0}")]
    Construction(#[from] ConstructionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_identifies_stage() {
        let err = StageError::failed("payment", "card declined");

        assert_eq!(err.stage(), Some("payment"));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Stage 'payment' failed: card declined");
    }

    #[test]
    fn test_stage_error_retryable() {
        let err = StageError::retryable("gateway", "timeout");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_stage_error_from_anyhow() {
        let err: StageError = anyhow::anyhow!("disk full").into();

        assert_eq!(err.stage(), None);
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_cycle_error_info() {
        let err = ConstructionError::Cycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };

        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(err.error_info().code, "CONTRACT-004-CYCLE");
    }

    #[test]
    fn test_unknown_stage_error_info() {
        let info = ConstructionError::unknown_stage("order", "taxes").error_info();

        assert_eq!(info.code, "CONTRACT-004-MISSING_DEP");
        assert_eq!(info.context.get("stage"), Some(&"taxes".to_string()));
        assert!(info.fix_hint.is_some());
    }

    #[test]
    fn test_config_error_wraps_construction() {
        let err: ConfigError = ConstructionError::EmptyName.into();
        assert!(matches!(err, ConfigError::Construction(ConstructionError::EmptyName)));
    }
}
