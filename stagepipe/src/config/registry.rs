//! Named stage registry and configuration-driven pipeline assembly.

use super::{PipelineConfig, PipelineDefinition};
use crate::errors::{ConstructionError, StageError};
use crate::events::{EventSink, NoOpEventSink};
use crate::pipeline::Pipeline;
use crate::stages::Stage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Stages addressable by name, used to assemble pipelines from a
/// [`PipelineConfig`].
pub struct StageRegistry<P, E = StageError> {
    stages: HashMap<String, Arc<dyn Stage<P, E>>>,
    sink: Arc<dyn EventSink>,
}

impl<P, E> StageRegistry<P, E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink attached to every pipeline built from this registry.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers a shared stage under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already taken.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        stage: Arc<dyn Stage<P, E>>,
    ) -> Result<(), ConstructionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConstructionError::EmptyName);
        }
        if self.stages.contains_key(&name) {
            return Err(ConstructionError::duplicate(name));
        }
        self.stages.insert(name, stage);
        Ok(())
    }

    /// Returns true if a stage is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<P: 'static, E: 'static> StageRegistry<P, E> {
    /// Registers a stage under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        stage: impl Stage<P, E> + 'static,
    ) -> Result<(), ConstructionError> {
        self.register_shared(name, Arc::new(stage))
    }

    /// Builds the pipeline named `entry`, nesting referenced pipelines.
    ///
    /// Every reference is resolved before anything runs.
    ///
    /// # Errors
    ///
    /// Returns an error if `entry` is not defined, a reference cannot be
    /// resolved, a pipeline name shadows a registered stage, or pipelines
    /// include themselves.
    pub fn build(&self, config: &PipelineConfig, entry: &str) -> Result<Pipeline<P, E>, ConstructionError> {
        let mut assembly = Assembly::new(self, config)?;
        assembly.resolve(entry)
    }

    /// Builds every pipeline in `config`, keyed by name.
    ///
    /// # Errors
    ///
    /// Returns the first construction error encountered.
    pub fn build_all(
        &self,
        config: &PipelineConfig,
    ) -> Result<HashMap<String, Pipeline<P, E>>, ConstructionError> {
        let mut assembly = Assembly::new(self, config)?;
        for definition in &config.pipelines {
            assembly.resolve(&definition.name)?;
        }
        Ok(assembly.built)
    }
}

impl<P, E> Default for StageRegistry<P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E> std::fmt::Debug for StageRegistry<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.names())
            .finish_non_exhaustive()
    }
}

/// Resolution state for one `build` call.
struct Assembly<'r, P, E> {
    registry: &'r StageRegistry<P, E>,
    definitions: HashMap<&'r str, &'r PipelineDefinition>,
    built: HashMap<String, Pipeline<P, E>>,
    path: Vec<String>,
}

impl<'r, P: 'static, E: 'static> Assembly<'r, P, E> {
    fn new(registry: &'r StageRegistry<P, E>, config: &'r PipelineConfig) -> Result<Self, ConstructionError> {
        config.validate()?;
        let mut definitions = HashMap::new();
        for definition in &config.pipelines {
            if registry.contains(&definition.name) {
                return Err(ConstructionError::duplicate(&definition.name));
            }
            definitions.insert(definition.name.as_str(), definition);
        }
        Ok(Self {
            registry,
            definitions,
            built: HashMap::new(),
            path: Vec::new(),
        })
    }

    fn resolve(&mut self, name: &str) -> Result<Pipeline<P, E>, ConstructionError> {
        if let Some(pipeline) = self.built.get(name) {
            return Ok(pipeline.clone());
        }
        if let Some(start) = self.path.iter().position(|n| n == name) {
            let mut cycle = self.path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ConstructionError::Cycle { path: cycle });
        }
        let definition = *self
            .definitions
            .get(name)
            .ok_or_else(|| ConstructionError::UnknownPipeline {
                name: name.to_string(),
            })?;

        self.path.push(name.to_string());
        let mut pipeline = Pipeline::<P, E>::named(name).with_event_sink(Arc::clone(&self.registry.sink));
        for reference in &definition.stages {
            pipeline = if self.definitions.contains_key(reference.as_str()) {
                pipeline.pipe(self.resolve(reference)?)
            } else if let Some(stage) = self.registry.stages.get(reference) {
                pipeline.pipe_shared(Arc::clone(stage))
            } else {
                return Err(ConstructionError::unknown_stage(name, reference));
            };
        }
        self.path.pop();

        debug!(pipeline = name, stages = pipeline.len(), "Assembled pipeline");
        self.built.insert(name.to_string(), pipeline.clone());
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineDefinition;
    use crate::events::CollectingEventSink;
    use crate::stages::MapStage;
    use pretty_assertions::assert_eq;

    fn tag(name: &'static str) -> impl Stage<Vec<String>> {
        MapStage::new(name, move |mut tags: Vec<String>| {
            tags.push(name.to_string());
            Ok::<_, StageError>(tags)
        })
    }

    fn registry() -> StageRegistry<Vec<String>> {
        let mut registry = StageRegistry::new();
        for name in ["create_order", "apply_coupons", "apply_taxes", "send_invoice"] {
            registry.register(name, tag(name)).unwrap();
        }
        registry
    }

    fn order_config() -> PipelineConfig {
        PipelineConfig::new()
            .with_pipeline(PipelineDefinition::new("payment", ["apply_coupons", "apply_taxes"]))
            .with_pipeline(PipelineDefinition::new(
                "order",
                ["create_order", "payment", "send_invoice"],
            ))
    }

    #[test]
    fn test_register_rejects_duplicates_and_blanks() {
        let mut registry = registry();

        assert!(matches!(
            registry.register("apply_taxes", tag("again")),
            Err(ConstructionError::Duplicate { .. })
        ));
        assert!(matches!(
            registry.register("  ", tag("blank")),
            Err(ConstructionError::EmptyName)
        ));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.names()[0], "apply_coupons");
    }

    #[test]
    fn test_build_nested_pipeline() {
        let pipeline = registry().build(&order_config(), "order").unwrap();

        assert_eq!(pipeline.name(), "order");
        assert_eq!(pipeline.stage_names(), vec!["create_order", "payment", "send_invoice"]);
        assert_eq!(
            pipeline.process(Vec::new()).unwrap(),
            vec!["create_order", "apply_coupons", "apply_taxes", "send_invoice"]
        );
    }

    #[test]
    fn test_build_all() {
        let built = registry().build_all(&order_config()).unwrap();

        assert_eq!(built.len(), 2);
        assert_eq!(built["payment"].len(), 2);
        assert_eq!(built["order"].len(), 3);
    }

    #[test]
    fn test_unknown_stage_reported_at_build() {
        let config = PipelineConfig::new()
            .with_pipeline(PipelineDefinition::new("order", ["create_order", "ship"]));

        let err = registry().build(&config, "order").unwrap_err();
        assert!(matches!(
            &err,
            ConstructionError::UnknownStage { pipeline, stage } if pipeline == "order" && stage == "ship"
        ));
        assert_eq!(err.error_info().code, "CONTRACT-004-MISSING_DEP");
    }

    #[test]
    fn test_unknown_entry() {
        let err = registry().build(&order_config(), "refund").unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownPipeline { name } if name == "refund"));
    }

    #[test]
    fn test_cycle_detected() {
        let config = PipelineConfig::new()
            .with_pipeline(PipelineDefinition::new("a", ["create_order", "b"]))
            .with_pipeline(PipelineDefinition::new("b", ["c"]))
            .with_pipeline(PipelineDefinition::new("c", ["a"]));

        let err = registry().build(&config, "a").unwrap_err();
        match err {
            ConstructionError::Cycle { path } => assert_eq!(path, vec!["a", "b", "c", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_detected() {
        let config = PipelineConfig::new().with_pipeline(PipelineDefinition::new("loop", ["loop"]));

        assert!(matches!(
            registry().build(&config, "loop"),
            Err(ConstructionError::Cycle { .. })
        ));
    }

    #[test]
    fn test_pipeline_shadowing_stage_rejected() {
        let config = PipelineConfig::new()
            .with_pipeline(PipelineDefinition::new("apply_taxes", ["create_order"]));

        assert!(matches!(
            registry().build(&config, "apply_taxes"),
            Err(ConstructionError::Duplicate { name }) if name == "apply_taxes"
        ));
    }

    #[test]
    fn test_built_pipelines_use_registry_sink() {
        let sink = Arc::new(CollectingEventSink::new());
        let registry = registry().with_event_sink(sink.clone());
        let pipeline = registry.build(&order_config(), "order").unwrap();

        pipeline.process(Vec::new()).unwrap();

        let started = sink.events_of_type("pipeline.started");
        assert_eq!(started.len(), 2);
        assert_eq!(started[0].pipeline, "order");
        assert_eq!(started[1].pipeline, "payment");
        assert_eq!(started[1].parent_run_id, Some(started[0].run_id));
    }
}
