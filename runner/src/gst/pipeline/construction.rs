use super::{PipelineError, PipelineManager};
use crate::events::EventBroadcaster;
use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::{PipelineSpec, PipelineState, StageSpec};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info};

impl PipelineManager {
    /// Create a new pipeline from a pipeline spec.
    ///
    /// Every stage is constructed, configured and added before any link is
    /// attempted. Static links are made immediately; dynamic links get a
    /// pad resolver that completes them once the pipeline runs.
    pub fn new(spec: &PipelineSpec, events: EventBroadcaster) -> Result<Self, PipelineError> {
        info!("Creating pipeline: {}", spec.name);
        info!(
            "Pipeline has {} stages, {} links, {} dynamic links",
            spec.stages.len(),
            spec.links.len(),
            spec.dynamic_links.len()
        );

        spec.validate()?;

        let pipeline = gst::Pipeline::builder().name(&spec.name).build();

        let mut manager = Self {
            name: spec.name.clone(),
            pipeline,
            elements: HashMap::new(),
            order: Vec::new(),
            resolvers: Vec::new(),
            events,
            cached_state: Arc::new(RwLock::new(PipelineState::Null)),
        };

        for (idx, stage) in spec.stages.iter().enumerate() {
            debug!(
                "Adding stage {}/{}: {} (type: {})",
                idx + 1,
                spec.stages.len(),
                stage.id,
                stage.factory
            );
            manager.add_stage(stage)?;
        }

        debug!("Linking {} static links...", spec.links.len());
        for link in &spec.links {
            manager.try_link_elements(link)?;
        }

        for link in &spec.dynamic_links {
            manager.add_dynamic_link(link)?;
        }

        info!("Pipeline created successfully: {}", spec.name);
        Ok(manager)
    }

    /// Construct, configure and add one stage.
    fn add_stage(&mut self, stage: &StageSpec) -> Result<(), PipelineError> {
        let element = gst::ElementFactory::make(&stage.factory)
            .name(&stage.id)
            .build()
            .map_err(|e| {
                error!(
                    "Failed to create element {} (type: {}): {}",
                    stage.id, stage.factory, e
                );
                PipelineError::ElementCreation {
                    id: stage.id.clone(),
                    factory: stage.factory.clone(),
                    reason: e.to_string(),
                }
            })?;

        if !stage.properties.is_empty() {
            debug!(
                "Setting {} properties for element {}",
                stage.properties.len(),
                stage.id
            );
        }
        for (prop_name, prop_value) in &stage.properties {
            self.set_property(&element, &stage.id, prop_name, prop_value)?;
        }

        self.pipeline.add(&element).map_err(|e| {
            error!("Failed to add {} to pipeline: {}", stage.id, e);
            PipelineError::ElementCreation {
                id: stage.id.clone(),
                factory: stage.factory.clone(),
                reason: format!("could not add to pipeline: {}", e),
            }
        })?;

        self.elements.insert(stage.id.clone(), element);
        self.order.push(stage.id.clone());
        Ok(())
    }
}
