use super::PipelineManager;
use crate::gst::resolver::PadResolver;
use gstreamer as gst;
use pipewright_types::PipelineState;
use tracing::info;

/// Map a GStreamer state onto the pipeline state model.
/// `VoidPending` has no counterpart and maps to `None`.
pub(super) fn from_gst_state(state: gst::State) -> Option<PipelineState> {
    match state {
        gst::State::Null => Some(PipelineState::Null),
        gst::State::Ready => Some(PipelineState::Ready),
        gst::State::Paused => Some(PipelineState::Paused),
        gst::State::Playing => Some(PipelineState::Playing),
        _ => None,
    }
}

impl PipelineManager {
    /// Get the current state of the pipeline as last reported on the bus.
    pub fn get_state(&self) -> PipelineState {
        self.cached_state
            .read()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    pub(super) fn set_cached_state(&self, state: PipelineState) {
        if let Ok(mut guard) = self.cached_state.write() {
            *guard = state;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the underlying GStreamer pipeline.
    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    /// Get a stage's element by id.
    pub fn element(&self, id: &str) -> Option<&gst::Element> {
        self.elements.get(id)
    }

    /// Stage ids in construction order.
    pub fn stage_ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Resolvers for the dynamic links, in declaration order.
    pub fn resolvers(&self) -> &[PadResolver] {
        &self.resolvers
    }

    /// Generate a DOT graph of the pipeline for debugging.
    pub fn generate_dot_graph(&self) -> String {
        use gst::prelude::*;

        info!("Generating DOT graph for pipeline: {}", self.name);
        self.pipeline
            .debug_to_dot_data(gst::DebugGraphDetails::all())
            .to_string()
    }
}
