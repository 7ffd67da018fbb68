//! GStreamer pipeline management.

mod bus;
mod construction;
mod lifecycle;
mod linking;
mod properties;
mod state;

pub use bus::{interrupt_message, ControlHandle, RunOutcome, INTERRUPT_MESSAGE};

use crate::events::EventBroadcaster;
use crate::gst::resolver::PadResolver;
use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::PipelineState;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    GStreamer(#[from] gst::glib::Error),

    #[error("GStreamer boolean error: {0}")]
    BoolError(#[from] gst::glib::BoolError),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(#[from] pipewright_types::SpecError),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Failed to create element {id} ({factory}): {reason}")]
    ElementCreation {
        id: String,
        factory: String,
        reason: String,
    },

    #[error("Failed to link elements: {from} -> {to}: {reason}")]
    LinkError {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Invalid property value for {element}.{property}: {reason}")]
    InvalidProperty {
        element: String,
        property: String,
        reason: String,
    },

    #[error("Pad not found: {element}:{pad}")]
    PadNotFound { element: String, pad: String },

    #[error("Pipeline state change failed: {0}")]
    StateChange(String),

    /// An element posted an error while the pipeline was being activated
    #[error("Error received from element {}: {message}", .element.as_deref().unwrap_or("<unknown>"))]
    ElementFailed {
        element: Option<String>,
        message: String,
        debug: Option<String>,
    },
}

impl PipelineError {
    /// Whether the failure came from an element at runtime rather than from
    /// building or activating the pipeline.
    pub fn is_runtime(&self) -> bool {
        matches!(self, PipelineError::ElementFailed { .. })
    }
}

/// Owns one GStreamer pipeline built from a [`pipewright_types::PipelineSpec`].
///
/// Dropping the manager always brings the pipeline back to NULL.
pub struct PipelineManager {
    name: String,
    pipeline: gst::Pipeline,
    elements: HashMap<String, gst::Element>,
    /// Stage ids in construction order
    order: Vec<String>,
    /// One resolver per dynamic link, shared with the pad-added closures
    resolvers: Vec<PadResolver>,
    events: EventBroadcaster,
    /// Last top-level state seen on the bus or set by us
    cached_state: Arc<RwLock<PipelineState>>,
}

impl Drop for PipelineManager {
    fn drop(&mut self) {
        debug!("Dropping pipeline: {}", self.name);
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_types::{PadMatcher, PipelineSpec, PropertyValue, StageSpec};

    fn create_test_spec() -> PipelineSpec {
        PipelineSpec::new("test-pipeline")
            .stage(
                StageSpec::new("src", "videotestsrc")
                    .property("num-buffers", 5)
                    .property("pattern", "ball"),
            )
            .stage(StageSpec::new("sink", "fakesink").property("sync", false))
            .link("src", "sink")
    }

    #[test]
    fn test_create_pipeline() {
        gst::init().unwrap();
        let manager = PipelineManager::new(&create_test_spec(), EventBroadcaster::default());
        let manager = manager.unwrap();
        assert_eq!(manager.stage_ids(), vec!["src", "sink"]);
        assert_eq!(manager.get_state(), PipelineState::Null);
        assert!(manager.element("src").is_some());
        assert_eq!(manager.pipeline().name().as_str(), "test-pipeline");
    }

    #[test]
    fn test_invalid_element_names_the_stage() {
        gst::init().unwrap();
        let mut spec = create_test_spec();
        spec.stages[0].factory = "nonexistentelement".to_string();

        match PipelineManager::new(&spec, EventBroadcaster::default()) {
            Err(PipelineError::ElementCreation { id, factory, .. }) => {
                assert_eq!(id, "src");
                assert_eq!(factory, "nonexistentelement");
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("pipeline with unknown element was created"),
        }
    }

    #[test]
    fn test_out_of_range_property_is_an_error() {
        gst::init().unwrap();
        let mut spec = create_test_spec();
        spec.stages[0].properties[0].1 = PropertyValue::Int(-2);

        match PipelineManager::new(&spec, EventBroadcaster::default()) {
            Err(PipelineError::InvalidProperty {
                element, property, ..
            }) => {
                assert_eq!(element, "src");
                assert_eq!(property, "num-buffers");
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("num-buffers = -2 was accepted"),
        }
    }

    #[test]
    fn test_duplicate_stage_rejected_before_construction() {
        gst::init().unwrap();
        let spec = create_test_spec().stage(StageSpec::new("sink", "fakesink"));
        assert!(matches!(
            PipelineManager::new(&spec, EventBroadcaster::default()),
            Err(PipelineError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_start_stop_pipeline() {
        gst::init().unwrap();
        let spec = create_test_spec();
        let mut manager = PipelineManager::new(&spec, EventBroadcaster::default()).unwrap();

        let state = manager.start();
        assert!(state.is_ok());
        assert_eq!(state.unwrap(), PipelineState::Playing);

        let state = manager.stop();
        assert_eq!(state.unwrap(), PipelineState::Null);
        assert_eq!(manager.get_state(), PipelineState::Null);
        let (_, current, _) = manager.pipeline().state(gst::ClockTime::ZERO);
        assert_eq!(current, gst::State::Null);

        // Stopping twice is harmless
        assert_eq!(manager.stop().unwrap(), PipelineState::Null);
    }

    #[test]
    fn test_run_to_eos() {
        gst::init().unwrap();
        let mut manager =
            PipelineManager::new(&create_test_spec(), EventBroadcaster::default()).unwrap();
        manager.start().unwrap();
        assert_eq!(manager.wait_for_completion(), RunOutcome::EndOfStream);
        manager.stop().unwrap();
    }

    #[test]
    fn test_drop_resets_to_null() {
        gst::init().unwrap();
        let mut manager =
            PipelineManager::new(&create_test_spec(), EventBroadcaster::default()).unwrap();
        manager.start().unwrap();
        let pipeline = manager.pipeline().clone();
        drop(manager);
        let (_, current, _) = pipeline.state(gst::ClockTime::ZERO);
        assert_eq!(current, gst::State::Null);
    }

    #[test]
    fn test_dynamic_link_registers_resolver() {
        gst::init().unwrap();
        let spec = PipelineSpec::new("dynamic")
            .stage(StageSpec::new("source", "filesrc").property("location", "in.ogg"))
            .stage(StageSpec::new("decoder", "decodebin"))
            .stage(StageSpec::new("convert", "audioconvert"))
            .stage(StageSpec::new("sink", "fakesink"))
            .link("source", "decoder")
            .link("convert", "sink")
            .dynamic_link(
                "decoder",
                "convert",
                PadMatcher::MediaType("audio/x-raw".into()),
            );

        let manager = PipelineManager::new(&spec, EventBroadcaster::default()).unwrap();
        assert_eq!(manager.resolvers().len(), 1);
        assert_eq!(manager.resolvers()[0].upstream(), "decoder");
        assert!(!manager.resolvers()[0].is_linked());
    }

    #[test]
    fn test_dynamic_link_to_missing_pad() {
        gst::init().unwrap();
        let spec = create_test_spec()
            .stage(StageSpec::new("demux", "identity"))
            .dynamic_link("demux", "sink:nope", PadMatcher::Name("video_0".into()));

        match PipelineManager::new(&spec, EventBroadcaster::default()) {
            Err(PipelineError::PadNotFound { element, pad }) => {
                assert_eq!(element, "sink");
                assert_eq!(pad, "nope");
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected missing pad error"),
        }
    }
}
