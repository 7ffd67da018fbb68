use super::{PipelineError, PipelineManager};
use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::{PipelineEvent, PipelineState};
use tracing::{error, info};

impl PipelineManager {
    /// Start the pipeline (set to PLAYING state).
    ///
    /// On failure the pipeline is put back to NULL before the error is returned.
    /// If an element explains the failure on the bus (a missing input file,
    /// for instance), [`PipelineError::ElementFailed`] carries its message.
    pub fn start(&mut self) -> Result<PipelineState, PipelineError> {
        info!("Starting pipeline: {}", self.name);
        info!("Pipeline has {} elements", self.elements.len());

        if let Err(e) = self.pipeline.set_state(gst::State::Ready) {
            error!("Pipeline '{}' failed to reach READY: {}", self.name, e);
            return Err(self.fail_activation(format!("Failed to reach READY: {}", e)));
        }
        self.set_cached_state(PipelineState::Ready);

        info!("Setting pipeline '{}' to PLAYING state...", self.name);
        match self.pipeline.set_state(gst::State::Playing) {
            Ok(gst::StateChangeSuccess::Success) => {
                info!("Pipeline '{}' set to PLAYING: Success", self.name);
            }
            Ok(gst::StateChangeSuccess::Async) => {
                info!(
                    "Pipeline '{}' set to PLAYING: Async (state change in progress)",
                    self.name
                );
            }
            Ok(gst::StateChangeSuccess::NoPreroll) => {
                info!(
                    "Pipeline '{}' set to PLAYING: NoPreroll (live source)",
                    self.name
                );
            }
            Err(e) => {
                error!("Unable to set the pipeline '{}' to the playing state.", self.name);
                return Err(self.fail_activation(format!("Failed to start: {}", e)));
            }
        }

        // The bus reports when the async transition completes
        self.set_cached_state(PipelineState::Playing);
        Ok(PipelineState::Playing)
    }

    /// Stop the pipeline (set to NULL state). Safe to call more than once.
    pub fn stop(&mut self) -> Result<PipelineState, PipelineError> {
        info!("Stopping pipeline: {}", self.name);

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| PipelineError::StateChange(format!("Failed to stop: {}", e)))?;

        self.set_cached_state(PipelineState::Null);
        Ok(PipelineState::Null)
    }

    /// Turn a failed activation into an error and reset to NULL.
    ///
    /// An element error already on the bus takes precedence, since going to
    /// NULL flushes the bus and would lose it.
    fn fail_activation(&self, reason: String) -> PipelineError {
        let err = match self.pop_error() {
            Some(PipelineEvent::Error {
                source,
                message,
                debug,
            }) => PipelineError::ElementFailed {
                element: source,
                message,
                debug,
            },
            _ => PipelineError::StateChange(reason),
        };
        self.reset_to_null();
        err
    }

    fn reset_to_null(&self) {
        let _ = self.pipeline.set_state(gst::State::Null);
        self.set_cached_state(PipelineState::Null);
    }
}
