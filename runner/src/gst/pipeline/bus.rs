use super::state::from_gst_state;
use super::{PipelineError, PipelineManager};
use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::PipelineEvent;
use tracing::{error, info, trace, warn};

/// Name of the application message that ends the status loop early.
pub const INTERRUPT_MESSAGE: &str = "pipewright-interrupt";

/// Build the application message that ends the status loop early.
pub fn interrupt_message() -> gst::Message {
    gst::message::Application::new(gst::Structure::new_empty(INTERRUPT_MESSAGE))
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// End-of-stream reached
    EndOfStream,
    /// An element posted an error
    Failed {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    /// Stopped from outside before end-of-stream
    Interrupted,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Failed { .. })
    }
}

/// Thread-safe handle used to steer a running pipeline from another task.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    pipeline: gst::Pipeline,
}

impl ControlHandle {
    /// Ask the pipeline to drain: sources emit EOS and muxers finalize.
    pub fn send_eos(&self) -> bool {
        self.pipeline.send_event(gst::event::Eos::new())
    }

    /// End the status loop without waiting for end-of-stream.
    pub fn interrupt(&self) -> Result<(), PipelineError> {
        self.pipeline.post_message(interrupt_message())?;
        Ok(())
    }
}

impl PipelineManager {
    /// Get a handle that can drain or interrupt this pipeline from another thread.
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle {
            pipeline: self.pipeline.clone(),
        }
    }

    /// Block on the bus until end-of-stream, an error, or an interrupt.
    ///
    /// There is no timeout. Top-level state changes are logged and tracked
    /// on the way; everything else is ignored.
    pub fn wait_for_completion(&self) -> RunOutcome {
        let Some(bus) = self.pipeline.bus() else {
            error!("Pipeline '{}' does not have a bus", self.name);
            return RunOutcome::Failed {
                source: None,
                message: "pipeline has no bus".to_string(),
                debug: None,
            };
        };

        loop {
            let Some(msg) = bus.timed_pop_filtered(
                gst::ClockTime::NONE,
                &[
                    gst::MessageType::Eos,
                    gst::MessageType::Error,
                    gst::MessageType::StateChanged,
                    gst::MessageType::Application,
                ],
            ) else {
                continue;
            };

            let Some(event) = self.message_to_event(&msg) else {
                continue;
            };

            if let PipelineEvent::StateChanged { current, .. } = &event {
                self.set_cached_state(*current);
            }
            self.events.broadcast(event.clone());

            match event {
                PipelineEvent::Eos => return RunOutcome::EndOfStream,
                PipelineEvent::Error {
                    source,
                    message,
                    debug,
                } => {
                    return RunOutcome::Failed {
                        source,
                        message,
                        debug,
                    }
                }
                PipelineEvent::Interrupted => return RunOutcome::Interrupted,
                PipelineEvent::StateChanged { .. } => {}
            }
        }
    }

    /// Take a pending element error off the bus without blocking.
    pub(super) fn pop_error(&self) -> Option<PipelineEvent> {
        let msg = self
            .pipeline
            .bus()?
            .pop_filtered(&[gst::MessageType::Error])?;
        let event = self.message_to_event(&msg)?;
        self.events.broadcast(event.clone());
        Some(event)
    }

    /// Translate one bus message into a status event, logging it on the way.
    pub(super) fn message_to_event(&self, msg: &gst::Message) -> Option<PipelineEvent> {
        use gst::MessageView;

        trace!("Bus message type: {:?}", msg.type_());

        match msg.view() {
            MessageView::Eos(_) => {
                info!("Pipeline '{}' reached end of stream", self.name);
                Some(PipelineEvent::Eos)
            }
            MessageView::Error(err) => {
                let source = msg.src().map(|s| s.name().to_string());
                let message = err.error().message().to_string();
                let debug = err.debug().map(|d| d.to_string());

                error!(
                    "Error received from element {}: {}",
                    source.as_deref().unwrap_or("<unknown>"),
                    message
                );
                let debug_info = debug.as_deref().unwrap_or("none");
                error!("Debugging information: {}", debug_info);

                Some(PipelineEvent::Error {
                    source,
                    message,
                    debug,
                })
            }
            MessageView::StateChanged(state_changed) => {
                // Only the pipeline's own transitions are reported
                let from_pipeline = msg
                    .src()
                    .is_some_and(|s| s == self.pipeline.upcast_ref::<gst::Object>());
                if !from_pipeline {
                    return None;
                }

                let old = from_gst_state(state_changed.old())?;
                let current = from_gst_state(state_changed.current())?;
                let pending = from_gst_state(state_changed.pending());

                info!(
                    "Pipeline '{}' state changed from {} to {}",
                    self.name, old, current
                );

                Some(PipelineEvent::StateChanged {
                    old,
                    current,
                    pending,
                })
            }
            MessageView::Application(app) => {
                if app
                    .structure()
                    .is_some_and(|s| s.has_name(INTERRUPT_MESSAGE))
                {
                    warn!("Pipeline '{}' interrupted", self.name);
                    Some(PipelineEvent::Interrupted)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
