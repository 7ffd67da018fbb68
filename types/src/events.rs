//! Status events emitted while a pipeline runs.

use crate::state::PipelineState;
use serde::{Deserialize, Serialize};

/// The closed set of bus messages the status loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// Pipeline reached end of stream
    Eos,
    /// An element posted an error; the run is over
    Error {
        /// Name of the element that posted the error
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    /// The top-level pipeline changed state
    StateChanged {
        old: PipelineState,
        current: PipelineState,
        pending: Option<PipelineState>,
    },
    /// The run was interrupted from outside (signal)
    Interrupted,
}

impl PipelineEvent {
    /// Get a short description of this event.
    pub fn description(&self) -> String {
        match self {
            PipelineEvent::Eos => "End-Of-Stream reached".to_string(),
            PipelineEvent::Error {
                source, message, ..
            } => format!(
                "Error received from element {}: {}",
                source.as_deref().unwrap_or("<unknown>"),
                message
            ),
            PipelineEvent::StateChanged { old, current, .. } => {
                format!("Pipeline state changed from {} to {}", old, current)
            }
            PipelineEvent::Interrupted => "Interrupted".to_string(),
        }
    }
}
