//! GStreamer integration.

pub mod pipeline;
pub mod resolver;

pub use pipeline::{ControlHandle, PipelineError, PipelineManager, RunOutcome};
pub use resolver::{PadResolver, Resolution};
