//! Declarative GStreamer pipeline assembly.
//!
//! A [`PipelineSpec`](pipewright_types::PipelineSpec) names the stages, their
//! properties and how they connect. [`gst::PipelineManager`] turns it into a
//! running pipeline, completing links to pads that only appear at runtime,
//! and [`runner`] drives it until end-of-stream, an error or Ctrl+C.

pub mod cli;
pub mod config;
pub mod events;
pub mod gst;
pub mod logging;
pub mod presets;
pub mod runner;
