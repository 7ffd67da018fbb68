//! Ready-made pipeline topologies for the bundled programs.
//!
//! Each preset only describes the pipeline. Nothing is constructed until the
//! returned [`PipelineSpec`](pipewright_types::PipelineSpec) is handed to
//! [`PipelineManager::new`](crate::gst::PipelineManager::new).

pub mod deepstream;
pub mod playback;

pub use deepstream::tracker_pipeline;
pub use playback::{dynamic_audio_pipeline, playbin_pipeline, test_pattern_pipeline};
