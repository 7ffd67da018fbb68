//! Shared types for pipewright.
//!
//! This crate contains the declarative pipeline model (stages, links,
//! dynamic links) and the status events produced while a pipeline runs.

pub mod element;
pub mod events;
pub mod pipeline;
pub mod state;

// Re-export commonly used types
pub use element::{Link, PadRef, PropertyValue, StageId, StageSpec};
pub use events::PipelineEvent;
pub use pipeline::{DynamicLink, PadMatcher, PipelineSpec, SpecError};
pub use state::PipelineState;
