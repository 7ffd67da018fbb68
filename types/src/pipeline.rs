//! Pipeline definitions.

use crate::element::{Link, PadRef, StageSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// How a dynamically created pad is recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PadMatcher {
    /// The pad name must equal this value (e.g. "video_0" on qtdemux).
    Name(String),
    /// The media type of the pad's first caps structure must start with this prefix
    /// (e.g. "audio/x-raw" on uridecodebin).
    MediaType(String),
}

impl PadMatcher {
    /// Decide whether a pad matches. `media_type` is `None` when the pad has no caps yet.
    pub fn matches(&self, pad_name: &str, media_type: Option<&str>) -> bool {
        match self {
            PadMatcher::Name(name) => pad_name == name,
            PadMatcher::MediaType(prefix) => media_type.is_some_and(|t| t.starts_with(prefix)),
        }
    }

    /// Whether the pad's caps must be inspected to decide.
    pub fn needs_caps(&self) -> bool {
        matches!(self, PadMatcher::MediaType(_))
    }
}

impl fmt::Display for PadMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadMatcher::Name(name) => write!(f, "pad name '{}'", name),
            PadMatcher::MediaType(prefix) => write!(f, "media type '{}*'", prefix),
        }
    }
}

/// A link whose source pad only appears at runtime (a "sometimes" pad).
///
/// The first discovered pad on `from` that satisfies `matcher` is linked to `to`.
/// Later pads are ignored once the sink pad is linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicLink {
    /// Stage that creates pads at runtime (demuxer, decodebin)
    pub from: String,
    /// Fixed sink pad ("stage_id:pad_name"; pad defaults to "sink")
    pub to: String,
    pub matcher: PadMatcher,
}

impl DynamicLink {
    pub fn new(from: impl Into<String>, to: impl Into<String>, matcher: PadMatcher) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            matcher,
        }
    }

    /// The sink side as a pad reference, defaulting the pad name to "sink".
    pub fn sink_ref(&self) -> PadRef {
        let mut pad_ref = PadRef::parse(&self.to);
        if pad_ref.pad_name.is_none() {
            pad_ref.pad_name = Some("sink".to_string());
        }
        pad_ref
    }
}

/// A complete declarative pipeline: stages, static links and dynamic links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Name given to the GStreamer pipeline
    pub name: String,
    /// Stages in construction order
    #[serde(default)]
    pub stages: Vec<StageSpec>,
    /// Links whose both endpoints exist at construction time
    #[serde(default)]
    pub links: Vec<Link>,
    /// Links completed when a matching pad appears at runtime
    #[serde(default)]
    pub dynamic_links: Vec<DynamicLink>,
}

/// Structural problems found before any element is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("pipeline has no stages")]
    EmptyPipeline,

    #[error("stage of type '{factory}' has an empty id")]
    EmptyStageId { factory: String },

    #[error("duplicate stage id '{0}'")]
    DuplicateStage(String),

    #[error("link '{link}' refers to unknown stage '{stage}'")]
    UnknownStage { link: String, stage: String },
}

impl PipelineSpec {
    /// Create an empty pipeline spec.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            links: Vec::new(),
            dynamic_links: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn link(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.links.push(Link::new(from, to));
        self
    }

    /// Link a chain of stages in order using their default pads.
    pub fn link_chain(mut self, ids: &[&str]) -> Self {
        for pair in ids.windows(2) {
            self.links.push(Link::new(pair[0], pair[1]));
        }
        self
    }

    pub fn dynamic_link(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        matcher: PadMatcher,
    ) -> Self {
        self.dynamic_links.push(DynamicLink::new(from, to, matcher));
        self
    }

    pub fn find_stage(&self, id: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Check ids are present and unique and that every link refers to a known stage.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.stages.is_empty() {
            return Err(SpecError::EmptyPipeline);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.id.is_empty() {
                return Err(SpecError::EmptyStageId {
                    factory: stage.factory.clone(),
                });
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(SpecError::DuplicateStage(stage.id.clone()));
            }
        }

        let check = |link: String, stage: &str| {
            if seen.contains(stage) {
                Ok(())
            } else {
                Err(SpecError::UnknownStage {
                    link,
                    stage: stage.to_string(),
                })
            }
        };

        for link in &self.links {
            let (from, to) = link.to_pad_refs();
            let desc = format!("{} -> {}", link.from, link.to);
            check(desc.clone(), &from.stage_id)?;
            check(desc, &to.stage_id)?;
        }

        for link in &self.dynamic_links {
            let desc = format!("{} ~> {}", link.from, link.to);
            check(desc.clone(), &link.from)?;
            check(desc, &link.sink_ref().stage_id)?;
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_spec() -> PipelineSpec {
        PipelineSpec::new("test-pipeline")
            .stage(StageSpec::new("source", "uridecodebin"))
            .stage(StageSpec::new("convert", "audioconvert"))
            .stage(StageSpec::new("resample", "audioresample"))
            .stage(StageSpec::new("sink", "autoaudiosink"))
            .link_chain(&["convert", "resample", "sink"])
            .dynamic_link(
                "source",
                "convert",
                PadMatcher::MediaType("audio/x-raw".to_string()),
            )
    }

    #[test]
    fn test_matcher_name_is_exact() {
        let matcher = PadMatcher::Name("video_0".to_string());
        assert!(matcher.matches("video_0", None));
        assert!(!matcher.matches("video_1", Some("video/x-h264")));
        assert!(!matcher.matches("audio_0", None));
        assert!(!matcher.needs_caps());
    }

    #[test]
    fn test_matcher_media_type_prefix() {
        let matcher = PadMatcher::MediaType("audio/x-raw".to_string());
        assert!(matcher.matches("src_0", Some("audio/x-raw")));
        assert!(!matcher.matches("src_1", Some("video/x-raw")));
        assert!(!matcher.matches("src_2", Some("audio/mpeg")));
        assert!(!matcher.matches("src_3", None));
        assert!(matcher.needs_caps());
    }

    #[test]
    fn test_link_chain() {
        let spec = audio_spec();
        assert_eq!(spec.links.len(), 2);
        assert_eq!(spec.links[0], Link::new("convert", "resample"));
        assert_eq!(spec.links[1], Link::new("resample", "sink"));
    }

    #[test]
    fn test_dynamic_sink_defaults_to_sink_pad() {
        let spec = audio_spec();
        let sink = spec.dynamic_links[0].sink_ref();
        assert_eq!(sink.stage_id, "convert");
        assert_eq!(sink.pad_name.as_deref(), Some("sink"));
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(audio_spec().validate(), Ok(()));
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(
            PipelineSpec::new("empty").validate(),
            Err(SpecError::EmptyPipeline)
        );
    }

    #[test]
    fn test_validate_duplicate_stage() {
        let spec = audio_spec().stage(StageSpec::new("sink", "fakesink"));
        assert_eq!(
            spec.validate(),
            Err(SpecError::DuplicateStage("sink".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_link_target() {
        let spec = audio_spec().link("sink", "missing:sink");
        match spec.validate() {
            Err(e @ SpecError::UnknownStage { .. }) => {
                assert_eq!(
                    e.to_string(),
                    "link 'sink -> missing:sink' refers to unknown stage 'missing'"
                );
                let _: &dyn std::error::Error = &e;
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_unknown_dynamic_source() {
        let spec = audio_spec().dynamic_link(
            "demux",
            "convert",
            PadMatcher::Name("audio_0".to_string()),
        );
        assert!(matches!(
            spec.validate(),
            Err(SpecError::UnknownStage { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_matcher() {
        let spec = audio_spec();
        let json = spec.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"media_type\""));
        let parsed = PipelineSpec::from_json(&json).unwrap();
        assert_eq!(parsed, spec);
    }
}
