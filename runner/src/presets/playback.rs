//! Playback topologies built from stock GStreamer elements.

use pipewright_types::{PadMatcher, PipelineSpec, PropertyValue, StageSpec};

/// Caps prefix of decoded audio.
pub const RAW_AUDIO: &str = "audio/x-raw";

/// `uridecodebin ~> audioconvert -> audioresample -> autoaudiosink`
///
/// uridecodebin creates one pad per decoded stream. Only the first raw audio
/// pad is connected; video pads are ignored.
pub fn dynamic_audio_pipeline(uri: &str) -> PipelineSpec {
    PipelineSpec::new("test-pipeline")
        .stage(StageSpec::new("source", "uridecodebin").property("uri", uri))
        .stage(StageSpec::new("convert", "audioconvert"))
        .stage(StageSpec::new("resample", "audioresample"))
        .stage(StageSpec::new("sink", "autoaudiosink"))
        .link_chain(&["convert", "resample", "sink"])
        .dynamic_link(
            "source",
            "convert",
            PadMatcher::MediaType(RAW_AUDIO.to_string()),
        )
}

/// `videotestsrc -> autovideosink` showing the given pattern.
pub fn test_pattern_pipeline(pattern: PropertyValue) -> PipelineSpec {
    PipelineSpec::new("test-pipeline")
        .stage(StageSpec::new("source", "videotestsrc").property("pattern", pattern))
        .stage(StageSpec::new("sink", "autovideosink"))
        .link("source", "sink")
}

/// A single `playbin`, which builds its own decoding and output chain.
pub fn playbin_pipeline(uri: &str) -> PipelineSpec {
    PipelineSpec::new("hello-video").stage(StageSpec::new("playbin", "playbin").property("uri", uri))
}

/// Interpret a command-line pattern: a number is the enum value, anything
/// else is taken as a nick such as "ball" or "smpte".
pub fn pattern_value(pattern: &str) -> PropertyValue {
    pattern
        .parse::<i64>()
        .map(PropertyValue::Int)
        .unwrap_or_else(|_| PropertyValue::from(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_audio_topology() {
        let spec = dynamic_audio_pipeline("file:///tmp/a.ogg");
        spec.validate().unwrap();

        let ids: Vec<&str> = spec.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["source", "convert", "resample", "sink"]);
        assert_eq!(spec.links.len(), 2);
        assert!(!spec.links.iter().any(|l| l.from == "source"));

        let dynamic = &spec.dynamic_links[0];
        assert_eq!(dynamic.from, "source");
        assert_eq!(dynamic.sink_ref().to_string(), "convert:sink");
        assert!(dynamic.matcher.matches("src_0", Some("audio/x-raw")));
        assert!(!dynamic.matcher.matches("src_1", Some("video/x-raw")));
    }

    #[test]
    fn test_pattern_pipeline() {
        let spec = super::test_pattern_pipeline(pattern_value("ball"));
        spec.validate().unwrap();
        assert_eq!(
            spec.find_stage("source").unwrap().get_property("pattern"),
            Some(&PropertyValue::from("ball"))
        );
        assert_eq!(spec.links.len(), 1);
        assert!(spec.dynamic_links.is_empty());
    }

    #[test]
    fn test_pattern_value() {
        assert_eq!(pattern_value("0"), PropertyValue::Int(0));
        assert_eq!(pattern_value("18"), PropertyValue::Int(18));
        assert_eq!(pattern_value("smpte"), PropertyValue::from("smpte"));
    }

    #[test]
    fn test_playbin_pipeline() {
        let spec = playbin_pipeline("https://example.com/clip.webm");
        spec.validate().unwrap();
        assert_eq!(spec.stages.len(), 1);
        assert!(spec.links.is_empty());
        assert_eq!(
            spec.stages[0].get_property("uri"),
            Some(&PropertyValue::from("https://example.com/clip.webm"))
        );
    }
}
