//! Object detection and tracking over an H.264 MP4 file.
//!
//! ```text
//! filesrc -> qtdemux ~> h264parse -> nvv4l2decoder -> nvstreammux(sink_0)
//!   -> nvinfer -> nvtracker -> nvvideoconvert -> nvdsosd -> nvvideoconvert
//!   -> nvv4l2h264enc -> h264parse -> qtmux -> filesink
//! ```
//!
//! `~>` is resolved at runtime: qtdemux only exposes `video_0` once it has
//! parsed the container.

use crate::config::DeepStreamConfig;
use pipewright_types::{PadMatcher, PipelineSpec, StageSpec};

pub const PIPELINE_NAME: &str = "deepstream_tutorial_app1";

/// Demuxer pad carrying the first video stream.
pub const VIDEO_PAD: &str = "video_0";

/// Build the tracker pipeline reading `input` and writing `config.output_path`.
pub fn tracker_pipeline(input: &str, config: &DeepStreamConfig) -> PipelineSpec {
    PipelineSpec::new(PIPELINE_NAME)
        .stage(StageSpec::new("file-source", "filesrc").property("location", input))
        .stage(StageSpec::new("qtdemux", "qtdemux"))
        .stage(StageSpec::new("h264-parser", "h264parse"))
        .stage(StageSpec::new("nvv4l2-decoder", "nvv4l2decoder"))
        .stage(
            StageSpec::new("stream-muxer", "nvstreammux")
                .property("batch-size", config.batch_size)
                .property("width", config.muxer_width)
                .property("height", config.muxer_height)
                .property("batched-push-timeout", config.batched_push_timeout_us),
        )
        .stage(
            StageSpec::new("primary-nvinference-engine", "nvinfer")
                .property("config-file-path", config.pgie_config_path.as_str()),
        )
        .stage(
            StageSpec::new("tracker", "nvtracker")
                .property("ll-lib-file", config.tracker_lib_path.as_str()),
        )
        .stage(StageSpec::new("nvvideo-converter", "nvvideoconvert"))
        .stage(StageSpec::new("nv-onscreendisplay", "nvdsosd"))
        .stage(StageSpec::new("nvvideo-converter2", "nvvideoconvert"))
        .stage(StageSpec::new("nvv4l2h264enc", "nvv4l2h264enc"))
        .stage(StageSpec::new("h264parser2", "h264parse"))
        .stage(StageSpec::new("qtmux", "qtmux"))
        .stage(
            StageSpec::new("filesink", "filesink")
                .property("location", config.output_path.as_str()),
        )
        .link("file-source", "qtdemux")
        .link("h264-parser", "nvv4l2-decoder")
        // The muxer only has request sink pads
        .link("nvv4l2-decoder:src", "stream-muxer:sink_0")
        .link_chain(&[
            "stream-muxer",
            "primary-nvinference-engine",
            "tracker",
            "nvvideo-converter",
            "nv-onscreendisplay",
            "nvvideo-converter2",
            "nvv4l2h264enc",
            "h264parser2",
            "qtmux",
            "filesink",
        ])
        .dynamic_link(
            "qtdemux",
            "h264-parser:sink",
            PadMatcher::Name(VIDEO_PAD.to_string()),
        )
}
