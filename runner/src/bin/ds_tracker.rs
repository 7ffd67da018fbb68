//! Detect and track objects in an H.264 MP4 file, writing an annotated copy.

use clap::Parser;
use pipewright::cli::{self, CommonArgs};
use pipewright::{presets, runner};

/// DeepStream object tracker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an H.264 encoded MP4 file
    input: String,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args: Args = cli::parse_args();
    let code = runner::launch(&args.common, |config| {
        presets::tracker_pipeline(&args.input, &config.deepstream)
    });
    std::process::exit(code)
}
