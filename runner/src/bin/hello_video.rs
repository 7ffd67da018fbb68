//! Show a test pattern in a window.

use clap::Parser;
use pipewright::cli::{self, CommonArgs};
use pipewright::presets::{self, playback::pattern_value};
use pipewright::runner;

/// Display a videotestsrc pattern
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pattern number or name (e.g. 0, "ball", "smpte")
    #[arg(long, default_value = "0")]
    pattern: String,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args: Args = cli::parse_args();
    let code = runner::launch(&args.common, |_| {
        presets::test_pattern_pipeline(pattern_value(&args.pattern))
    });
    std::process::exit(code)
}
