//! Play any URI with playbin.

use clap::Parser;
use pipewright::cli::{self, CommonArgs};
use pipewright::{presets, runner};

/// Play a media URI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media URI; defaults to the configured playback URI
    uri: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args: Args = cli::parse_args();
    let code = runner::launch(&args.common, |config| {
        presets::playbin_pipeline(args.uri.as_deref().unwrap_or(&config.playback.uri))
    });
    std::process::exit(code)
}
