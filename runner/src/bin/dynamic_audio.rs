//! Play the audio track of a remote file, linking the decoder at runtime.

use clap::Parser;
use pipewright::cli::{self, CommonArgs};
use pipewright::{presets, runner};

/// Play the audio of the configured URI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args: Args = cli::parse_args();
    let code = runner::launch(&args.common, |config| {
        presets::dynamic_audio_pipeline(&config.playback.uri)
    });
    std::process::exit(code)
}
