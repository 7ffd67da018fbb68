//! Command-line handling shared by the bundled programs.

use crate::runner::EXIT_SETUP_FAILURE;
use clap::error::ErrorKind;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Flags every program accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file, overriding every other configuration source
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print each pipeline event as a JSON line on stdout
    #[arg(long)]
    pub emit_events: bool,

    /// Write a Graphviz DOT graph of the pipeline when the run ends
    #[arg(long, value_name = "FILE")]
    pub dot_file: Option<PathBuf>,

    /// Print the pipeline description as JSON and exit without running it
    #[arg(long)]
    pub print_spec: bool,
}

/// Parse the command line or exit.
///
/// `--help` and `--version` exit 0. Any other problem, such as a missing
/// positional argument, prints the usage on stderr and exits -1 before
/// anything is constructed.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_SETUP_FAILURE,
            };
            std::process::exit(code)
        }
    }
}
