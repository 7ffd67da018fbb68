//! Drives one pipeline from construction to teardown.

use crate::cli::CommonArgs;
use crate::config::Config;
use crate::events::EventBroadcaster;
use crate::gst::{PipelineError, PipelineManager, RunOutcome};
use crate::logging;
use gstreamer as gst;
use pipewright_types::PipelineSpec;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Exit code for construction, configuration, linking or activation failures.
pub const EXIT_SETUP_FAILURE: i32 = -1;

/// Exit code when an element reports an error while running.
pub const EXIT_RUNTIME_FAILURE: i32 = 1;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Print every pipeline event as a JSON line on stdout
    pub emit_events: bool,
    /// Write a DOT graph of the final topology here before teardown
    pub dot_file: Option<PathBuf>,
}

impl From<&CommonArgs> for RunOptions {
    fn from(args: &CommonArgs) -> Self {
        Self {
            emit_events: args.emit_events,
            dot_file: args.dot_file.clone(),
        }
    }
}

/// Map the result of [`run`] to a process exit code.
pub fn exit_code(result: &Result<RunOutcome, PipelineError>) -> i32 {
    match result {
        Ok(RunOutcome::EndOfStream) | Ok(RunOutcome::Interrupted) => 0,
        Ok(RunOutcome::Failed { .. }) => EXIT_RUNTIME_FAILURE,
        Err(e) if e.is_runtime() => EXIT_RUNTIME_FAILURE,
        Err(_) => EXIT_SETUP_FAILURE,
    }
}

/// Build, start and run a pipeline until it finishes.
///
/// GStreamer must already be initialized. The first Ctrl+C drains the
/// pipeline with EOS so muxers can finalize their output; a second one
/// stops the status loop right away and a third exits the process. Unless
/// the process exits that way, the pipeline is back in NULL on every
/// return path.
pub async fn run(spec: PipelineSpec, options: RunOptions) -> Result<RunOutcome, PipelineError> {
    let events = EventBroadcaster::default();
    let printer = options
        .emit_events
        .then(|| spawn_event_printer(events.subscribe()));

    let result = run_pipeline(&spec, events, options.dot_file).await;

    // The channel closes once the manager and its broadcaster are gone
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    result
}

/// What the n-th Ctrl+C press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Send EOS and let muxers finalize
    Drain,
    /// End the status loop without waiting for EOS
    Stop,
    /// Leave the process without teardown
    Exit,
}

fn interrupt_action(presses: u32) -> InterruptAction {
    match presses {
        0 | 1 => InterruptAction::Drain,
        2 => InterruptAction::Stop,
        _ => InterruptAction::Exit,
    }
}

/// Ctrl+C listener registered before the pipeline exists, so a press during
/// construction is queued instead of killing the process.
struct CtrlC {
    #[cfg(unix)]
    inner: Option<tokio::signal::unix::Signal>,
    #[cfg(windows)]
    inner: Option<tokio::signal::windows::CtrlC>,
}

impl CtrlC {
    fn register() -> Self {
        #[cfg(unix)]
        let inner = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt());
        #[cfg(windows)]
        let inner = tokio::signal::windows::ctrl_c();

        let inner = inner
            .map_err(|e| warn!("Failed to listen for Ctrl+C: {}", e))
            .ok();
        Self { inner }
    }

    /// Resolves on the next press. Never resolves once the listener is gone.
    async fn recv(&mut self) {
        let Some(inner) = self.inner.as_mut() else {
            return std::future::pending().await;
        };
        if inner.recv().await.is_none() {
            self.inner = None;
            std::future::pending::<()>().await;
        }
    }
}

async fn run_pipeline(
    spec: &PipelineSpec,
    events: EventBroadcaster,
    dot_file: Option<PathBuf>,
) -> Result<RunOutcome, PipelineError> {
    let mut ctrl_c = CtrlC::register();

    let mut manager = PipelineManager::new(spec, events)?;
    manager.start()?;

    let control = manager.control_handle();
    let mut status_loop = tokio::task::spawn_blocking(move || {
        let outcome = manager.wait_for_completion();
        if let Some(path) = dot_file {
            write_dot_graph(&manager, &path);
        }
        if let Err(e) = manager.stop() {
            warn!("Failed to stop pipeline: {}", e);
        }
        outcome
    });

    let mut presses = 0;
    let joined = loop {
        tokio::select! {
            joined = &mut status_loop => break joined,
            _ = ctrl_c.recv() => {
                presses += 1;
                match interrupt_action(presses) {
                    InterruptAction::Drain if control.send_eos() => {
                        info!("Received Ctrl+C, sending end-of-stream (press again to stop immediately)...");
                    }
                    InterruptAction::Drain | InterruptAction::Stop => {
                        info!("Received Ctrl+C, stopping (press again to exit without cleanup)...");
                        if let Err(e) = control.interrupt() {
                            error!("Failed to interrupt pipeline: {}", e);
                        }
                    }
                    InterruptAction::Exit => {
                        error!("Received Ctrl+C during teardown, exiting now");
                        std::process::exit(EXIT_RUNTIME_FAILURE);
                    }
                }
            }
        }
    };

    Ok(joined.unwrap_or_else(|e| {
        error!("Status loop task failed: {}", e);
        RunOutcome::Failed {
            source: None,
            message: format!("status loop task failed: {}", e),
            debug: None,
        }
    }))
}

fn spawn_event_printer(mut rx: broadcast::Receiver<pipewright_types::PipelineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!("Failed to serialize event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event printer lagging, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn write_dot_graph(manager: &PipelineManager, path: &std::path::Path) {
    match std::fs::write(path, manager.generate_dot_graph()) {
        Ok(()) => info!("Wrote pipeline graph to {}", path.display()),
        Err(e) => warn!("Failed to write pipeline graph to {}: {}", path.display(), e),
    }
}

/// Entry point shared by the programs: load configuration, set up logging,
/// build the pipeline described by `build` and run it. Returns the exit code.
pub fn launch(args: &CommonArgs, build: impl FnOnce(&Config) -> PipelineSpec) -> i32 {
    match try_launch(args, build) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_SETUP_FAILURE
        }
    }
}

fn try_launch(
    args: &CommonArgs,
    build: impl FnOnce(&Config) -> PipelineSpec,
) -> anyhow::Result<i32> {
    let config = Config::from_figment(args.config.as_deref())?;
    let spec = build(&config);

    if args.print_spec {
        println!("{}", spec.to_json_pretty()?);
        return Ok(0);
    }

    // Held until the end of this function so buffered file logs are flushed
    let _log_guard = logging::init(&config.logging)?;

    gst::init()?;
    info!("GStreamer initialized");

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(spec, RunOptions::from(args)));

    match &result {
        Ok(RunOutcome::EndOfStream) => info!("End-Of-Stream reached."),
        Ok(RunOutcome::Interrupted) => info!("Interrupted."),
        Ok(RunOutcome::Failed { source, message, .. }) => eprintln!(
            "Error received from element {}: {}",
            source.as_deref().unwrap_or("<unknown>"),
            message
        ),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
        }
    }

    Ok(exit_code(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_types::StageSpec;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Ok(RunOutcome::EndOfStream)), 0);
        assert_eq!(exit_code(&Ok(RunOutcome::Interrupted)), 0);
        assert_eq!(
            exit_code(&Ok(RunOutcome::Failed {
                source: Some("file-source".into()),
                message: "Resource not found.".into(),
                debug: None,
            })),
            1
        );
        assert_eq!(
            exit_code(&Err(PipelineError::ElementNotFound("x".into()))),
            -1
        );
        assert_eq!(
            exit_code(&Err(PipelineError::ElementFailed {
                element: Some("file-source".into()),
                message: "Resource not found.".into(),
                debug: None,
            })),
            1
        );
    }

    #[test]
    fn test_interrupt_escalation() {
        assert_eq!(interrupt_action(1), InterruptAction::Drain);
        assert_eq!(interrupt_action(2), InterruptAction::Stop);
        assert_eq!(interrupt_action(3), InterruptAction::Exit);
        assert_eq!(interrupt_action(7), InterruptAction::Exit);
    }

    #[tokio::test]
    async fn test_run_reaches_eos() {
        gst::init().unwrap();
        let spec = PipelineSpec::new("runner-eos")
            .stage(StageSpec::new("src", "fakesrc").property("num-buffers", 10))
            .stage(StageSpec::new("sink", "fakesink"))
            .link("src", "sink");

        let result = run(spec, RunOptions::default()).await;
        assert_eq!(result.unwrap(), RunOutcome::EndOfStream);
    }

    #[tokio::test]
    async fn test_run_setup_failure() {
        gst::init().unwrap();
        let spec = PipelineSpec::new("runner-bad")
            .stage(StageSpec::new("src", "nonexistentelement"));

        let result = run(spec, RunOptions::default()).await;
        assert!(matches!(result, Err(PipelineError::ElementCreation { .. })));
        assert_eq!(exit_code(&result), EXIT_SETUP_FAILURE);
    }

    #[tokio::test]
    async fn test_run_writes_dot_graph() {
        gst::init().unwrap();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dot = temp_dir.path().join("graph.dot");
        let spec = PipelineSpec::new("runner-dot")
            .stage(StageSpec::new("src", "fakesrc").property("num-buffers", 1))
            .stage(StageSpec::new("sink", "fakesink"))
            .link("src", "sink");

        let options = RunOptions {
            emit_events: false,
            dot_file: Some(dot.clone()),
        };
        run(spec, options).await.unwrap();

        let graph = std::fs::read_to_string(dot).unwrap();
        assert!(graph.contains("digraph"));
    }
}
