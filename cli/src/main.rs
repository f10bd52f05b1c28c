//! Switchyard CLI - scripted driver for the flow orchestrator.
//!
//! # Usage
//!
//! ```text
//! switchyard demo.flow        # run a script file
//! switchyard < demo.flow      # or read it from stdin
//! ```
//!
//! Each command is applied to an orchestrator wired with the sample
//! [`demo::AppFlow`] set, then the driver waits for the presenter to settle
//! before moving on:
//!
//! ```text
//! script::parse() -> Vec<Command> -> apply() -> Orchestrator::settle() -> ...
//!                                                          |
//!                                                          v
//!                                                  final slot snapshot
//! ```

mod demo;
mod script;

use anyhow::{Context, Result, bail};
use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{self, IsTerminal},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, fmt::writer::BoxMakeWriter, prelude::*};

use switchyard_engine::{
    DelegateHandle, FlowControllerDelegate, Orchestrator, Request, SwitchyardConfig,
};

use demo::{AppFlow, Switchboard};
use script::Command;

/// Where tracing output goes. Stdout carries the transition trace, so logs
/// never share it.
enum LogSink {
    File { path: PathBuf, file: File },
    Stderr,
}

impl LogSink {
    /// First writable of `<config dir>/logs/switchyard.log` and
    /// `./.switchyard/logs/switchyard.log`, else stderr.
    fn open(warnings: &mut Vec<String>) -> Self {
        let config_dir = SwitchyardConfig::path().and_then(|path| path.parent().map(Path::to_path_buf));
        for dir in config_dir.into_iter().chain([PathBuf::from(".switchyard")]) {
            let path = dir.join("logs").join("switchyard.log");
            match open_append(&path) {
                Ok(file) => return Self::File { path, file },
                Err(e) => warnings.push(format!("Cannot log to {}: {e}", path.display())),
            }
        }
        Self::Stderr
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let mut warnings = Vec::new();
    let (writer, ansi, log_path) = match LogSink::open(&mut warnings) {
        LogSink::File { path, file } => (BoxMakeWriter::new(Mutex::new(file)), false, Some(path)),
        LogSink::Stderr => (BoxMakeWriter::new(io::stderr), true, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(ansi).with_writer(writer))
        .with(filter)
        .init();

    if let Some(path) = log_path {
        tracing::info!(path = %path.display(), "Logging initialized");
    }
    for warning in warnings {
        tracing::warn!("{warning}");
    }
}

fn load_config() -> SwitchyardConfig {
    match SwitchyardConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(path = %err.path().display(), error = %err, "Using default config");
            eprintln!("warning: {err}; using defaults");
            SwitchyardConfig::default()
        }
    }
}

fn read_script(path: Option<PathBuf>) -> Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(&path)
            .with_context(|| format!("failed to read script {}", path.display()));
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("usage: switchyard [SCRIPT]  (or pipe a script on stdin)");
    }
    io::read_to_string(stdin).context("failed to read script from stdin")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let source = read_script(env::args_os().nth(1).map(PathBuf::from))?;
    let commands = script::parse(&source)?;

    let switchboard = Switchboard::default();
    let mut orchestrator = demo::orchestrator(&config, &switchboard);
    tracing::info!(
        commands = commands.len(),
        settings = ?orchestrator.settings(),
        "Running script"
    );

    for command in commands {
        apply(&mut orchestrator, &switchboard, command)?;
        orchestrator.settle().await;
    }
    print_status(&orchestrator)
}

fn apply(orchestrator: &mut Orchestrator, switchboard: &Switchboard, command: Command) -> Result<()> {
    match command {
        Command::Begin { flow, data } => orchestrator.submit(Request::begin(flow.into(), data)),
        Command::End(flow) => orchestrator.submit(Request::end(flow.into())),
        Command::Ended(flow) => raise(switchboard, flow, |delegate| delegate.ended(flow.into())),
        Command::Cancel(flow) => {
            raise(switchboard, flow, |delegate| delegate.canceled(flow.into()));
        }
        Command::Handoff { from, to } => {
            raise(switchboard, from, |delegate| delegate.begin(to.into(), None));
        }
        Command::Status => print_status(orchestrator)?,
    }
    Ok(())
}

/// Raises a delegate event on behalf of `flow`'s controller.
fn raise(switchboard: &Switchboard, flow: AppFlow, event: impl FnOnce(&DelegateHandle)) {
    match switchboard.delegate(flow) {
        Some(delegate) => event(&delegate),
        None => {
            tracing::warn!(%flow, "No controller has been built for this flow");
            println!("{:>8} {flow}: no controller yet", "skip");
        }
    }
}

fn print_status(orchestrator: &Orchestrator) -> Result<()> {
    let snapshot = serde_json::to_string_pretty(&orchestrator.snapshot())
        .context("failed to render slot snapshot")?;
    println!("{snapshot}");
    Ok(())
}
