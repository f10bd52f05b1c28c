//! Line-oriented command scripts for the demo driver.
//!
//! ```text
//! # comments and blank lines are skipped
//! begin Login {"user": "ada"}
//! ended Login
//! begin Share
//! cancel Share
//! handoff Dashboard Reports
//! end Reports
//! status
//! ```

use switchyard_types::{FlowData, FlowId};
use thiserror::Error;

use crate::demo::AppFlow;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ask the orchestrator to begin a flow.
    Begin {
        flow: AppFlow,
        data: Option<FlowData>,
    },
    /// Ask the orchestrator to end a flow directly.
    End(AppFlow),
    /// The flow's controller reports it finished normally.
    Ended(AppFlow),
    /// The flow's controller reports the user dismissed it.
    Cancel(AppFlow),
    /// `from`'s controller asks for `to` to begin.
    Handoff { from: AppFlow, to: AppFlow },
    Status,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: unknown flow `{name}` (expected one of {})", flow_names())]
    UnknownFlow { line: usize, name: String },
    #[error("line {line}: `{command}` expects {expected}")]
    Arity {
        line: usize,
        command: &'static str,
        expected: &'static str,
    },
    #[error("line {line}: payload is not valid JSON: {source}")]
    Payload {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn flow_names() -> String {
    AppFlow::ALL
        .iter()
        .map(|flow| flow.name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse(source: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        commands.push(parse_line(line, text)?);
    }
    Ok(commands)
}

fn parse_line(line: usize, text: &str) -> Result<Command, ScriptError> {
    let (word, rest) = split_word(text);
    match word {
        "begin" => {
            let (name, payload) = split_word(rest);
            if name.is_empty() {
                return Err(ScriptError::Arity {
                    line,
                    command: "begin",
                    expected: "a flow and an optional JSON payload",
                });
            }
            let flow = flow(line, name)?;
            let data = if payload.is_empty() {
                None
            } else {
                let value = serde_json::from_str(payload)
                    .map_err(|source| ScriptError::Payload { line, source })?;
                Some(FlowData::new(value))
            };
            Ok(Command::Begin { flow, data })
        }
        "end" => single(line, "end", rest).map(Command::End),
        "ended" => single(line, "ended", rest).map(Command::Ended),
        "cancel" => single(line, "cancel", rest).map(Command::Cancel),
        "handoff" => {
            let mut words = rest.split_whitespace();
            match (words.next(), words.next(), words.next()) {
                (Some(from), Some(to), None) => Ok(Command::Handoff {
                    from: flow(line, from)?,
                    to: flow(line, to)?,
                }),
                _ => Err(ScriptError::Arity {
                    line,
                    command: "handoff",
                    expected: "two flows",
                }),
            }
        }
        "status" if rest.is_empty() => Ok(Command::Status),
        "status" => Err(ScriptError::Arity {
            line,
            command: "status",
            expected: "no arguments",
        }),
        other => Err(ScriptError::UnknownCommand {
            line,
            command: other.to_string(),
        }),
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn single(line: usize, command: &'static str, rest: &str) -> Result<AppFlow, ScriptError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(name), None) => flow(line, name),
        _ => Err(ScriptError::Arity {
            line,
            command,
            expected: "exactly one flow",
        }),
    }
}

/// Accepts a bare variant name (any case) or a full `AppFlow::Name` id.
fn flow(line: usize, name: &str) -> Result<AppFlow, ScriptError> {
    let unknown = || ScriptError::UnknownFlow {
        line,
        name: name.to_string(),
    };
    if name.contains("::") {
        let id = FlowId::parse(name).map_err(|_| unknown())?;
        return AppFlow::try_from(&id).map_err(|_| unknown());
    }
    AppFlow::ALL
        .iter()
        .copied()
        .find(|flow| flow.name().eq_ignore_ascii_case(name))
        .ok_or_else(unknown)
}
