use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::config::context::CommandInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandGroup {
    Check,
    Refs,
    Resolve,
    Archive,
    Export,
}

impl CommandGroup {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Refs => "refs",
            Self::Resolve => "resolve",
            Self::Archive => "archive",
            Self::Export => "export",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

/// Uniform result envelope surfaced to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }
}

/// A user-actionable failure with structured details, carried through
/// `anyhow::Error` so orchestration code can still use `?`.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct ResolveUserError {
    pub(crate) message: String,
    pub(crate) details: Value,
}

impl ResolveUserError {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &Value {
        &self.details
    }
}

/// Convert a core result into an outcome so every failure still reaches
/// the caller as a `{status, message, details}` envelope.
pub(crate) fn outcome_from_result(
    result: anyhow::Result<ExecutionOutcome>,
) -> anyhow::Result<ExecutionOutcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(err) => Ok(outcome_from_error(err)),
    }
}

/// Demote an error to its outcome: user-actionable issues become
/// `UserError`, anything else an internal `Failure`.
#[must_use]
pub fn outcome_from_error(err: anyhow::Error) -> ExecutionOutcome {
    match err.downcast::<ResolveUserError>() {
        Ok(user) => {
            let details = user.details().clone();
            ExecutionOutcome::user_error(user.message(), details)
        }
        Err(err) => ExecutionOutcome::failure(
            format!("{err:#}"),
            json!({ "code": "GP799", "reason": "unexpected_failure" }),
        ),
    }
}

/// JSON envelope emitted by the CLI under `--json`.
#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome, code: i32) -> Value {
    json!({
        "command": info.name,
        "group": info.group.as_str(),
        "status": outcome.status,
        "message": outcome.message,
        "details": outcome.details,
        "code": code,
    })
}
