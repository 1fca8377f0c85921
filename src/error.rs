use std::time::Duration;
use thiserror::Error;

/// Failures raised by tool invocations, API queries and output handling.
///
/// Every variant is recoverable at the stage level: aggregators record the
/// error against the source, host or category that produced it and carry on.
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("{tool} exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    ToolFailure {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{source_name} request failed: {reason}")]
    Network { source_name: String, reason: String },

    #[error("could not parse {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconError {
    pub fn network(source_name: &str, reason: impl ToString) -> Self {
        Self::Network { source_name: source_name.to_string(), reason: reason.to_string() }
    }

    pub fn parse(context: &str, reason: impl ToString) -> Self {
        Self::Parse { context: context.to_string(), reason: reason.to_string() }
    }
}

pub type ReconResult<T> = Result<T, ReconError>;
