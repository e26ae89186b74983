//! Dispatch error types.

use thiserror::Error;

/// Registry configuration errors.
///
/// These are the only errors that cross the dispatcher boundary. They surface
/// while the registry is being built at startup and should stop the agent
/// from serving traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A tool with this name is already registered.
    #[error("duplicate tool registration: {0}")]
    DuplicateTool(String),

    /// The tool name is empty or whitespace.
    #[error("tool name must not be empty")]
    EmptyName,

    /// The tool has neither tags nor a usable description, so nothing can
    /// ever route to it.
    #[error("tool `{0}` has no trigger vocabulary: add tags or a description")]
    NoTriggers(String),

    /// A tool was requested by name but is not known.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Errors raised by a tool's `invoke`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("tool panicked: {0}")]
    Panicked(String),
}

impl ToolError {
    /// A user-facing summary that names the tool but none of the error detail.
    pub fn summary(&self, tool: &str) -> String {
        match self {
            ToolError::InvalidInput(_) => format!(
                "Sorry, the {tool} tool couldn't make sense of that input. Please rephrase and try again."
            ),
            ToolError::Execution(_) | ToolError::Panicked(_) => {
                format!("Sorry, the {tool} tool failed to complete your request.")
            }
            ToolError::Unavailable(_) => {
                format!("Sorry, the {tool} tool is unavailable right now. Please try again later.")
            }
        }
    }
}

/// Errors from the direct-answer responder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
    #[error("responder unavailable: {0}")]
    Unavailable(String),
    #[error("responder API error: {0}")]
    Api(String),
    #[error("responder panicked: {0}")]
    Panicked(String),
}

/// Per-request failures.
///
/// Never returned from `dispatch`; they are folded into a failed
/// [`DispatchResult`](crate::DispatchResult) and kept there for the caller
/// to log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("tool `{tool}` failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("direct answer failed: {0}")]
    Responder(#[from] ResponderError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
