//! Tool dispatch for conversational agents.
//!
//! An agent receives free text and must either answer it directly or hand
//! it to exactly one of its registered tools. This crate makes that decision
//! explicit and total: every call to [`dispatch`] yields exactly one
//! [`DispatchResult`], whatever the tools do.
//!
//! # Overview
//!
//! - **[`ToolDescriptor`]**: a named [`Tool`] plus the description, tags and
//!   examples used for routing and advertising it.
//! - **[`ToolRegistry`]**: the tools an agent serves, built once at startup.
//!   Duplicate names are rejected with a [`ConfigError`].
//! - **[`Dispatcher`]**: runs the selection policy, invokes the chosen tool
//!   under a panic guard, and falls back to a [`Responder`] for direct
//!   answers.
//!
//! Selection is deterministic. A request goes to the first tool, in
//! registration order, whose tags (or, failing that, description words)
//! appear as whole words in the text. Otherwise it is answered directly.
//!
//! # Example
//!
//! ```
//! use dispatch::{dispatch, DispatchRequest, ToolDescriptor, ToolError, ToolRegistry};
//!
//! let upper = ToolDescriptor::new(
//!     "shout",
//!     "Uppercases text",
//!     |input: &str| -> Result<String, ToolError> { Ok(input.to_uppercase()) },
//! )
//! .with_tags(["shout"]);
//!
//! let registry = ToolRegistry::from_tools([upper])?;
//! let result = dispatch(&DispatchRequest::new("shout hello"), &registry);
//!
//! assert!(result.succeeded);
//! assert_eq!(result.used_tool.as_deref(), Some("shout"));
//! assert_eq!(result.reply_text, "HELLO");
//! # Ok::<(), dispatch::ConfigError>(())
//! ```
//!
//! # Logging
//!
//! Each dispatch emits one `tracing` event at target `dispatch` with the
//! fields `path`, `tool` and `succeeded`. Failed dispatches log at `warn` and
//! include the raw error, which is never placed in the reply text.

mod dispatcher;
mod error;
mod matcher;
mod registry;
mod responder;
mod tool;

pub use dispatcher::{
    DirectReason, DispatchPath, DispatchRequest, DispatchResult, Dispatcher, Selection, dispatch,
    select,
};
pub use error::{ConfigError, DispatchError, ResponderError, Result, ToolError};
pub use registry::ToolRegistry;
pub use responder::{PlaceholderResponder, Responder};
pub use tool::{Tool, ToolDescriptor};
