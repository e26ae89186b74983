//! Direct-answer responders.

use crate::{DispatchRequest, ResponderError, ToolRegistry};

/// Produces a reply when no tool is selected.
///
/// This is where a language-model client plugs in. Implementations are
/// shared across concurrent dispatches.
pub trait Responder: Send + Sync {
    fn respond(
        &self,
        request: &DispatchRequest,
        registry: &ToolRegistry,
    ) -> Result<String, ResponderError>;
}

/// Canned replies; needs no model or network access.
///
/// With no tools registered it acknowledges the message. Otherwise it lists
/// what the agent can do so the user can rephrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResponder;

impl Responder for PlaceholderResponder {
    fn respond(
        &self,
        request: &DispatchRequest,
        registry: &ToolRegistry,
    ) -> Result<String, ResponderError> {
        let text = request.text.trim();
        if registry.is_empty() {
            return Ok(format!("I received your message: '{text}'."));
        }

        let mut reply = String::from("I have these tools available:\n");
        for tool in registry.tools() {
            if tool.description().is_empty() {
                reply.push_str(&format!("- {}\n", tool.name()));
            } else {
                reply.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            }
        }
        reply.push_str("Please specify what you'd like to do.");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ToolDescriptor, ToolError};

    #[test]
    fn acknowledges_without_tools() {
        let reply = PlaceholderResponder
            .respond(&DispatchRequest::new("  hello "), &ToolRegistry::new())
            .unwrap();
        assert_eq!(reply, "I received your message: 'hello'.");
    }

    #[test]
    fn lists_tools_in_order() {
        let noop = |_: &str| -> Result<String, ToolError> { Ok(String::new()) };
        let registry = ToolRegistry::from_tools([
            ToolDescriptor::new("calculator", "Evaluates arithmetic", noop).with_tags(["math"]),
            ToolDescriptor::new("echo", "", noop).with_tags(["echo"]),
        ])
        .unwrap();

        let reply = PlaceholderResponder
            .respond(&DispatchRequest::new("hi"), &registry)
            .unwrap();
        assert!(reply.contains("- calculator: Evaluates arithmetic\n- echo\n"));
        assert!(reply.ends_with("Please specify what you'd like to do."));
    }
}
