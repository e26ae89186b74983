//! Tool descriptors.

use std::fmt;
use std::sync::Arc;

use crate::ToolError;

/// A callable tool.
///
/// Implementations must be safe to call from several requests at once.
/// Closures of the right shape implement this automatically.
pub trait Tool: Send + Sync {
    /// Run the tool on the extracted request input.
    fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

impl<F> Tool for F
where
    F: Fn(&str) -> Result<String, ToolError> + Send + Sync,
{
    fn invoke(&self, input: &str) -> Result<String, ToolError> {
        self(input)
    }
}

/// A named tool plus the metadata used to route requests to it.
///
/// Immutable once built; clones share the underlying tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    tags: Vec<String>,
    examples: Vec<String>,
    tool: Arc<dyn Tool>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        tool: impl Tool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
            tool: Arc::new(tool),
        }
    }

    /// Set the trigger tags, in order.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set sample utterances, published as skill examples on the agent card.
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Call the tool directly, without any dispatch bookkeeping.
    pub fn invoke(&self, input: &str) -> Result<String, ToolError> {
        self.tool.invoke(input)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tags", &self.tags)
            .field("examples", &self.examples)
            .finish_non_exhaustive()
    }
}
