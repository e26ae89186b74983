//! Tool registry.

use std::collections::HashMap;

use crate::matcher::Vocabulary;
use crate::{ConfigError, Result, ToolDescriptor};

/// A tool with its precomputed trigger vocabulary.
#[derive(Debug, Clone)]
pub(crate) struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub vocabulary: Vocabulary,
}

/// Named tools in registration order.
///
/// Built once at startup, then shared read-only (typically behind an `Arc`)
/// for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from tools in order, stopping at the first error.
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDescriptor>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool.
    ///
    /// The tool is validated in full before anything is stored, so on error
    /// the registry is unchanged.
    pub fn register(&mut self, tool: ToolDescriptor) -> Result<()> {
        if tool.name().trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.index.contains_key(tool.name()) {
            return Err(ConfigError::DuplicateTool(tool.name().to_string()));
        }

        let vocabulary = Vocabulary::for_tool(tool.tags(), tool.description());
        if vocabulary.is_empty() {
            return Err(ConfigError::NoTriggers(tool.name().to_string()));
        }

        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor: tool,
            vocabulary,
        });
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate tools in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub(crate) fn registered(&self) -> &[RegisteredTool] {
        &self.tools
    }
}
