//! Built-in tools, enabled by name from `agent.tools`.

pub mod calculator;
pub mod sample;

use dispatch::{ConfigError, ToolDescriptor, ToolRegistry};

/// Names accepted in `agent.tools`.
pub const AVAILABLE: &[&str] = &[calculator::NAME, sample::ECHO, sample::DATA];

fn lookup(name: &str) -> Option<ToolDescriptor> {
    match name {
        calculator::NAME => Some(calculator::descriptor()),
        sample::ECHO => Some(sample::echo()),
        sample::DATA => Some(sample::data()),
        _ => None,
    }
}

/// Build the registry from configured tool names, keeping their order.
pub fn registry(names: &[String]) -> Result<ToolRegistry, ConfigError> {
    let mut registry = ToolRegistry::new();
    for name in names {
        let tool = lookup(name).ok_or_else(|| ConfigError::UnknownTool(name.clone()))?;
        registry.register(tool)?;
    }
    Ok(registry)
}
