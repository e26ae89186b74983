//! A2A agent card, served as `.well-known/agent.json` by the hosting layer.

use dispatch::{ToolDescriptor, ToolRegistry};
use serde::Serialize;

use crate::config::AgentConfig;

const TEXT_MODE: &str = "text/plain";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub capabilities: AgentCapabilities,
    pub skills: Vec<AgentSkill>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    pub streaming: bool,
    pub push_notifications: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
}

impl From<&ToolDescriptor> for AgentSkill {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            id: tool.name().to_string(),
            name: title_case(tool.name()),
            description: tool.description().to_string(),
            tags: tool.tags().to_vec(),
            examples: tool.examples().to_vec(),
        }
    }
}

/// Build the card for this agent: one skill per registered tool.
pub fn build_agent_card(agent: &AgentConfig, registry: &ToolRegistry) -> AgentCard {
    AgentCard {
        name: agent.name.clone(),
        description: agent.description.clone(),
        url: format!("http://{}:{}/", agent.host, agent.port),
        version: agent.version.clone(),
        default_input_modes: vec![TEXT_MODE.to_string()],
        default_output_modes: vec![TEXT_MODE.to_string()],
        capabilities: AgentCapabilities::default(),
        skills: registry.tools().map(AgentSkill::from).collect(),
    }
}

/// `web_search` -> `Web Search`.
fn title_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
