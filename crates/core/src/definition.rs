//! Agent and action-group definitions, and the lookup the loop resolves them with.
//!
//! Definitions are plain data: they describe what an agent is (model,
//! instruction, which action groups it may call) and what each action group
//! offers. They are immutable once looked up for an invocation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An inline agent: model, instruction and the action groups it may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Lookup key; filled from the config table key when loaded from TOML
    #[serde(default)]
    pub name: String,

    /// System instruction sent with every turn
    pub instruction: String,

    /// Foundation model identifier. `None` means "use the invoker default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foundation_model: Option<String>,

    /// Names of the action groups this agent may call
    #[serde(default)]
    pub action_groups: BTreeSet<String>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            foundation_model: None,
            action_groups: BTreeSet::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.foundation_model = Some(model.into());
        self
    }

    pub fn with_action_group(mut self, name: impl Into<String>) -> Self {
        self.action_groups.insert(name.into());
        self
    }
}

/// A named set of callable functions exposed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionGroupDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Function name → spec
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSpec>,
}

impl ActionGroupDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            functions: BTreeMap::new(),
        }
    }

    pub fn with_function(mut self, name: impl Into<String>, spec: FunctionSpec) -> Self {
        self.functions.insert(name.into(), spec);
        self
    }
}

/// Description and parameter schema of one function.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionSpec {
    #[serde(default)]
    pub description: String,

    /// Parameter name → spec
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
}

impl FunctionSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: ParameterType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: false,
        }
    }
}

/// Primitive parameter types understood by the agent service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
        };
        f.write_str(s)
    }
}

/// Resolves agent and action-group definitions by name.
///
/// The loop calls this once per invocation, before any network traffic.
pub trait DefinitionLookup: Send + Sync {
    fn agent(&self, name: &str) -> Option<AgentDefinition>;

    fn action_group(&self, name: &str) -> Option<ActionGroupDefinition>;
}

/// In-memory definition store.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    agents: BTreeMap<String, AgentDefinition>,
    action_groups: BTreeMap<String, ActionGroupDefinition>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Replaces any existing agent with the same name.
    pub fn register_agent(&mut self, agent: AgentDefinition) {
        self.agents.insert(agent.name.clone(), agent);
    }

    /// Register an action group. Replaces any existing group with the same name.
    pub fn register_action_group(&mut self, group: ActionGroupDefinition) {
        self.action_groups.insert(group.name.clone(), group);
    }

    /// Register an action group only if no group with that name exists yet.
    pub fn register_action_group_if_absent(&mut self, group: ActionGroupDefinition) {
        self.action_groups.entry(group.name.clone()).or_insert(group);
    }

    /// All agents, ordered by name.
    pub fn agents(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    /// All action groups, ordered by name.
    pub fn action_groups(&self) -> impl Iterator<Item = &ActionGroupDefinition> {
        self.action_groups.values()
    }
}

impl DefinitionLookup for DefinitionRegistry {
    fn agent(&self, name: &str) -> Option<AgentDefinition> {
        self.agents.get(name).cloned()
    }

    fn action_group(&self, name: &str) -> Option<ActionGroupDefinition> {
        self.action_groups.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = DefinitionRegistry::new();
        registry.register_agent(AgentDefinition::new("assistant", "Be helpful"));
        registry.register_action_group(ActionGroupDefinition::new("clock", "Time functions"));

        assert!(registry.agent("assistant").is_some());
        assert!(registry.agent("nonexistent").is_none());
        assert!(registry.action_group("clock").is_some());
        assert!(registry.action_group("weather").is_none());
    }

    #[test]
    fn register_if_absent_keeps_existing() {
        let mut registry = DefinitionRegistry::new();
        registry.register_action_group(ActionGroupDefinition::new("clock", "custom"));
        registry.register_action_group_if_absent(ActionGroupDefinition::new("clock", "builtin"));
        assert_eq!(registry.action_group("clock").unwrap().description, "custom");
    }

    #[test]
    fn parameter_type_serializes_lowercase() {
        let spec = ParameterSpec::required(ParameterType::Integer, "How many");
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains(r#""type":"integer""#));
        assert!(json.contains(r#""required":true"#));
        assert_eq!(ParameterType::Boolean.to_string(), "boolean");
    }

    #[test]
    fn agent_builder_collects_action_groups() {
        let agent = AgentDefinition::new("a", "i")
            .with_model("model-x")
            .with_action_group("clock")
            .with_action_group("clock");
        assert_eq!(agent.foundation_model.as_deref(), Some("model-x"));
        assert_eq!(agent.action_groups.len(), 1);
    }
}
