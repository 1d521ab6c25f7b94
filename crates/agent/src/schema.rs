//! Action-group schema translation.
//!
//! Turns config-level [`ActionGroupDefinition`]s into the wire-level
//! [`AgentActionGroup`] the agent service expects. Every action group is
//! sent with the return-control executor: functions always run locally.

use handback_core::client::{
    ActionGroupExecutor, AgentActionGroup, FunctionDefinition, FunctionSchema, ParameterDetail,
};
use handback_core::definition::{ActionGroupDefinition, AgentDefinition, DefinitionLookup};
use handback_core::error::{Error, Result};

/// Translate one action group. Pure; functions come out in name order.
pub fn build_action_group(group: &ActionGroupDefinition) -> AgentActionGroup {
    let functions = group
        .functions
        .iter()
        .map(|(name, spec)| FunctionDefinition {
            name: name.clone(),
            description: spec.description.clone(),
            parameters: spec
                .parameters
                .iter()
                .map(|(param, detail)| {
                    (
                        param.clone(),
                        ParameterDetail {
                            kind: detail.kind,
                            description: detail.description.clone(),
                            required: detail.required,
                        },
                    )
                })
                .collect(),
        })
        .collect();

    AgentActionGroup {
        action_group_name: group.name.clone(),
        description: group.description.clone(),
        action_group_executor: ActionGroupExecutor::return_control(),
        function_schema: FunctionSchema { functions },
    }
}

/// Look up and translate every action group the agent references.
///
/// Fails on the first name the lookup cannot satisfy.
pub fn resolve_action_groups(
    lookup: &dyn DefinitionLookup,
    agent: &AgentDefinition,
) -> Result<Vec<AgentActionGroup>> {
    agent
        .action_groups
        .iter()
        .map(|name| {
            lookup
                .action_group(name)
                .map(|group| build_action_group(&group))
                .ok_or_else(|| Error::ActionGroupNotFound {
                    agent: agent.name.clone(),
                    action_group: name.clone(),
                })
        })
        .collect()
}
