//! Built-in local functions for Handback.
//!
//! Functions are what the remote agent hands control back for. This crate
//! ships the `clock` action group and the policies that decide what happens
//! when a function fails.

pub mod clock;
pub mod policy;

use handback_core::definition::ActionGroupDefinition;
use handback_core::function::FunctionRegistry;

pub use clock::{Clock, GetDate, GetTime, CLOCK_ACTION_GROUP};
pub use policy::{ReportFailure, error_handler_for};

/// Create a registry with every built-in function.
pub fn default_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register(Box::new(GetDate::new(Clock::System)));
    registry.register(Box::new(GetTime::new(Clock::System)));
    registry
}

/// Action-group definitions for the built-in functions.
pub fn builtin_action_groups(registry: &FunctionRegistry) -> Vec<ActionGroupDefinition> {
    registry
        .action_group_definition(CLOCK_ACTION_GROUP, "Current date and time in UTC")
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_clock_functions() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec![(CLOCK_ACTION_GROUP, "getDate"), (CLOCK_ACTION_GROUP, "getTime")]
        );
    }

    #[test]
    fn builtin_groups_describe_registered_functions() {
        let registry = default_registry();
        let groups = builtin_action_groups(&registry);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "clock");
        assert_eq!(groups[0].functions.len(), 2);
    }
}
