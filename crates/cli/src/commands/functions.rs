//! `handback functions`: list built-in local functions.

use handback_functions::default_registry;

pub fn run() {
    let registry = default_registry();

    println!("Built-in functions");
    println!("==================");
    for (group, name) in registry.names() {
        let Some(function) = registry.get(group, name) else {
            continue;
        };
        let spec = function.spec();
        println!("  {group}/{name}");
        println!("    {}", spec.description);
        for (param, detail) in &spec.parameters {
            println!(
                "    - {param} ({}{}): {}",
                detail.kind,
                if detail.required { ", required" } else { "" },
                detail.description
            );
        }
    }
}
