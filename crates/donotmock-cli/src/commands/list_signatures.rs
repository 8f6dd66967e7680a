//! List signatures command implementation.

use anyhow::{Context, Result};
use donotmock_core::{Config, RULE_ID, RULE_NAME};

/// Runs the list-signatures command.
pub fn run(config: &Config) -> Result<()> {
    let registry = config
        .build_registry()
        .context("Invalid signature configuration")?;

    println!("{RULE_ID} {RULE_NAME}: marker {}.{}\n", config.marker.namespace, config.marker.name);
    println!(
        "{:<14} {:<13} {:<40} {:>5} Subject",
        "Library", "Kind", "Signature", "Arity"
    );
    println!("{}", "-".repeat(86));

    for signature in registry.iter() {
        println!(
            "{:<14} {:<13} {:<40} {:>5} #{}",
            signature.library,
            signature.category.to_string(),
            signature.display_name(),
            signature.arity,
            signature.subject.index()
        );
    }

    println!("\n{} signature(s)", registry.len());
    if !config.registry.builtins {
        println!("Built-in signatures are disabled ([registry] builtins = false)");
    }

    Ok(())
}
