//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# donotmock configuration

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./tests"

# Glob patterns to exclude from analysis
exclude = [
    "**/bin/**",
    "**/obj/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: one per CPU)
# parallelism = 4

# Abort instead of skipping files that fail to parse
fail_on_parse_error = false

# The attribute that marks a type as not mockable
[marker]
name = "DoNotMockAttribute"
namespace = "DoNotMock"

[registry]
# Moq, NSubstitute, FakeItEasy, JustMock and Rhino Mocks
builtins = true

# Additional mock-creation shapes
# [[registry.signatures]]
# library = "Acme.Fakes"
# category = "call"        # "construction" or "call"
# container = "Fakes"
# namespace = "Acme.Testing"
# method = "Create"
# arity = 1
# subject_index = 0
"#;

/// Config file name written by `init`.
const CONFIG_NAME: &str = "donotmock.toml";

/// Runs the init command in `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to set the marker and extra signatures");
    println!("  2. Run: donotmock check");

    Ok(())
}
