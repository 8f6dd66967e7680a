//! Check command implementation.

use anyhow::{Context, Result};
use donotmock_core::{Analyzer, Config};
use donotmock_csharp::CSharpFrontEnd;
use std::path::Path;

use crate::OutputFormat;

/// Runs the check command, returning whether any error was reported.
pub fn run(
    path: &Path,
    format: OutputFormat,
    exclude: Vec<String>,
    config: Config,
) -> Result<bool> {
    let analyzer = Analyzer::builder()
        .root(path)
        .config(config)
        .front_end(CSharpFrontEnd::new())
        .excludes(exclude)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} signatures",
        analyzer.root().display(),
        analyzer.registry().len()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, analyzer.base_dir(), format)?;

    Ok(result.has_errors())
}
