//! Shared output formatting for analysis results.

use anyhow::Result;
use donotmock_core::{AnalysisResult, DiagnosticReport};
use std::path::Path;

use crate::OutputFormat;

/// Print analysis results in the specified format.
pub fn print(result: &AnalysisResult, root: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result, root),
    }
    Ok(())
}

fn print_text(result: &AnalysisResult) {
    for diagnostic in &result.diagnostics {
        println!(
            "{} {} at {}:{}:{}",
            diagnostic.rule_id,
            diagnostic.rule,
            diagnostic.location.file.display(),
            diagnostic.location.line,
            diagnostic.location.column,
        );
        println!("  \x1b[31merror\x1b[0m: {}", diagnostic.message);
        if let Some(suggestion) = &diagnostic.suggestion {
            println!("  = help: {}", suggestion.message);
        }
        println!();
    }

    let summary_color = if result.has_errors() {
        "\x1b[31m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s) in {} file(s), {} site(s) checked\x1b[0m",
        summary_color,
        result.error_count(),
        result.files_checked,
        result.nodes_evaluated
    );
}

fn print_json(result: &AnalysisResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &AnalysisResult) {
    for diagnostic in &result.diagnostics {
        println!("{}", diagnostic.format());
    }
}

fn print_pretty(result: &AnalysisResult, root: &Path) {
    print!("{}", render_pretty(result, root));
}

/// Renders every report and the summary as one block for a single stream.
fn render_pretty(result: &AnalysisResult, root: &Path) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        let path = root.join(&diagnostic.location.file);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                let report = miette::Report::new(DiagnosticReport::new(diagnostic, source));
                out.push_str(&format!("{report:?}\n"));
            }
            Err(e) => {
                tracing::warn!("Cannot read {} for rendering: {e}", path.display());
                out.push_str(&diagnostic.format());
                out.push('\n');
            }
        }
    }
    out.push_str(&format!(
        "Found {} error(s) in {} file(s)\n",
        result.error_count(),
        result.files_checked
    ));
    out
}
