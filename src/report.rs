//! Rendering findings for terminals and machine consumers.

use std::path::PathBuf;

use ahash::AHashSet;

use crate::aggregate::Finding;
use crate::error::{LintError, Result};

/// Formats findings as grep-style lines plus a one-line summary.
///
/// One line per finding: `path:line: in function: message [symbol]`.
pub fn render_text(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No injection misuses found.\n".to_string();
    }

    let mut output = String::new();
    for finding in findings {
        output.push_str(&format!(
            "{}:{}: in {}: {} [{}]\n",
            finding.file.display(),
            finding.violation.line,
            finding.violation.function,
            finding.violation.kind.message(),
            finding.violation.symbol,
        ));
    }

    let files: AHashSet<_> = findings.iter().map(|f| &f.file).collect();
    output.push_str(&format!(
        "\n{} issue(s) in {} file(s)\n",
        findings.len(),
        files.len()
    ));
    output
}

/// Serializes findings as a pretty-printed JSON array.
pub fn render_json(findings: &[Finding]) -> Result<String> {
    serde_json::to_string_pretty(findings).map_err(|e| LintError::ReportFailure {
        message: e.to_string(),
    })
}

/// Formats discovered file paths, one per line.
pub fn render_paths_text(paths: &[PathBuf]) -> String {
    let mut output = String::new();
    for path in paths {
        output.push_str(&format!("{}\n", path.display()));
    }
    output
}

/// Serializes discovered file paths as a JSON array.
pub fn render_paths_json(paths: &[PathBuf]) -> Result<String> {
    serde_json::to_string_pretty(paths).map_err(|e| LintError::ReportFailure {
        message: e.to_string(),
    })
}
