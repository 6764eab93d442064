use std::io::Write;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;
use crate::linter::LintResult;

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: JsonMetadata,
    offenses: Vec<JsonOffense<'a>>,
}

#[derive(Serialize)]
struct JsonMetadata {
    files_inspected: usize,
    offense_count: usize,
    corrected_count: usize,
}

#[derive(Serialize)]
struct JsonOffense<'a> {
    path: &'a str,
    line: usize,
    column: usize,
    severity: String,
    cop_name: &'a str,
    message: &'a str,
}

impl<'a> JsonOffense<'a> {
    fn from_diagnostic(d: &'a Diagnostic) -> Self {
        Self {
            path: &d.path,
            line: d.location.line,
            column: d.location.column,
            severity: d.severity.letter().to_string(),
            cop_name: &d.cop_name,
            message: &d.message,
        }
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_to(&self, result: &LintResult, out: &mut dyn Write) {
        let report = JsonReport {
            metadata: JsonMetadata {
                files_inspected: result.file_count,
                offense_count: result.diagnostics.len(),
                corrected_count: result.corrected_count,
            },
            offenses: result
                .diagnostics
                .iter()
                .map(JsonOffense::from_diagnostic)
                .collect(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(e) => eprintln!("error: failed to serialize JSON output: {e}"),
        }
    }
}
