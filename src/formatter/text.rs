use std::io::Write;

use crate::formatter::Formatter;
use crate::linter::LintResult;

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, result: &LintResult, out: &mut dyn Write) {
        for d in &result.diagnostics {
            let _ = writeln!(out, "{d}");
        }
        let offense_word = if result.diagnostics.len() == 1 {
            "offense"
        } else {
            "offenses"
        };
        let file_word = if result.file_count == 1 {
            "file"
        } else {
            "files"
        };
        let corrected = if result.corrected_count > 0 {
            format!(", {} corrected", result.corrected_count)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "\n{} {} inspected, {} {} detected{}",
            result.file_count,
            file_word,
            result.diagnostics.len(),
            offense_word,
            corrected,
        );
    }
}
