pub mod json;
pub mod text;

use std::io::Write;

use crate::linter::LintResult;

pub trait Formatter {
    fn format_to(&self, result: &LintResult, out: &mut dyn Write);

    fn print(&self, result: &LintResult) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(result, &mut lock);
    }
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter),
    }
}
