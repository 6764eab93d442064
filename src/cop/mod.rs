pub mod registry;
pub mod style;

use std::collections::HashMap;

use crate::correction::Correction;
use crate::diagnostic::{Diagnostic, Severity};
use crate::parse::source::SourceFile;

/// Per-cop configuration extracted from .asciicop.yml.
#[derive(Debug, Clone)]
pub struct CopConfig {
    pub enabled: bool,
    pub severity: Option<Severity>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub options: HashMap<String, serde_yml::Value>,
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            exclude: Vec::new(),
            include: Vec::new(),
            options: HashMap::new(),
        }
    }
}

impl CopConfig {
    /// Look up a string option (e.g. a policy key).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}

/// A lint rule. Implementations must be Send + Sync so they can be shared
/// across rayon worker threads.
pub trait Cop: Send + Sync {
    /// The fully-qualified cop name, e.g. "Style/NonAscii".
    fn name(&self) -> &'static str;

    fn default_severity(&self) -> Severity {
        Severity::Convention
    }

    /// Whether the cop can emit corrections.
    fn supports_autocorrect(&self) -> bool {
        false
    }

    /// Whole-file check over the parsed source. Corrections are collected
    /// only when the caller passes a sink (autocorrect mode).
    #[allow(unused_variables)]
    fn check_source(
        &self,
        source: &SourceFile,
        parse_result: &ruby_prism::ParseResult<'_>,
        config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        corrections: Option<&mut Vec<Correction>>,
    ) {
    }

    /// Build a diagnostic for this cop at a byte offset in the source.
    fn diagnostic(
        &self,
        source: &SourceFile,
        offset: usize,
        config: &CopConfig,
        message: String,
    ) -> Diagnostic {
        Diagnostic {
            path: source.path_str().to_string(),
            location: source.location_at(offset),
            severity: config.severity.unwrap_or_else(|| self.default_severity()),
            cop_name: self.name().to_string(),
            message,
        }
    }
}
