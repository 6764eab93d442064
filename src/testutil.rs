use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::Diagnostic;
use crate::parse::parse_source;
use crate::parse::source::SourceFile;

/// An expected offense parsed from a fixture annotation.
#[derive(Debug, Clone)]
pub struct ExpectedOffense {
    pub line: usize,
    pub column: usize,
    pub cop_name: String,
    pub message: String,
}

struct RawAnnotation {
    column: usize,
    cop_name: String,
    message: String,
}

/// Try to parse an annotation line.
///
/// Annotation format: optional leading whitespace, then one or more `^`
/// characters, then a space, then `Department/CopName: Message`.
///
/// The column of the offense is the byte position of the first `^` in the
/// line. Lines that merely contain `^` in other contexts (Ruby XOR, carets
/// in strings) don't qualify: the caret must be the first non-whitespace
/// character and the name must contain `/` followed by `: `.
fn try_parse_annotation(line: &str) -> Option<RawAnnotation> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('^') {
        return None;
    }

    let caret_count = trimmed.bytes().take_while(|&b| b == b'^').count();
    let after_carets = &trimmed[caret_count..];
    if !after_carets.starts_with(' ') {
        return None;
    }

    let rest = after_carets[1..].trim_end();
    let colon_space = rest.find(": ")?;
    let cop_name = &rest[..colon_space];
    let message = &rest[colon_space + 2..];

    if !cop_name.contains('/') {
        return None;
    }

    let column = line.len() - trimmed.len();

    Some(RawAnnotation {
        column,
        cop_name: cop_name.to_string(),
        message: message.to_string(),
    })
}

/// Parse fixture content into clean source bytes and expected offenses.
///
/// Annotation lines are stripped from the source; line numbers in expected
/// offenses refer to the clean source (1-indexed). Annotations must appear
/// *after* the source line they reference.
///
/// # Panics
///
/// Panics if an annotation appears before any source line.
pub fn parse_fixture(raw: &[u8]) -> (Vec<u8>, Vec<ExpectedOffense>) {
    let text = std::str::from_utf8(raw).expect("fixture must be valid UTF-8");
    let elements: Vec<&str> = text.split('\n').collect();

    let mut source_lines: Vec<&str> = Vec::new();
    let mut expected: Vec<ExpectedOffense> = Vec::new();

    for (raw_idx, element) in elements.iter().enumerate() {
        if let Some(annotation) = try_parse_annotation(element) {
            assert!(
                !source_lines.is_empty(),
                "Annotation on raw line {} appears before any source line. \
                 Annotations must follow the source line they reference.\n\
                 Line: {:?}",
                raw_idx + 1,
                element,
            );
            let source_line_number = source_lines.len(); // 1-indexed
            expected.push(ExpectedOffense {
                line: source_line_number,
                column: annotation.column,
                cop_name: annotation.cop_name,
                message: annotation.message,
            });
        } else {
            source_lines.push(element);
        }
    }

    let clean = source_lines.join("\n");
    (clean.into_bytes(), expected)
}

/// Run a cop on raw source bytes and return the diagnostics.
pub fn run_cop(cop: &dyn Cop, source_bytes: &[u8]) -> Vec<Diagnostic> {
    run_cop_with_config(cop, source_bytes, CopConfig::default())
}

/// Run a cop on raw source bytes with a specific config and return diagnostics.
pub fn run_cop_with_config(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> Vec<Diagnostic> {
    let (diagnostics, _) = run_cop_full_with_config(cop, source_bytes, config);
    diagnostics
}

/// Run a cop and also collect its proposed corrections.
pub fn run_cop_with_corrections(
    cop: &dyn Cop,
    source_bytes: &[u8],
) -> (Vec<Diagnostic>, Vec<Correction>) {
    run_cop_full_with_config(cop, source_bytes, CopConfig::default())
}

/// Run a cop with a specific config, collecting diagnostics and corrections.
pub fn run_cop_full_with_config(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> (Vec<Diagnostic>, Vec<Correction>) {
    let source = SourceFile::from_bytes("test.rb", source_bytes.to_vec());
    let parse_result = parse_source(source.as_bytes());
    let mut diagnostics = Vec::new();
    let mut corrections = Vec::new();
    cop.check_source(
        &source,
        &parse_result,
        &config,
        &mut diagnostics,
        Some(&mut corrections),
    );
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    (diagnostics, corrections)
}

/// Run a cop on fixture bytes (with annotations) and assert offenses match.
pub fn assert_cop_offenses(cop: &dyn Cop, fixture_bytes: &[u8]) {
    assert_cop_offenses_with_config(cop, fixture_bytes, CopConfig::default());
}

/// Run a cop on fixture bytes with a specific config and assert offenses match.
///
/// Both expected and actual diagnostics are sorted by (line, column) before
/// comparison, so annotation order in the fixture doesn't need to match the
/// cop's emission order.
pub fn assert_cop_offenses_with_config(cop: &dyn Cop, fixture_bytes: &[u8], config: CopConfig) {
    let (clean_source, mut expected) = parse_fixture(fixture_bytes);
    let mut diagnostics = run_cop_with_config(cop, &clean_source, config);

    expected.sort_by_key(|e| (e.line, e.column));
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    assert_eq!(
        diagnostics.len(),
        expected.len(),
        "Expected {} offense(s) but got {}.\nExpected:\n{}\nActual:\n{}",
        expected.len(),
        diagnostics.len(),
        format_expected(&expected),
        format_diagnostics(&diagnostics),
    );

    for (i, (diag, exp)) in diagnostics.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            diag.location.line, exp.line,
            "Offense #{}: line mismatch (expected {} got {})\n  expected: {}:{} {}: {}\n  actual:   {d}",
            i + 1, exp.line, diag.location.line,
            exp.line, exp.column, exp.cop_name, exp.message,
            d = diag,
        );
        assert_eq!(
            diag.location.column, exp.column,
            "Offense #{}: column mismatch (expected {} got {})\n  expected: {}:{} {}: {}\n  actual:   {d}",
            i + 1, exp.column, diag.location.column,
            exp.line, exp.column, exp.cop_name, exp.message,
            d = diag,
        );
        assert_eq!(
            diag.cop_name, exp.cop_name,
            "Offense #{}: cop name mismatch\n  expected: {}\n  actual:   {}",
            i + 1, exp.cop_name, diag.cop_name,
        );
        assert_eq!(
            diag.message, exp.message,
            "Offense #{}: message mismatch for {}\n  expected: {:?}\n  actual:   {:?}",
            i + 1, exp.cop_name, exp.message, diag.message,
        );
    }
}

/// Assert a cop produces no offenses on the given source bytes.
pub fn assert_cop_no_offenses(cop: &dyn Cop, source_bytes: &[u8]) {
    assert_cop_no_offenses_with_config(cop, source_bytes, CopConfig::default());
}

/// Assert a cop produces no offenses on the given source bytes with a specific config.
pub fn assert_cop_no_offenses_with_config(cop: &dyn Cop, source_bytes: &[u8], config: CopConfig) {
    let diagnostics = run_cop_with_config(cop, source_bytes, config);

    assert!(
        diagnostics.is_empty(),
        "Expected no offenses but got {}:\n{}",
        diagnostics.len(),
        format_diagnostics(&diagnostics),
    );
}

fn format_expected(expected: &[ExpectedOffense]) -> String {
    expected
        .iter()
        .map(|e| format!("  {}:{} {}: {}", e.line, e.column, e.cop_name, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Annotation parser unit tests ----

    #[test]
    fn parse_annotation_with_carets() {
        let ann = try_parse_annotation("     ^^^ Style/NonAscii: some message").unwrap();
        assert_eq!(ann.column, 5);
        assert_eq!(ann.cop_name, "Style/NonAscii");
        assert_eq!(ann.message, "some message");
    }

    #[test]
    fn parse_annotation_at_column_zero() {
        let ann = try_parse_annotation("^^^ Style/Bar: msg").unwrap();
        assert_eq!(ann.column, 0);
        assert_eq!(ann.cop_name, "Style/Bar");
        assert_eq!(ann.message, "msg");
    }

    #[test]
    fn parse_annotation_single_caret() {
        let ann = try_parse_annotation("^ Style/X: m").unwrap();
        assert_eq!(ann.column, 0);
        assert_eq!(ann.message, "m");
    }

    #[test]
    fn parse_annotation_message_with_quotes() {
        let ann =
            try_parse_annotation("^^^ Style/NonAscii: use escape sequence \"\\u{e9}\"").unwrap();
        assert_eq!(ann.message, "use escape sequence \"\\u{e9}\"");
    }

    // ---- False-positive rejection tests ----

    #[test]
    fn rejects_non_annotation_lines() {
        assert!(try_parse_annotation("x = 1").is_none());
        assert!(try_parse_annotation("# just a comment").is_none());
        assert!(try_parse_annotation("").is_none());
        assert!(try_parse_annotation("   ").is_none());
    }

    #[test]
    fn rejects_ruby_xor_operator() {
        assert!(try_parse_annotation("x ^ y").is_none());
        assert!(try_parse_annotation("result = a ^ b").is_none());
    }

    #[test]
    fn rejects_carets_without_cop_name() {
        assert!(try_parse_annotation("^^^ no slash here").is_none());
        assert!(try_parse_annotation("^^^ justtext").is_none());
    }

    #[test]
    fn rejects_carets_without_space_after() {
        assert!(try_parse_annotation("^^^Style/Foo: msg").is_none());
    }

    #[test]
    fn rejects_carets_without_colon_space() {
        assert!(try_parse_annotation("^^^ Style/Foo msg").is_none());
        assert!(try_parse_annotation("^^^ Style/Foo:msg").is_none());
    }

    #[test]
    fn rejects_caret_in_string() {
        assert!(try_parse_annotation("  puts \"^hello\"").is_none());
    }

    // ---- parse_fixture tests ----

    #[test]
    fn parse_fixture_strips_annotations() {
        let raw = b"x = 1\n     ^^^ Style/Foo: msg\ny = 2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"x = 1\ny = 2\n");
        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].line, 1);
        assert_eq!(expected[0].column, 5);
        assert_eq!(expected[0].cop_name, "Style/Foo");
        assert_eq!(expected[0].message, "msg");
    }

    #[test]
    fn parse_fixture_multiple_annotations_same_line() {
        let raw = b"line1\n^^^ A/B: m1\n  ^^^ C/D: m2\nline2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"line1\nline2\n");
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].line, 1);
        assert_eq!(expected[0].column, 0);
        assert_eq!(expected[1].line, 1);
        assert_eq!(expected[1].column, 2);
    }

    #[test]
    fn parse_fixture_annotations_on_different_lines() {
        let raw = b"line1\n     ^^^ A/B: m1\nline2\n  ^^^ C/D: m2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"line1\nline2\n");
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].line, 1);
        assert_eq!(expected[1].line, 2);
    }

    #[test]
    fn parse_fixture_no_annotations() {
        let raw = b"x = 1\ny = 2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"x = 1\ny = 2\n");
        assert!(expected.is_empty());
    }

    #[test]
    fn parse_fixture_preserves_non_ascii_source() {
        let raw = "s = \"caf\u{e9}\"\n        ^ A/B: m\n".as_bytes();
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, "s = \"caf\u{e9}\"\n".as_bytes());
        assert_eq!(expected[0].column, 8);
    }

    #[test]
    #[should_panic(expected = "Annotation on raw line 1 appears before any source line")]
    fn parse_fixture_annotation_before_source_panics() {
        let raw = b"^^^ A/B: should panic\nx = 1\n";
        parse_fixture(raw);
    }

    // ---- run_cop helper tests ----

    #[test]
    fn run_cop_returns_sorted_diagnostics() {
        use crate::cop::style::non_ascii::NonAscii;
        let diags = run_cop(&NonAscii, "b = \"\u{e9}\"\na = \"\u{e9}\"\n".as_bytes());
        assert_eq!(diags.len(), 2);
        assert!(diags[0].location.line < diags[1].location.line);
    }

    #[test]
    fn run_cop_no_offenses_returns_empty() {
        use crate::cop::style::non_ascii::NonAscii;
        let diags = run_cop(&NonAscii, b"x = 1\ny = 2\n");
        assert!(diags.is_empty());
    }
}
