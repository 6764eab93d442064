use ruby_prism::Visit;

use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::Diagnostic;
use crate::parse::source::SourceFile;

/// Flags characters outside printable ASCII (plus TAB/LF/CR) and handles
/// them per syntactic context: comments, identifiers, string literals, and
/// template (interpolated) literals each get their own policy; anything
/// found outside those contexts is always rejected.
///
/// Policies per context: `always` allows, `never` rejects, `escaped`
/// rejects with a `\u{..}` escape-sequence autocorrection.
pub struct NonAscii;

const MISSED_SEED: &str = "whole-file scan must seed the pending pool before traversal";

/// One maximal run of disallowed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Problem {
    /// Byte offset into the source buffer.
    pos: usize,
    /// Run length in bytes.
    len: usize,
    /// The run's text, decoded for message and escape rendering.
    value: String,
}

/// Printable ASCII plus the whitespace bytes Ruby source is expected to use.
fn is_allowed_byte(b: u8) -> bool {
    matches!(b, 0x20..=0x7e | b'\t' | b'\n' | b'\r')
}

/// Scan `text` left to right for maximal runs of disallowed bytes.
/// Runs come out in ascending position order and are never empty.
/// `base` rebases positions when a slice is scanned in isolation.
fn scan_problems(text: &[u8], base: usize) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut i = 0;
    while i < text.len() {
        if is_allowed_byte(text[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < text.len() && !is_allowed_byte(text[i]) {
            i += 1;
        }
        problems.push(Problem {
            pos: base + start,
            len: i - start,
            value: String::from_utf8_lossy(&text[start..i]).into_owned(),
        });
    }
    problems
}

/// Canonical ASCII representation of a run: `\u{<hex>}` per code point,
/// concatenated in original order with no separators.
fn escape_unicode(raw: &str) -> String {
    let mut result = String::new();
    for c in raw.chars() {
        result.push_str(&format!("\\u{{{:x}}}", c as u32));
    }
    result
}

/// What to do with non-ASCII runs in one syntactic context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Allowed, no report.
    Always,
    /// Reported, no fix.
    Never,
    /// Reported with an escape-sequence fix.
    Escaped,
}

impl Policy {
    /// Unrecognized or missing values fall back to the key's own default,
    /// never to a global one.
    fn parse(value: Option<&str>, default: Policy) -> Policy {
        match value {
            Some("always") => Policy::Always,
            Some("never") => Policy::Never,
            Some("escaped") => Policy::Escaped,
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Comment,
    Identifier,
    String,
    Template,
    Unknown,
}

impl Context {
    fn noun(self) -> &'static str {
        match self {
            Context::Comment => "comments",
            Context::Identifier => "identifiers",
            Context::String => "string literals",
            Context::Template => "template literals",
            Context::Unknown => "unknown context",
        }
    }
}

/// Per-context dispositions, resolved once per file from the cop options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PolicyTable {
    comment: Policy,
    identifier: Policy,
    string: Policy,
    template: Policy,
}

impl PolicyTable {
    fn from_config(config: &CopConfig) -> Self {
        Self {
            comment: Policy::parse(config.get_str("Comment"), Policy::Always),
            identifier: Policy::parse(config.get_str("Identifier"), Policy::Never),
            string: Policy::parse(config.get_str("String"), Policy::Escaped),
            template: Policy::parse(config.get_str("Template"), Policy::Escaped),
        }
    }

    fn for_context(&self, context: Context) -> Policy {
        match context {
            Context::Comment => self.comment,
            Context::Identifier => self.identifier,
            Context::String => self.string,
            Context::Template => self.template,
            // Not configurable: unclaimed problems must never go silent.
            Context::Unknown => Policy::Never,
        }
    }
}

/// Problems found by the whole-file scan, pending attribution to a context.
/// Withdrawal removes on first claim, so traversal order decides ties.
#[derive(Debug)]
struct ProblemPool {
    pending: Vec<Problem>,
}

impl ProblemPool {
    fn seed(text: &[u8]) -> Self {
        Self {
            pending: scan_problems(text, 0),
        }
    }

    /// Withdraw every pending problem whose start position lies in
    /// [start, end). A run may extend past `end`; only its start matters.
    fn withdraw_starting_in(&mut self, start: usize, end: usize) -> Vec<Problem> {
        let mut claimed = Vec::new();
        self.pending.retain(|p| {
            if p.pos >= start && p.pos < end {
                claimed.push(p.clone());
                false
            } else {
                true
            }
        });
        claimed
    }

    fn drain_remaining(&mut self) -> Vec<Problem> {
        std::mem::take(&mut self.pending)
    }
}

struct NonAsciiWalker<'a, 'pr> {
    cop: &'a NonAscii,
    source: &'a SourceFile,
    parse_result: &'a ruby_prism::ParseResult<'pr>,
    config: &'a CopConfig,
    policy: PolicyTable,
    /// Seeded at the program root; claiming before that is a bug.
    pool: Option<ProblemPool>,
    diagnostics: Vec<Diagnostic>,
    corrections: Vec<Correction>,
}

impl NonAsciiWalker<'_, '_> {
    fn claim_range(&mut self, start: usize, end: usize, context: Context) {
        let claimed = self
            .pool
            .as_mut()
            .expect(MISSED_SEED)
            .withdraw_starting_in(start, end);
        for problem in claimed {
            self.dispose(problem, context);
        }
    }

    /// Comment ranges claim inclusively on both bounds. Each comment is
    /// rescanned in isolation and the results rebased to absolute offsets,
    /// so the reported runs always lie within the comment's own slice.
    fn handle_comments(&mut self) {
        for comment in self.parse_result.comments() {
            let loc = comment.location();
            let (start, end) = (loc.start_offset(), loc.end_offset());
            let local = scan_problems(&self.source.as_bytes()[start..end], start);
            self.pool
                .as_mut()
                .expect(MISSED_SEED)
                .withdraw_starting_in(start, end + 1);
            for problem in local {
                self.dispose(problem, Context::Comment);
            }
        }
    }

    fn dispose(&mut self, problem: Problem, context: Context) {
        match self.policy.for_context(context) {
            Policy::Always => {}
            Policy::Never => self.reject(problem, context),
            Policy::Escaped => self.reject_with_fix(problem, context),
        }
    }

    fn reject(&mut self, problem: Problem, context: Context) {
        self.diagnostics.push(self.cop.diagnostic(
            self.source,
            problem.pos,
            self.config,
            format!("non-ASCII characters in {} are disallowed", context.noun()),
        ));
    }

    fn reject_with_fix(&mut self, problem: Problem, context: Context) {
        let escaped = escape_unicode(&problem.value);
        self.diagnostics.push(self.cop.diagnostic(
            self.source,
            problem.pos,
            self.config,
            format!(
                "unescaped non-ASCII characters in {} are disallowed, use escape sequence \"{escaped}\"",
                context.noun()
            ),
        ));
        // The fix replaces exactly the problem span, nothing around it.
        self.corrections.push(Correction {
            start: problem.pos,
            end: problem.pos + problem.len,
            replacement: escaped,
            cop_name: self.cop.name(),
        });
    }

    fn claim_identifier(&mut self, loc: &ruby_prism::Location<'_>) {
        self.claim_range(loc.start_offset(), loc.end_offset(), Context::Identifier);
    }
}

impl<'pr> Visit<'pr> for NonAsciiWalker<'_, 'pr> {
    fn visit_program_node(&mut self, node: &ruby_prism::ProgramNode<'pr>) {
        // Seed the pending pool from the whole buffer before anything can
        // claim from it, then attribute comment ranges first: comments and
        // tokens never overlap, so every later claim sees only leftovers.
        self.pool = Some(ProblemPool::seed(self.source.as_bytes()));
        self.handle_comments();
        ruby_prism::visit_program_node(self, node);
    }

    fn visit_def_node(&mut self, node: &ruby_prism::DefNode<'pr>) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_def_node(self, node);
    }

    fn visit_call_node(&mut self, node: &ruby_prism::CallNode<'pr>) {
        if let Some(loc) = node.message_loc() {
            self.claim_identifier(&loc);
        }
        ruby_prism::visit_call_node(self, node);
    }

    fn visit_local_variable_write_node(
        &mut self,
        node: &ruby_prism::LocalVariableWriteNode<'pr>,
    ) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_local_variable_write_node(self, node);
    }

    fn visit_local_variable_read_node(&mut self, node: &ruby_prism::LocalVariableReadNode<'pr>) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_local_variable_read_node(self, node);
    }

    fn visit_local_variable_target_node(
        &mut self,
        node: &ruby_prism::LocalVariableTargetNode<'pr>,
    ) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_local_variable_target_node(self, node);
    }

    fn visit_constant_read_node(&mut self, node: &ruby_prism::ConstantReadNode<'pr>) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_constant_read_node(self, node);
    }

    fn visit_constant_write_node(&mut self, node: &ruby_prism::ConstantWriteNode<'pr>) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_constant_write_node(self, node);
    }

    fn visit_instance_variable_read_node(
        &mut self,
        node: &ruby_prism::InstanceVariableReadNode<'pr>,
    ) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_instance_variable_read_node(self, node);
    }

    fn visit_instance_variable_write_node(
        &mut self,
        node: &ruby_prism::InstanceVariableWriteNode<'pr>,
    ) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_instance_variable_write_node(self, node);
    }

    fn visit_class_variable_read_node(&mut self, node: &ruby_prism::ClassVariableReadNode<'pr>) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_class_variable_read_node(self, node);
    }

    fn visit_class_variable_write_node(
        &mut self,
        node: &ruby_prism::ClassVariableWriteNode<'pr>,
    ) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_class_variable_write_node(self, node);
    }

    fn visit_global_variable_read_node(
        &mut self,
        node: &ruby_prism::GlobalVariableReadNode<'pr>,
    ) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_global_variable_read_node(self, node);
    }

    fn visit_global_variable_write_node(
        &mut self,
        node: &ruby_prism::GlobalVariableWriteNode<'pr>,
    ) {
        self.claim_identifier(&node.name_loc());
        ruby_prism::visit_global_variable_write_node(self, node);
    }

    fn visit_required_parameter_node(&mut self, node: &ruby_prism::RequiredParameterNode<'pr>) {
        self.claim_identifier(&node.location());
        ruby_prism::visit_required_parameter_node(self, node);
    }

    fn visit_string_node(&mut self, node: &ruby_prism::StringNode<'pr>) {
        let loc = node.location();
        self.claim_range(loc.start_offset(), loc.end_offset(), Context::String);
        ruby_prism::visit_string_node(self, node);
    }

    fn visit_interpolated_string_node(
        &mut self,
        node: &ruby_prism::InterpolatedStringNode<'pr>,
    ) {
        let parts = node.parts();
        let has_substitutions = parts.iter().any(|part| {
            part.as_embedded_statements_node().is_some()
                || part.as_embedded_variable_node().is_some()
        });
        if has_substitutions {
            // Claim only the literal segments between substitutions; the
            // embedded expressions are ordinary code and recursion below
            // attributes them to their own contexts.
            for part in parts.iter() {
                if let Some(segment) = part.as_string_node() {
                    let loc = segment.location();
                    self.claim_range(loc.start_offset(), loc.end_offset(), Context::Template);
                }
            }
        } else {
            let loc = node.location();
            self.claim_range(loc.start_offset(), loc.end_offset(), Context::Template);
        }
        ruby_prism::visit_interpolated_string_node(self, node);
    }
}

impl Cop for NonAscii {
    fn name(&self) -> &'static str {
        "Style/NonAscii"
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check_source(
        &self,
        source: &SourceFile,
        parse_result: &ruby_prism::ParseResult<'_>,
        config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        corrections: Option<&mut Vec<Correction>>,
    ) {
        let mut walker = NonAsciiWalker {
            cop: self,
            source,
            parse_result,
            config,
            policy: PolicyTable::from_config(config),
            pool: None,
            diagnostics: Vec::new(),
            corrections: Vec::new(),
        };
        walker.visit(&parse_result.node());

        // Anything never claimed by a recognized context is rejected
        // unconditionally; configuration cannot silence it.
        let mut pool = walker.pool.take().expect(MISSED_SEED);
        for problem in pool.drain_remaining() {
            walker.reject(problem, Context::Unknown);
        }

        diagnostics.extend(walker.diagnostics);
        if let Some(sink) = corrections {
            sink.extend(walker.corrections);
        }
    }
}
