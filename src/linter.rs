use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;

use crate::cli::Args;
use crate::config::ResolvedConfig;
use crate::cop::CopConfig;
use crate::cop::registry::CopRegistry;
use crate::correction::{Correction, CorrectionSet};
use crate::diagnostic::Diagnostic;
use crate::fs::DiscoveredFiles;
use crate::parse::parse_source;
use crate::parse::source::SourceFile;

/// Bail out of the autocorrect loop if a fix keeps producing new offenses.
const MAX_CORRECTION_ITERATIONS: usize = 10;

pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
    pub file_count: usize,
    pub corrected_count: usize,
}

/// Per-cop execution plan resolved once per run: effective config,
/// enablement, and compiled path filters.
struct CopPlan {
    config: CopConfig,
    enabled: bool,
    exclude: GlobSet,
    include: Option<GlobSet>,
}

impl CopPlan {
    fn matches_path(&self, path: &Path) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }
}

fn build_cop_plans(config: &ResolvedConfig, registry: &CopRegistry, args: &Args) -> Vec<CopPlan> {
    registry
        .cops()
        .iter()
        .map(|cop| {
            let cop_config = config.cop_config(cop.name());
            let enabled = cop_config.enabled && args.is_cop_selected(cop.name());
            let exclude = build_globset(&cop_config.exclude);
            let include = if cop_config.include.is_empty() {
                None
            } else {
                Some(build_globset(&cop_config.include))
            };
            CopPlan {
                config: cop_config,
                enabled,
                exclude,
                include,
            }
        })
        .collect()
}

/// Invalid patterns are warned about and skipped; a configuration mistake
/// never takes the whole run down.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => eprintln!("warning: invalid glob pattern {pattern:?}: {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Lint a single SourceFile (already loaded into memory). Used for --stdin
/// mode; never writes corrections anywhere.
pub fn lint_source(
    source: &SourceFile,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> LintResult {
    let plans = build_cop_plans(config, registry, args);
    let (diagnostics, _) = lint_source_once(source, registry, &plans, false);
    let mut sorted = diagnostics;
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    LintResult {
        diagnostics: sorted,
        file_count: 1,
        corrected_count: 0,
    }
}

pub fn run_linter(
    discovered: &DiscoveredFiles,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> LintResult {
    let plans = build_cop_plans(config, registry, args);
    let global_excludes = build_globset(config.global_excludes());

    let found_offense = AtomicBool::new(false);
    let total_corrected = AtomicUsize::new(0);

    let diagnostics: Vec<Diagnostic> = discovered
        .files
        .par_iter()
        .flat_map(|path| {
            // --fail-fast: skip remaining files once an offense is found
            if args.fail_fast && found_offense.load(Ordering::Relaxed) {
                return Vec::new();
            }
            let diags = lint_file(path, discovered, &global_excludes, registry, &plans, args, &total_corrected);
            if args.fail_fast && !diags.is_empty() {
                found_offense.store(true, Ordering::Relaxed);
            }
            diags
        })
        .collect();

    let mut sorted = diagnostics;
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    LintResult {
        diagnostics: sorted,
        file_count: discovered.files.len(),
        corrected_count: total_corrected.load(Ordering::Relaxed),
    }
}

fn lint_file(
    path: &Path,
    discovered: &DiscoveredFiles,
    global_excludes: &GlobSet,
    registry: &CopRegistry,
    plans: &[CopPlan],
    args: &Args,
    total_corrected: &AtomicUsize,
) -> Vec<Diagnostic> {
    // Explicitly-passed files bypass AllCops.Exclude unless --force-exclusion.
    if global_excludes.is_match(path) {
        let is_explicit = discovered.explicit.contains(path);
        if args.force_exclusion || !is_explicit {
            return Vec::new();
        }
    }

    let source = match SourceFile::from_path(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Vec::new();
        }
    };

    let (diagnostics, corrected_bytes, corrected_count) =
        lint_source_inner(&source, registry, plans, args);
    if corrected_count > 0 {
        total_corrected.fetch_add(corrected_count, Ordering::Relaxed);
    }

    if let Some(bytes) = corrected_bytes {
        if let Err(e) = std::fs::write(path, &bytes) {
            eprintln!(
                "error: failed to write corrected file {}: {e}",
                path.display()
            );
        }
    }

    diagnostics
}

/// Returns (diagnostics, corrected bytes to write if any, corrected count).
///
/// With autocorrect on, lint and apply corrections repeatedly until a pass
/// produces none, then re-validate that the corrected buffer still parses
/// before letting it reach disk.
fn lint_source_inner(
    source: &SourceFile,
    registry: &CopRegistry,
    plans: &[CopPlan],
    args: &Args,
) -> (Vec<Diagnostic>, Option<Vec<u8>>, usize) {
    if !args.autocorrect {
        let (diags, _) = lint_source_once(source, registry, plans, false);
        return (diags, None, 0);
    }

    let original = source.as_bytes().to_vec();
    let mut current = original.clone();
    let path = source.path.clone();
    let mut corrected_count = 0;

    for _ in 0..MAX_CORRECTION_ITERATIONS {
        let iter_source = SourceFile::from_vec(path.clone(), current.clone());
        let (diags, corrections) = lint_source_once(&iter_source, registry, plans, true);

        if corrections.is_empty() {
            if current == original {
                return (diags, None, corrected_count);
            }
            if parse_source(&current).errors().count() > 0 {
                eprintln!(
                    "warning: autocorrect produced invalid syntax for {}, skipping corrections",
                    path.display()
                );
                break;
            }
            return (diags, Some(current), corrected_count);
        }

        let set = CorrectionSet::from_vec(corrections);
        corrected_count += set.len();
        current = set.apply(&current);
    }

    // Corrections were discarded (invalid result or no convergence);
    // report the original, untouched source.
    let fallback = SourceFile::from_vec(path, original);
    let (diags, _) = lint_source_once(&fallback, registry, plans, false);
    (diags, None, 0)
}

fn lint_source_once(
    source: &SourceFile,
    registry: &CopRegistry,
    plans: &[CopPlan],
    collect_corrections: bool,
) -> (Vec<Diagnostic>, Vec<Correction>) {
    let parse_result = parse_source(source.as_bytes());
    let mut diagnostics = Vec::new();
    let mut corrections = Vec::new();

    for (cop, plan) in registry.cops().iter().zip(plans) {
        if !plan.enabled || !plan.matches_path(&source.path) {
            continue;
        }
        if collect_corrections && cop.supports_autocorrect() {
            cop.check_source(
                source,
                &parse_result,
                &plan.config,
                &mut diagnostics,
                Some(&mut corrections),
            );
        } else {
            cop.check_source(source, &parse_result, &plan.config, &mut diagnostics, None);
        }
    }

    (diagnostics, corrections)
}
