pub mod cli;
pub mod config;
pub mod cop;
pub mod correction;
pub mod diagnostic;
pub mod formatter;
pub mod fs;
pub mod linter;
pub mod parse;

#[cfg(test)]
pub mod testutil;

use std::io::Read;

use anyhow::Result;

use cli::Args;
use config::load_config;
use cop::registry::CopRegistry;
use formatter::create_formatter;
use fs::discover_files;
use linter::{lint_source, run_linter};
use parse::source::SourceFile;

/// Run the linter. Returns the exit code: 0 = clean, 1 = offenses found, 2 = error.
pub fn run(args: Args) -> Result<i32> {
    let config = load_config(args.config.as_deref())?;

    if args.debug {
        eprintln!("debug: global excludes: {:?}", config.global_excludes());
    }

    let registry = CopRegistry::default_registry();

    // --list-cops: print all registered cop names and exit
    if args.list_cops {
        let mut names = registry.names();
        names.sort_unstable();
        for name in names {
            println!("{name}");
        }
        return Ok(0);
    }

    // --stdin: read from stdin and lint a single buffer
    if let Some(ref display_path) = args.stdin {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let source = SourceFile::from_string(display_path.clone(), input);
        let result = lint_source(&source, &config, &registry, &args);
        let formatter = create_formatter(&args.format);
        formatter.print(&result);
        return if result.diagnostics.is_empty() {
            Ok(0)
        } else {
            Ok(1)
        };
    }

    let discovered = discover_files(&args.paths, &config)?;

    if args.debug {
        eprintln!("debug: {} files to lint", discovered.files.len());
        eprintln!("debug: {} cops registered", registry.len());
    }

    let result = run_linter(&discovered, &config, &registry, &args);
    let formatter = create_formatter(&args.format);
    formatter.print(&result);

    if result.diagnostics.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}
