use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "asciicop", version, about = "Keep Ruby source printable-ASCII")]
pub struct Args {
    /// Files or directories to lint
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Run only the specified cops (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exclude the specified cops (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub except: Vec<String>,

    /// List all registered cop names, one per line, then exit
    #[arg(long)]
    pub list_cops: bool,

    /// Read source from stdin, use PATH for display and config matching
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<PathBuf>,

    /// Autocorrect offenses
    #[arg(short = 'a', long)]
    pub autocorrect: bool,

    /// Stop after first file with offenses
    #[arg(short = 'F', long)]
    pub fail_fast: bool,

    /// Apply AllCops.Exclude to explicitly-passed files (by default, explicit files bypass exclusion)
    #[arg(long)]
    pub force_exclusion: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// True when `name` passes the `--only`/`--except` filters.
    pub fn is_cop_selected(&self, name: &str) -> bool {
        if !self.only.is_empty() && !self.only.iter().any(|o| o == name) {
            return false;
        }
        !self.except.iter().any(|e| e == name)
    }
}
