use clap::Parser;

use asciicop::cli::Args;

fn main() {
    let args = Args::parse();
    match asciicop::run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}
