// CLI module
// Command-line interface, argument parsing and the confirmation prompt

mod args;
mod prompt;

pub use args::CliArgs;
pub use prompt::confirm;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (unknown flag, malformed date, `--help`), clap prints an
/// error or help text and exits the process before any file is touched.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
