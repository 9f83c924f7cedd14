use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program reads railway pager telegrams as text, one per line, and prints the decoded position reports and train status messages.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program reads railway pager telegrams as text, one per line, and prints the decoded position reports and train status messages.

By default, input lines are expected in the form produced by a live ingestion session:

    [MSG] 0001234000 ABC123 80 4521

Other lines, like "Connected to …" or "Connection closed," are ignored. Save the output of a session and replay it with

    railpagerdec --file session.log

Use --raw to decode every line as telegram text, without the [MSG] tag:

    printf '1234000 ABC123 80 4521\n' | railpagerdec --raw

Route names are printed as GB2312 text. When no bit and nibble order yields legible text, every candidate is printed as a hexadecimal byte string instead.
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded telegrams
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    ///
    /// Text, one telegram per line.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Decode every line as telegram text
    ///
    /// Without this option, only "[MSG]" lines are decoded.
    #[arg(long)]
    pub raw: bool,

    /// Also print unrecognized telegrams
    #[arg(long)]
    pub unknown: bool,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// Fatal decoder error
///
/// Ends the program with `exit_code`: zero for `--help` and
/// `--version`, one for everything else.
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Wrap `error`, exiting with `code`
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Report to stderr
    ///
    /// Argument errors, help, and version text come from clap
    /// and are shown as-is. Input errors get clap's styling so
    /// every failure looks alike.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Io, self.to_string())
                .print()
        }
    }

    /// Report and end the process
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}
