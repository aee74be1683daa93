use clap::Parser;
use log::{debug, info};
use mlc_core::lexer::{LexError, Lexer};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Exit status once the whole input has been tokenized.
const EXIT_OK: u8 = 0;
/// Exit status when the source file or standard input cannot be read.
const EXIT_SOURCE_ERROR: u8 = 4;
/// Exit status when the lexer meets an invalid token.
const EXIT_INVALID_TOKEN: u8 = 5;
/// Exit status when the token stream cannot be written to standard output.
const EXIT_OUTPUT_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "mlc")]
#[command(about = "Print the lexical tokens of an ML source file, one per line", long_about = None)]
struct Cli {
    /// Input source file (reads standard input when omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("{0}")]
    Source(#[source] io::Error),

    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("IO error: {0}")]
    Output(#[source] io::Error),
}

impl DriverError {
    fn exit_code(&self) -> u8 {
        match self {
            DriverError::Source(_) => EXIT_SOURCE_ERROR,
            DriverError::Lex(_) => EXIT_INVALID_TOKEN,
            DriverError::Output(_) => EXIT_OUTPUT_ERROR,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match read_source(cli.input.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error on opening source: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    match print_tokens(&source) {
        Ok(count) => {
            debug!("Printed {} tokens", count);
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            debug!("Stopped tokenizing: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn read_source(input: Option<&Path>) -> Result<String, DriverError> {
    match input {
        Some(path) => {
            info!("Reading source from {}", path.display());
            fs::read_to_string(path).map_err(DriverError::Source)
        }
        None => {
            info!("Reading source from standard input");
            let mut source = String::new();
            io::stdin().read_to_string(&mut source).map_err(DriverError::Source)?;
            Ok(source)
        }
    }
}

/// Print each token as soon as the lexer produces it. Returns the number of
/// tokens printed.
fn print_tokens(source: &str) -> Result<usize, DriverError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;

    for token in Lexer::new(source) {
        let token = token?;
        writeln!(out, "{}", token).map_err(DriverError::Output)?;
        count += 1;
    }
    out.flush().map_err(DriverError::Output)?;

    Ok(count)
}
