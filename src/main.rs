//! `watson`: run and inspect watson programs, or write them from JSON.

use std::fs;
use std::io::{self, BufReader, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use watson::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use watson::{codegen, Lexer, Value};

#[derive(Parser, Debug)]
#[command(name = "watson", version)]
#[command(about = "Run and inspect watson programs, or write them from JSON")]
struct Cli {
    /// How errors are reported on stderr
    #[arg(long, value_enum, global = true)]
    diagnostics: Option<DiagnosticFormat>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program and print the resulting value as JSON
    Decode {
        /// Program file; stdin when absent
        file: Option<PathBuf>,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Read JSON and print a program that rebuilds it
    Encode {
        /// JSON file; stdin when absent
        file: Option<PathBuf>,
    },
    /// Print the opcodes of a program, one per line
    Lex {
        /// Program file; stdin when absent
        file: Option<PathBuf>,
    },
    /// Explain an error code
    Explain {
        /// Error code, e.g. WAT-E002
        code: Option<String>,
        /// List every error code
        #[arg(long, conflicts_with = "code")]
        list: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DiagnosticFormat {
    Text,
    Ansi,
    Json,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.diagnostics.unwrap_or(if io::stderr().is_terminal() {
        DiagnosticFormat::Ansi
    } else {
        DiagnosticFormat::Text
    });

    if let Err(d) = dispatch(cli.command) {
        let rendered = match format {
            DiagnosticFormat::Json => format!("{}\n", json::render(&d)),
            DiagnosticFormat::Ansi => AnsiRenderer { use_color: true }.render(&d),
            DiagnosticFormat::Text => AnsiRenderer { use_color: false }.render(&d),
        };
        eprint!("{rendered}");
        process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), Diagnostic> {
    match command {
        Command::Decode { file, pretty } => decode(file.as_deref(), pretty),
        Command::Encode { file } => encode(file.as_deref()),
        Command::Lex { file } => lex(file.as_deref()),
        Command::Explain { code, list } => explain(code.as_deref(), list),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Diagnostic> {
    fs::read(path).map_err(|e| {
        Diagnostic::from(&e).with_note(format!("while reading {}", path.display()))
    })
}

fn decode(file: Option<&Path>, pretty: bool) -> Result<(), Diagnostic> {
    let value = match file {
        Some(path) => {
            let source = read_file(path)?;
            debug!(path = %path.display(), bytes = source.len(), "decoding file");
            watson::run_bytes(&source)
                .map_err(move |e| Diagnostic::from(&e).with_source(source))?
        }
        // Stream stdin through the lexer; nothing is kept for the report.
        None => watson::run(io::stdin().lock()).map_err(|e| Diagnostic::from(&e))?,
    };
    print_json(&value, pretty)
}

fn print_json(value: &Value, pretty: bool) -> Result<(), Diagnostic> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| Diagnostic::error(format!("cannot render result: {e}")))?;
    let mut out = io::stdout().lock();
    writeln!(out, "{text}").map_err(|e| Diagnostic::from(&e))
}

fn encode(file: Option<&Path>) -> Result<(), Diagnostic> {
    let json: serde_json::Value = match file {
        Some(path) => serde_json::from_slice(&read_file(path)?),
        None => serde_json::from_reader(BufReader::new(io::stdin().lock())),
    }
    .map_err(|e| Diagnostic::from(&e))?;

    let value = Value::from(json);
    let mut out = io::stdout().lock();
    codegen::write_to(&value, &mut out)
        .and_then(|()| writeln!(out))
        .map_err(|e| Diagnostic::from(&e))
}

fn lex(file: Option<&Path>) -> Result<(), Diagnostic> {
    let source: Box<dyn Read> = match file {
        Some(path) => Box::new(io::Cursor::new(read_file(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = io::stdout().lock();
    for op in Lexer::new(source) {
        let op = op.map_err(|e| Diagnostic::from(&e))?;
        writeln!(out, "{op}").map_err(|e| Diagnostic::from(&e))?;
    }
    Ok(())
}

fn explain(code: Option<&str>, list: bool) -> Result<(), Diagnostic> {
    let mut out = io::stdout().lock();
    let written = match code {
        Some(code) if !list => {
            let entry = registry::lookup(code).ok_or_else(|| {
                Diagnostic::error(format!("unknown error code `{code}`"))
                    .with_suggestion("run `watson explain --list` to see every code")
            })?;
            write!(out, "{}", entry.long)
        }
        _ => registry::REGISTRY
            .iter()
            .try_for_each(|entry| writeln!(out, "{}  {}", entry.code, entry.short)),
    };
    written.map_err(|e| Diagnostic::from(&e))
}
