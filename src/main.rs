use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::{Builder, Env};
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast::Program;
use lox::ast_printer::{AstPrinter, RpnPrinter};
use lox::error::LoxError;
use lox::parser::Parser;
use lox::scanner::{scan_tokens, Scanner};
use lox::session::{RunError, Session, EXIT_STATIC};
use lox::token::Token;

const EXIT_IO: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file used with --log
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Treat the input as a single expression
        #[arg(long)]
        expr: bool,

        /// Print the expression in reverse Polish notation
        #[arg(long, requires = "expr")]
        rpn: bool,
    },

    /// Runs a Lox program, or starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads a source file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source: String = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Module path without the crate prefix, plus the source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("lox_interpreter::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report_static(errors: &[LoxError]) {
    for e in errors {
        debug!("Static error: {:?}", e);
        eprintln!("{}", e);
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");
    let source: String = read_file(filename)?;
    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        return Ok(EXIT_STATIC);
    }

    info!("Tokenization completed successfully");
    Ok(0)
}

fn parse(filename: &Path, expr: bool, rpn: bool) -> Result<i32> {
    info!("Running Parse subcommand");
    let source: String = read_file(filename)?;
    let (tokens, scan_errors) = scan_tokens(&source);

    if !scan_errors.is_empty() {
        report_static(&scan_errors);
        return Ok(EXIT_STATIC);
    }

    let parser = Parser::new(tokens);

    if expr {
        return match parser.parse_expression() {
            Ok(expr) => {
                let rendered: String = if rpn {
                    RpnPrinter::print(&expr)
                } else {
                    AstPrinter::print(&expr)
                };

                debug!("AST: {}", rendered);
                println!("{}", rendered);
                Ok(0)
            }

            Err(errors) => {
                report_static(&errors);
                Ok(EXIT_STATIC)
            }
        };
    }

    let (program, errors): (Program, Vec<LoxError>) = parser.parse();
    if !errors.is_empty() {
        report_static(&errors);
        return Ok(EXIT_STATIC);
    }

    for stmt in program.iter().flatten() {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    info!("Parse subcommand completed");
    Ok(0)
}

fn run_file(filename: &Path) -> Result<i32> {
    info!("Running Run subcommand");
    let source: String = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut session = Session::new();

    match session.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }

        Err(e) => {
            match &e {
                RunError::Static(errors) => report_static(errors),
                RunError::Runtime(_) => {
                    debug!("Runtime debug: {:?}", e);
                    eprintln!("{}", e);
                }
            }

            Ok(e.exit_code())
        }
    }
}

/// Line‑at‑a‑time prompt over one session, so earlier definitions stay
/// visible. Errors are reported and the loop continues.
fn repl() -> Result<i32> {
    info!("Starting REPL");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line: String = line.context("Failed to read from stdin")?;

        match session.run(&line) {
            Ok(()) => {}
            Err(RunError::Static(errors)) => report_static(&errors),
            Err(e) => eprintln!("{}", e),
        }
    }

    info!("REPL finished");
    Ok(0)
}

fn try_main(args: Cli) -> Result<i32> {
    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::from_env(Env::default().default_filter_or("warn")).init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse {
            filename,
            expr,
            rpn,
        } => parse(filename, *expr, *rpn),
        Commands::Run { filename } => match filename {
            Some(filename) => run_file(filename),
            None => repl(),
        },
    }
}

fn main() {
    let args: Cli = Cli::parse();

    let code: i32 = match try_main(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_IO
        }
    };

    debug!("Exiting with code {}", code);
    process::exit(code);
}
