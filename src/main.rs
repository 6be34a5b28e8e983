use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use ezflowscript_interpreter as ezflow;

use ezflow::ast_printer::AstPrinter;
use ezflow::interpreter::Interpreter;
use ezflow::parser::{Parser, Stmt};
use ezflow::resolver::Resolver;
use ezflow::scanner::Scanner;
use ezflow::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "EzFlowScript language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit one JSON object per token instead of the plain form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a program, or starts a REPL without one
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'ezflowscript_interpreter::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("ezflowscript_interpreter::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan `src` fully, printing each lexical error to stderr.  Returns the
/// token stream and whether any error surfaced; scanning always continues
/// past errors so every diagnostic is reported in one pass.
fn scan(src: &[u8]) -> (Vec<Token<'_>>, bool) {
    let mut tokens = Vec::new();
    let mut had_error = false;

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),

            Err(e) => {
                had_error = true;

                debug!("Scan error: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    (tokens, had_error)
}

/// Run a whole program from a file: scan, parse, resolve, execute.  Any
/// static diagnostic suppresses execution and exits 65; a runtime error
/// exits 70.
fn run_file(filename: PathBuf) -> Result<()> {
    let buf = read_file(filename)?;

    let (tokens, had_scan_error) = scan(&buf);

    let mut parser = Parser::new(&tokens);
    let (statements, parse_errors) = parser.parse();

    for e in &parse_errors {
        eprintln!("{}", e);
    }

    if had_scan_error || !parse_errors.is_empty() {
        debug!("Static errors present, refusing to execute");

        std::process::exit(65);
    }

    info!("Parsed {} statements", statements.len());

    let mut interpreter = Interpreter::new();

    let mut resolver = Resolver::new(&mut interpreter);
    resolver.resolve(&statements);
    let diagnostics = resolver.into_diagnostics();

    if !diagnostics.is_empty() {
        for e in &diagnostics {
            eprintln!("{}", e);
        }

        std::process::exit(65);
    }

    if let Err(e) = interpreter.interpret(&statements, &mut io::stdout()) {
        debug!("Runtime debug: {}", e);

        eprintln!("{}", e);

        std::process::exit(70);
    }

    Ok(())
}

/// Interactive mode: one line per interpretation unit, interpreter state
/// persisting across lines.  Diagnostics are printed and the loop continues.
fn run_repl() -> Result<()> {
    println!("EzFlowScript interactive mode. Ctrl-D exits.");

    let mut interpreter: Interpreter<'static> = Interpreter::new();
    let mut id_base: usize = 0;
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            break; // EOF
        }

        if line.trim().is_empty() {
            continue;
        }

        // Function and class values may capture this line's AST for the rest
        // of the session, so the buffers get process lifetime.
        let src: &'static [u8] = Box::leak(line.into_bytes().into_boxed_slice());

        let (tokens, had_scan_error) = scan(src);

        if had_scan_error {
            continue;
        }

        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());

        // Node ids must stay unique across the session's accumulated AST.
        let mut parser = Parser::with_id_base(tokens, id_base);
        let (statements, parse_errors) = parser.parse();
        id_base = parser.next_id();

        if !parse_errors.is_empty() {
            for e in &parse_errors {
                eprintln!("{}", e);
            }

            continue;
        }

        let statements: &'static [Stmt<'static>] = Box::leak(statements.into_boxed_slice());

        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(statements);
        let diagnostics = resolver.into_diagnostics();

        if !diagnostics.is_empty() {
            for e in &diagnostics {
                eprintln!("{}", e);
            }

            continue;
        }

        if let Err(e) = interpreter.interpret(statements, &mut io::stdout()) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let buf = read_file(filename)?;
                let mut tokenized = true;

                for token in Scanner::new(&buf) {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);

                            if json {
                                println!(
                                    "{}",
                                    serde_json::to_string(&token)
                                        .context("Failed to serialize token")?
                                );
                            } else {
                                println!("{}", token);
                            }
                        }

                        Err(e) => {
                            tokenized = false;

                            debug!("Tokenization debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }

            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let buf = read_file(filename)?;
                let (tokens, had_scan_error) = scan(&buf);

                if had_scan_error {
                    std::process::exit(65);
                }

                let mut parser = Parser::new(&tokens);

                match parser.parse_expression() {
                    Ok(expr) => {
                        info!("Expression parsed successfully");

                        let ast_str = AstPrinter::print(&expr);

                        debug!("AST: {}", ast_str);
                        println!("{}", ast_str);
                    }

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(65);
                    }
                }

                info!("Parse subcommand completed");
            }

            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");

                let buf = read_file(filename)?;
                let (tokens, had_scan_error) = scan(&buf);

                if had_scan_error {
                    std::process::exit(65);
                }

                let mut parser = Parser::new(&tokens);

                let expr = match parser.parse_expression() {
                    Ok(expr) => expr,

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(65);
                    }
                };

                let mut interpreter = Interpreter::new();

                match interpreter.evaluate(&expr, &mut io::stdout()) {
                    Ok(value) => {
                        debug!("Evaluated to: {}", value);
                        println!("{}", value);
                    }

                    Err(e) => {
                        debug!("Evaluation debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(70);
                    }
                }

                info!("Evaluate subcommand completed");
            }

            None => {
                info!("No filepath provided for Evaluate");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                run_file(filename)?;
            }

            None => {
                info!("No filepath provided for Run, entering interactive mode");

                run_repl()?;
            }
        },
    }

    Ok(())
}
