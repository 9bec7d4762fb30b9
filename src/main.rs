//! SMPL interpreter CLI
//!
//! Main entry point for the `smpl` command.

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use smpl::SourceFile;
use smpl::config::Config;
use smpl::interp::{Evaluator, Value};

#[derive(Parser)]
#[command(name = "smpl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the SMPL teaching language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./smpl.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an SMPL program and print its value
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Maximum nesting of procedure calls
        #[arg(long, value_name = "N")]
        max_call_depth: Option<usize>,
    },

    /// Lex and parse an SMPL program without running it
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Dump the parsed program
        #[arg(long, value_enum)]
        emit: Option<EmitType>,
    },

    /// Start the interactive REPL
    Repl,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitType {
    /// Abstract Syntax Tree (JSON)
    Ast,
    /// Source re-printed from the AST
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            max_call_depth,
        } => run(&input, config, max_call_depth),

        Commands::Check { input, emit } => check(&input, emit),

        Commands::Repl => smpl::repl::run(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path),
        None => Config::discover(Path::new(".")),
    };
    config.map_err(|e| miette::miette!("{}", e))
}

fn read_source(input: &Path) -> Result<SourceFile> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;
    Ok(SourceFile::new(input.to_string_lossy(), content))
}

fn run(input: &Path, mut config: Config, max_call_depth: Option<usize>) -> Result<()> {
    if let Some(depth) = max_call_depth {
        if depth == 0 {
            miette::bail!("--max-call-depth must be at least 1");
        }
        config.eval.max_call_depth = depth;
    }
    tracing::info!("Running {:?}", input);

    let file = read_source(input)?;
    let program = smpl::parse_source(&file)?;
    tracing::debug!("Parsed {} statements", program.seq.len());

    let mut evaluator = Evaluator::with_config(config.eval);
    match evaluator.evaluate(&program) {
        Ok(result) => {
            // Only print non-unit results
            match &result {
                Value::Unit => {}
                _ => println!("{}", result),
            }
            tracing::debug!(
                "Executed {} statements",
                evaluator.statements_executed()
            );
            Ok(())
        }
        Err(e) => Err(miette::Report::new(e).with_source_code(file.to_named_source())),
    }
}

fn check(input: &Path, emit: Option<EmitType>) -> Result<()> {
    tracing::info!("Checking {:?}", input);

    let file = read_source(input)?;
    let program = smpl::parse_source(&file)?;

    match emit {
        Some(EmitType::Ast) => {
            let json = serde_json::to_string_pretty(&program)
                .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
            println!("{}", json);
        }
        Some(EmitType::Pretty) => println!("{}", program),
        None => println!(
            "Parsed {} ({} statements)",
            input.display(),
            program.seq.len()
        ),
    }

    Ok(())
}
