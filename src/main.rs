//! Crux Compiler
//!
//! Command-line driver: dumps tokens or syntax trees, type-checks, and
//! compiles Crux source files to MIPS assembly.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cruxc::backend::{CodeGen, MipsCodeGen};
use cruxc::frontend::ast::Node;
use cruxc::frontend::printer::pretty_print;
use cruxc::frontend::{Lexer, Parser as CruxParser, TypeChecker};

const EXIT_PARSE_ERROR: i32 = 3;
const EXIT_TYPE_ERROR: i32 = 4;
const EXIT_CODEGEN_ERROR: i32 = 5;

/// Crux Compiler
#[derive(Parser, Debug)]
#[command(name = "cruxc")]
#[command(version = "0.1.0")]
#[command(about = "Crux compiler - compiles Crux programs to MIPS assembly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,

        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the syntax tree of a source file
    Ast {
        /// Input source file
        input: PathBuf,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Compile a source file to assembly
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file (defaults to the input with an .asm extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Tokens { input, json } => print_tokens(input, *json),
        Commands::Ast { input } => print_ast(input),
        Commands::Check { input } => check_file(input),
        Commands::Build { input, output } => build_file(input, output.clone()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

/// Parse a file, exiting with its report if there are syntax or resolution errors
fn parse_file(input: &Path) -> Result<Node> {
    let source = read_source(input)?;
    let mut parser = CruxParser::new(Lexer::new(&source));
    let root = parser.parse();
    log::info!("parsed {}", input.display());

    if parser.has_error() {
        println!("Error parsing file {}", input.display());
        print!("{}", parser.error_report());
        process::exit(EXIT_PARSE_ERROR);
    }
    Ok(root)
}

/// Type-check a parsed tree, exiting with its report on failure
fn type_check(input: &Path, root: &Node) -> TypeChecker {
    let mut checker = TypeChecker::new();
    if !checker.check(root) {
        println!("Error type-checking file {}", input.display());
        print!("{}", checker.error_report());
        process::exit(EXIT_TYPE_ERROR);
    }
    checker
}

fn print_tokens(input: &Path, json: bool) -> Result<()> {
    let source = read_source(input)?;
    let tokens = Lexer::new(&source).tokenize();

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }
    Ok(())
}

fn print_ast(input: &Path) -> Result<()> {
    let root = parse_file(input)?;
    print!("{}", pretty_print(&root));
    Ok(())
}

fn check_file(input: &Path) -> Result<()> {
    let root = parse_file(input)?;
    type_check(input, &root);
    println!("Crux program has no type errors.");
    Ok(())
}

fn build_file(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let root = parse_file(input)?;
    let checker = type_check(input, &root);

    let mut codegen = MipsCodeGen::new(&checker);
    if !codegen.generate(&root) {
        println!("Error generating code for file {}", input.display());
        println!("{}", codegen.error_report());
        process::exit(EXIT_CODEGEN_ERROR);
    }

    let out_path = output.unwrap_or_else(|| input.with_extension("asm"));
    let file = fs::File::create(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    codegen.program().print(&mut writer)?;
    writer.flush()?;

    println!("Crux program successfully compiled to {}", out_path.display());
    Ok(())
}
