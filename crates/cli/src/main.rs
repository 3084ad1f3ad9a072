//! `cinder` -- file runner and REPL for the `cinder` language.
//!
//! Flag parsing, the line-reading REPL shell, file loading, and
//! disassembly are thin wrappers around `cinder_compiler::compile` and
//! `cinder_vm::Vm` -- neither contains algorithmic work of its own. The
//! actual wrapper logic lives in `cinder_cli::compile_and_run` (this
//! crate's lib target) so it can be unit-tested without spawning the
//! binary.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use cinder_core::error::InterpretResult;
use cinder_vm::Vm;
use clap::Parser;

/// A single flat flag struct rather than a subcommand enum: this binary
/// has one entry point, not a family of them.
#[derive(Parser)]
#[command(
    name = "cinder",
    disable_help_flag = true,
    disable_version_flag = true,
    about = "A small dynamically-typed scripting language"
)]
struct Cli {
    /// Print a disassembly of the compiled chunk before running it.
    #[arg(short = 'd', long = "dump")]
    dump: bool,

    /// Print usage and exit.
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Print the version and exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Source file to run. Omit to start the REPL.
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.help {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if cli.version {
        println!("cinder {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match cli.path {
        Some(path) => run_file(&path, cli.dump),
        None => run_repl(cli.dump),
    }
}

fn print_usage() {
    println!("Usage: cinder [options] [script]");
    println!("-d --dump                                 Dump the compiled bytecode before running.");
    println!("-h --help                                 Show this help message.");
    println!("-v --version                              Show the program version string.");
    println!();
}

fn run_file(path: &std::path::Path, dump: bool) -> ExitCode {
    let mut vm = Vm::new();
    match cinder_cli::run_path(&mut vm, path, dump) {
        Ok(InterpretResult::Ok) => ExitCode::SUCCESS,
        Ok(InterpretResult::CompileError | InterpretResult::RuntimeError) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Could not read file '{}': {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn run_repl(dump: bool) -> ExitCode {
    let mut vm = Vm::new();
    let stdin = io::stdin();
    let mut line_no = 0;

    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        line_no += 1;
        let _ = cinder_cli::compile_and_run(&mut vm, &line, dump, &format!("repl:{line_no}"));
        print!("> ");
        let _ = io::stdout().flush();
    }
    println!();
    ExitCode::SUCCESS
}
