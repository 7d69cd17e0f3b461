use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;

use ember_lox::scanner::{Scanner, TokenKind};
use ember_lox::vm::{Vm, compile, disassemble};

/// sysexits-style process exit codes.
mod exits {
    pub const USAGE: u8 = 64;
    pub const COMPILE: u8 = 65;
    pub const RUNTIME: u8 = 70;
    pub const IO: u8 = 74;
}

#[derive(Parser, Debug)]
#[command(name = "ember-lox", about = "A bytecode compiler and VM for the Lox language")]
struct Cli {
    /// Lox source file to run (omit for REPL)
    file: Option<PathBuf>,

    /// Dump tokens and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Compile and print the chunk disassembly instead of running
    #[arg(long)]
    disassemble: bool,

    /// Trace each instruction and the stack to stderr while running
    #[arg(long)]
    trace: bool,
}

fn read_source(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read source file '{}'", path.display()))
}

fn report_compile_errors(errors: &[ember_lox::CompileError]) {
    for error in errors {
        eprintln!("{error}");
    }
}

/// Print the token stream; returns true if the scanner produced any
/// `Error` token.
fn dump_tokens(source: &str) -> bool {
    let mut scanner = Scanner::new(source);
    let mut had_error = false;
    loop {
        let token = scanner.scan_token();
        println!("{token}");
        match token.kind {
            TokenKind::Error => had_error = true,
            TokenKind::Eof => break,
            _ => {}
        }
    }
    had_error
}

fn run_file(cli: &Cli, path: &PathBuf) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(exits::IO);
        }
    };

    if cli.dump_tokens {
        return if dump_tokens(&source) {
            ExitCode::from(exits::COMPILE)
        } else {
            ExitCode::SUCCESS
        };
    }

    let chunk = match compile(&source) {
        Ok(chunk) => chunk,
        Err(errors) => {
            report_compile_errors(&errors);
            return ExitCode::from(exits::COMPILE);
        }
    };

    if cli.disassemble {
        print!("{}", disassemble(&chunk, &path.display().to_string()));
        return ExitCode::SUCCESS;
    }

    let mut vm = Vm::new();
    if cli.trace {
        vm = vm.with_trace();
    }
    match vm.interpret(chunk) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(exits::RUNTIME)
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exits::USAGE);
        }
    };

    match cli.file {
        Some(ref path) => run_file(&cli, path),
        None if cli.dump_tokens || cli.disassemble => {
            eprintln!("error: a source file is required for --dump-tokens and --disassemble");
            ExitCode::from(exits::USAGE)
        }
        None => {
            ember_lox::repl::run_repl();
            ExitCode::SUCCESS
        }
    }
}
