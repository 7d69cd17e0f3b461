use std::io::{self, BufRead, Write};

use crate::vm::{Vm, compile};

/// Run the interactive REPL. One VM lives for the whole session, so global
/// definitions accumulate across lines.
pub fn run_repl() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut vm = Vm::new();

    loop {
        print!("> ");
        stdout.flush().expect("flush stdout");

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // Ctrl-D / EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Auto-wrap bare expressions: if the line doesn't end with ';' or '}',
        // wrap it as `print <expr>;` so the user sees the result.
        let source = if is_bare_expression(trimmed) {
            format!("print {trimmed};")
        } else {
            trimmed.to_string()
        };

        let chunk = match compile(&source) {
            Ok(chunk) => chunk,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{e}");
                }
                continue;
            }
        };

        if let Err(e) = vm.interpret(chunk) {
            eprintln!("{e}");
        }
    }
}

/// Heuristic: treat the line as a bare expression if it doesn't end with
/// ';' or '}' and doesn't start with a keyword that begins a statement.
fn is_bare_expression(line: &str) -> bool {
    if line.ends_with(';') || line.ends_with('}') {
        return false;
    }
    let first_word = line.split_whitespace().next().unwrap_or("");
    !matches!(first_word, "var" | "if" | "while" | "for" | "print" | "{")
}
