use std::io;

use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    diagnostics::{Result, VmError},
    node::Flow,
    runtime::Interpreter,
};

/// Line-at-a-time driver over a shared interpreter. Each line is its own input
/// source: a failure abandons the line, not the session.
pub struct Repl {
    interpreter: Interpreter,
}

impl Repl {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Feeds one line to the interpreter. Returns `Flow::Halt` once the machine
    /// asked to stop.
    pub fn feed(&mut self, line: &str, out: &mut dyn io::Write) -> Result<Flow> {
        self.interpreter.run_source(line, out)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .map_err(|err| VmError::from(io::Error::new(io::ErrorKind::Other, err)))?;
        let mut stdout = io::stdout();
        loop {
            match editor.readline("ok> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == ":quit" || trimmed == ":exit" {
                        break;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    match self.feed(trimmed, &mut stdout) {
                        Ok(Flow::Halt) => break,
                        Ok(_) => {}
                        Err(VmError::Diagnostic(diag)) => eprintln!("{diag}"),
                        Err(other) => eprintln!("error: {other}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    return Err(VmError::from(io::Error::new(io::ErrorKind::Other, err)));
                }
            }
        }
        Ok(())
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
