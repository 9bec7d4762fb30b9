//! Interactive read-eval-print loop
//!
//! Each line is parsed as a program and evaluated against one global
//! environment that lives for the whole session, so bindings carry over
//! from line to line.

use miette::{IntoDiagnostic, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ast::{Accept, Printer};
use crate::config::Config;
use crate::diagnostics::SourceFile;
use crate::interp::{Environment, Evaluator};

const HELP: &str = "\
Commands:
  :help, :h     Show this help
  :quit, :q     Exit the REPL
  :env          List global bindings
  :ast <src>    Parse <src> and print it back
  :reset        Discard all bindings";

/// What the loop should do after a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading; print the text if any
    Continue(Option<String>),
    Quit,
}

/// Session state, independent of the terminal
pub struct Session {
    env: Environment,
    evaluator: Evaluator,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            env: Environment::new(),
            evaluator: Evaluator::with_config(config.eval.clone()),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Handle one line of input
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Outcome::Continue(None);
        }

        match trimmed {
            ":quit" | ":q" => Outcome::Quit,
            ":help" | ":h" => Outcome::Continue(Some(HELP.to_string())),
            ":env" => Outcome::Continue(Some(self.describe_env())),
            ":reset" => {
                self.env.release();
                self.env = Environment::new();
                Outcome::Continue(None)
            }
            ":ast" => Outcome::Continue(Some("usage: :ast <source>".to_string())),
            _ if trimmed.starts_with(":ast ") => {
                let src = &trimmed[5..];
                let text = match crate::parse_source(&SourceFile::anonymous(src)) {
                    Ok(program) => program.accept(&mut Printer, &()),
                    Err(err) => format!("{:?}", miette::Report::new(err)),
                };
                Outcome::Continue(Some(text))
            }
            _ if trimmed.starts_with(':') => {
                Outcome::Continue(Some(format!("Unknown command `{}`; try :help", trimmed)))
            }
            _ => Outcome::Continue(self.eval_line(trimmed)),
        }
    }

    fn eval_line(&mut self, src: &str) -> Option<String> {
        let program = match crate::parse_source(&SourceFile::anonymous(src)) {
            Ok(program) => program,
            Err(err) => return Some(format!("{:?}", miette::Report::new(err))),
        };
        match self.evaluator.evaluate_in(&program, &self.env) {
            Ok(value) if value.is_unit() => None,
            Ok(value) => Some(value.to_string()),
            Err(err) => Some(format!(
                "{:?}",
                miette::Report::new(err).with_source_code(src.to_string())
            )),
        }
    }

    fn describe_env(&self) -> String {
        let bindings = self.env.bindings();
        if bindings.is_empty() {
            return "(no bindings)".to_string();
        }
        bindings
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.env.release();
    }
}

/// Run the interactive loop on the terminal
pub fn run(config: &Config) -> Result<()> {
    println!("SMPL REPL v{}", crate::VERSION);
    println!("Type :help for help, :quit to exit");
    println!();

    let mut editor = DefaultEditor::new().into_diagnostic()?;
    if let Some(path) = &config.repl.history_file {
        // A missing history file is normal on first start
        if editor.load_history(path).is_err() {
            tracing::debug!("no history loaded from {}", path.display());
        }
    }

    let mut session = Session::new(config);
    loop {
        match editor.readline(&config.repl.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str()).into_diagnostic()?;
                }
                match session.handle_line(&line) {
                    Outcome::Quit => break,
                    Outcome::Continue(Some(text)) => println!("{}", text),
                    Outcome::Continue(None) => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).into_diagnostic(),
        }
    }

    if let Some(path) = &config.repl.history_file {
        editor.save_history(path).into_diagnostic()?;
    }
    println!("Goodbye!");
    Ok(())
}
