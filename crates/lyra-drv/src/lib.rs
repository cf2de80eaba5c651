//! lyra-drv - Interpreter driver.
//!
//! Orchestrates the pipeline for one script: read the file, scan, parse,
//! then either execute the program or pretty-print its AST. Diagnostics
//! from every stage flow through a single [`Handler`] wired to standard
//! error; any reported error maps to a non-zero process exit in the
//! binary.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use lyra_interp::{Bindings, Interpreter};
use lyra_lex::Scanner;
use lyra_par::{print_ast, Parser};
use lyra_util::Handler;

/// What the driver produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmitMode {
    /// Execute the program
    #[default]
    Run,
    /// Pretty-print the AST instead of executing
    Ast,
}

/// Driver configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Script path
    pub input: PathBuf,

    /// What to produce
    pub emit: EmitMode,

    /// Verbose phase logging
    pub verbose: bool,
}

/// Driver failure.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scan or parse error was reported through the diagnostic sink
    #[error("parsing failed")]
    ParseFailed,

    /// A runtime error was reported through the diagnostic sink
    #[error("execution failed")]
    RunFailed,
}

/// State for one interpreter invocation.
pub struct Session {
    config: Config,
    handler: Handler,
}

impl Session {
    /// Create a session reporting diagnostics to standard error.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: Handler::stderr(),
        }
    }

    /// Create a session with a custom diagnostic handler.
    pub fn with_handler(config: Config, handler: Handler) -> Self {
        Self { config, handler }
    }

    /// Diagnostics collected so far.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Run the pipeline: read, scan, parse, then execute or print.
    ///
    /// The binding registry must be fully populated before this call and
    /// is not mutated during the run.
    pub fn run(&mut self, bindings: &Bindings) -> Result<(), DriverError> {
        let source = fs::read_to_string(&self.config.input).map_err(|source| DriverError::Io {
            path: self.config.input.clone(),
            source,
        })?;

        debug!(path = %self.config.input.display(), bytes = source.len(), "scanning");
        let tokens = Scanner::new(&source).scan();
        debug!(tokens = tokens.len(), "parsing");

        let Some(ast) = Parser::new(tokens, &self.handler).parse() else {
            return Err(DriverError::ParseFailed);
        };
        debug!(statements = ast.len(), "parsed");

        match self.config.emit {
            EmitMode::Ast => {
                print!("{}", print_ast(&ast));
                Ok(())
            }
            EmitMode::Run => {
                let mut interpreter = Interpreter::new(bindings, &self.handler);
                if interpreter.run(&ast) {
                    Ok(())
                } else {
                    Err(DriverError::RunFailed)
                }
            }
        }
    }
}
