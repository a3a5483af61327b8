// ABOUTME: Error taxonomy for runtime failures and host-level (CLI) failures

use thiserror::Error;

/// Errors raised while evaluating a resolved program. Carries only the
/// message; the interpreter pairs it with the current source line before
/// handing it to the diagnostic sink.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("{0}")]
    TypeMismatch(String),

    #[error("Expected {expected} argument{}, got {actual}.", if *expected == 1 { "" } else { "s" })]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),

    #[error("Can only call functions and classes.")]
    NotCallable,

    #[error("Only instances have properties.")]
    NotInstance,

    #[error("'break' outside a loop.")]
    BreakOutsideLoop,

    #[error("'continue' outside a loop.")]
    ContinueOutsideLoop,

    #[error("'return' outside a function.")]
    ReturnOutsideFunction,
}

impl From<String> for RuntimeError {
    fn from(message: String) -> Self {
        RuntimeError::TypeMismatch(message)
    }
}

/// Failures that occur outside the language itself: reading the script file
/// named on the command line. The only error class that sets a nonzero exit
/// code (see §6 of the external-interface contract).
#[derive(Error, Debug)]
pub enum HostError {
    #[error("could not read '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
