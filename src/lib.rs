// ABOUTME: Library module exposing internal components for testing

pub mod ast;
pub mod builtins;
pub mod callable;
pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;
pub mod value;

use diagnostics::Diagnostics;
use interpreter::Interpreter;

/// Runs one program's worth of source through the whole pipeline: lex,
/// parse, resolve, interpret. Each phase short-circuits the next once it has
/// recorded a Fatal diagnostic. Returns the accumulated diagnostics so the
/// caller (CLI driver or tests) can inspect or print them. `print` writes to
/// the process's real stdout; see [`run_to_writer`] to capture it instead.
pub fn run(source: &str) -> Diagnostics {
    run_to_writer(source, Box::new(std::io::stdout()))
}

/// Same pipeline as [`run`], but `print` writes to the given sink. Used by
/// integration tests to assert on a program's captured output.
pub fn run_to_writer(source: &str, stdout: Box<dyn std::io::Write>) -> Diagnostics {
    let mut diags = Diagnostics::new();

    let tokens = lexer::Lexer::new(source).scan_tokens(&mut diags);
    diags.finish_phase("lexing");
    if diags.has_fatal() {
        return diags;
    }

    let statements = parser::Parser::new(tokens).parse(&mut diags);
    if diags.has_fatal() {
        return diags;
    }

    let locals = resolver::Resolver::new(&mut diags).resolve(&statements);
    if diags.has_fatal() {
        return diags;
    }

    let mut interpreter = Interpreter::with_stdout(locals, stdout);
    interpreter.interpret(&statements, &mut diags);
    diags
}
