// ABOUTME: Version, banner, and REPL constants

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Rei v1.0";
pub const WELCOME_SUBTITLE: &str = "A tree-walking interpreter for a small Lox-family language";

/// Printed before each REPL read.
pub const REPL_PROMPT: &str = "rei> ";

/// Line history file, resolved relative to the user's home directory by the
/// REPL driver in `main.rs`.
pub const HISTORY_FILE: &str = ".rei_history";

/// Typing this at the REPL exits the process with status 0.
pub const QUIT_SENTINEL: &str = "q!";
