// ABOUTME: Compiler diagnostic sink shared by the lexer, parser, resolver, and interpreter

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub line: Option<u32>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{:<7} [ line {:>5} ] {}", self.level, line, self.message),
            None => write!(f, "{:<7} [            ] {}", self.level, self.message),
        }
    }
}

/// Accumulates diagnostics across the lexer/parser/resolver/interpreter phases.
///
/// Mirrors the source's `Logger`: a running count per level, and a Fatal
/// marker synthesized once a phase has recorded at least one Error.
#[derive(Debug, Default)]
pub struct Diagnostics {
    log: Vec<Diagnostic>,
    counts: [usize; 5],
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn record(&mut self, level: Level, line: Option<u32>, message: impl Into<String>) {
        let message = message.into();
        log::debug!("diagnostic: {} {:?} {}", level, line, message);
        self.counts[level as usize] += 1;
        self.log.push(Diagnostic {
            level,
            line,
            message,
        });
    }

    pub fn error(&mut self, line: u32, message: impl Into<String>) {
        self.record(Level::Error, Some(line), message);
    }

    pub fn warning(&mut self, line: u32, message: impl Into<String>) {
        self.record(Level::Warning, Some(line), message);
    }

    pub fn count(&self, level: Level) -> usize {
        self.counts[level as usize]
    }

    pub fn has_fatal(&self) -> bool {
        self.count(Level::Fatal) > 0
    }

    /// Records a Fatal marker if the current phase produced any Errors.
    /// `phase_name` is used verbatim in the message, e.g. "parsing".
    pub fn finish_phase(&mut self, phase_name: &str) {
        if self.count(Level::Error) > 0 {
            self.record(Level::Fatal, None, format!("Bad {}.", phase_name));
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.log
    }

    pub fn print_summary(&self, mut writer: impl std::io::Write) {
        let _ = writeln!(
            writer,
            "\n===== Total: warnings: {}, errors: {} =====",
            self.count(Level::Warning),
            self.count(Level::Error)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_is_synthesized_after_an_error() {
        let mut diags = Diagnostics::new();
        diags.error(3, "bad token");
        assert!(!diags.has_fatal());
        diags.finish_phase("parsing");
        assert!(diags.has_fatal());
    }

    #[test]
    fn clean_phase_has_no_fatal() {
        let mut diags = Diagnostics::new();
        diags.warning(1, "unterminated comment");
        diags.finish_phase("lexing");
        assert!(!diags.has_fatal());
        assert_eq!(diags.count(Level::Warning), 1);
    }

    #[test]
    fn counts_accumulate_across_levels() {
        let mut diags = Diagnostics::new();
        diags.error(1, "a");
        diags.error(2, "b");
        diags.warning(3, "c");
        assert_eq!(diags.count(Level::Error), 2);
        assert_eq!(diags.count(Level::Warning), 1);
    }
}
