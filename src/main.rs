use clap::Parser as ClapParser;
use rei::config::{HISTORY_FILE, QUIT_SENTINEL, REPL_PROMPT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use rei::error::HostError;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// A tree-walking interpreter for a small dynamically-typed scripting language
#[derive(ClapParser, Debug)]
#[command(name = "rei")]
#[command(version = VERSION)]
#[command(about = "A tree-walking interpreter in the Lox family")]
struct CliArgs {
    /// Script file to execute. With none, starts the REPL.
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = CliArgs::parse();

    let result = match args.script {
        Some(path) => run_file(&path),
        None => {
            run_prompt();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run_file(path: &PathBuf) -> Result<(), HostError> {
    let contents = std::fs::read_to_string(path).map_err(|source| HostError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("running script {}", path.display());
    run_and_report(&contents);
    Ok(())
}

fn run_prompt() {
    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {}", e);
            return;
        }
    };

    let history_path = history_file_path();
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline(REPL_PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == QUIT_SENTINEL {
                    break;
                }
                log::info!("repl: running line");
                run_and_report(line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
}

fn history_file_path() -> PathBuf {
    match dirs_home() {
        Some(home) => home.join(HISTORY_FILE),
        None => PathBuf::from(HISTORY_FILE),
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Runs one program through the full pipeline and prints the diagnostic
/// summary. The REPL creates a fresh interpreter (and thus fresh globals)
/// for every line, per the per-entry global-state contract.
fn run_and_report(source: &str) {
    let diags = rei::run(source);
    for entry in diags.entries() {
        eprintln!("{}", entry);
    }
    diags.print_summary(std::io::stdout());
}
