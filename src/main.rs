//! # tinysat
//!
//! `tinysat` is a command-line front end for a small conflict-driven
//! clause-learning SAT solver. It reads problems in DIMACS CNF format, from a
//! file, a directory of files or the command line, and prints the result in
//! the usual competition style:
//!
//! ```text
//! s SATISFIABLE
//! v 1 -2 3 0
//! ```
//!
//! ## Usage
//!
//! ```sh
//! tinysat problem.cnf
//! tinysat benchmarks/ --stats false
//! tinysat file --path problem.cnf --propagator unit-search --analyser all-decisions
//! tinysat text --input "1 -2 0\n2 0" --print-solution
//! tinysat problem.cnf --debug --pace 0.2
//! tinysat completions zsh
//! ```
//!
//! `--debug` narrates every decision, conflict, learned clause and backjump
//! through the logger (`RUST_LOG` takes precedence), and `--pace` slows the
//! search down so it can be followed. Budgets (`--max-propagations`,
//! `--max-conflicts`, `--max-time`) turn a long search into `s UNKNOWN`.

mod command_line;

use clap::{CommandFactory, Parser};
use command_line::cli::{Cli, Commands, CommonOptions, solve_path, solve_text};

/// Global allocator using `tikv-jemallocator`, which also provides the memory
/// statistics.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logger(common: &CommonOptions) {
    let default = if common.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Some(Commands::File { path, common }) => {
            init_logger(&common);
            solve_path(&path, &common)
        }
        Some(Commands::Text { input, common }) => {
            init_logger(&common);
            solve_text(&input, &common)
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            init_logger(&cli.common);
            let Some(path) = cli.path else {
                return Err("No command provided. Use --help for more information.".to_string());
            };
            solve_path(&path, &cli.common)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
