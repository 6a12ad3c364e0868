#![allow(clippy::cast_precision_loss)]

use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tinysat::sat::cnf::Cnf;
use tinysat::sat::conflict_analysis::AnalyserType;
use tinysat::sat::dimacs::{parse_file, parse_str};
use tinysat::sat::instrumentation::{Instrumentation, LogInstrumentation, NoopInstrumentation};
use tinysat::sat::pacing::{Delays, Paced, PacingControl};
use tinysat::sat::propagation::PropagatorType;
use tinysat::sat::solver::{Budget, SolveResult, SolverConfig, solve};

/// Defines the command-line interface for the tinysat application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(name = "tinysat", version, about = "A small, observable CDCL SAT solver")]
pub(crate) struct Cli {
    /// A DIMACS .cnf file, or a directory searched recursively for .cnf files.
    /// Used when no subcommand is given.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// DIMACS literals as a string (e.g. "1 -2 0\n2 3 0"). A literal `\n`
        /// is read as a line break.
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by every solving command.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log every step of the search.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check a satisfying assignment against the formula.
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and search statistics after solving.
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment as a DIMACS `v` line.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    #[arg(long, value_enum, default_value_t = PropagatorType::WatchedLiterals)]
    pub(crate) propagator: PropagatorType,

    #[arg(long, value_enum, default_value_t = AnalyserType::FirstUip)]
    pub(crate) analyser: AnalyserType,

    /// Stop with UNKNOWN after this many propagations.
    #[arg(long, default_value_t = Budget::default().max_propagations)]
    pub(crate) max_propagations: usize,

    /// Stop with UNKNOWN after this many conflicts.
    #[arg(long, default_value_t = Budget::default().max_conflicts)]
    pub(crate) max_conflicts: usize,

    /// Stop with UNKNOWN after this many seconds.
    #[arg(long, default_value_t = Budget::default().max_time.as_secs_f64())]
    pub(crate) max_time: f64,

    /// Slow the search down for watching: every event lingers for its
    /// default delay multiplied by this factor. While solving, type `p`, `r`
    /// or `q` on standard input to pause, resume or abort.
    #[arg(long)]
    pub(crate) pace: Option<f64>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        let budget = Budget::default();
        Self {
            debug: false,
            verify: true,
            stats: true,
            print_solution: false,
            propagator: PropagatorType::default(),
            analyser: AnalyserType::default(),
            max_propagations: budget.max_propagations,
            max_conflicts: budget.max_conflicts,
            max_time: budget.max_time.as_secs_f64(),
            pace: None,
        }
    }
}

impl CommonOptions {
    /// The solver configuration these options describe.
    ///
    /// # Errors
    ///
    /// If the time budget is negative or not a number.
    pub(crate) fn solver_config(&self) -> Result<SolverConfig, String> {
        let max_time = Duration::try_from_secs_f64(self.max_time)
            .map_err(|e| format!("invalid --max-time {}: {e}", self.max_time))?;
        Ok(SolverConfig {
            budget: Budget {
                max_propagations: self.max_propagations,
                max_conflicts: self.max_conflicts,
                max_time,
            },
            propagator: self.propagator,
            analyser: self.analyser,
        })
    }

    /// The instrumentation sink these options describe.
    fn sink(&self) -> Box<dyn Instrumentation> {
        let log: Box<dyn Instrumentation> = if self.debug {
            Box::new(LogInstrumentation::new())
        } else {
            Box::new(NoopInstrumentation)
        };
        match self.pace {
            Some(factor) => Box::new(Paced::with_control(
                log,
                Delays::scaled(factor),
                console_control(),
            )),
            None => log,
        }
    }
}

/// A pacing command typed on standard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    Pause,
    Resume,
    Abort,
}

impl ConsoleCommand {
    pub(crate) fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "q" | "quit" | "abort" => Some(Self::Abort),
            _ => None,
        }
    }

    pub(crate) fn apply(self, control: &PacingControl) {
        match self {
            Self::Pause => control.pause(),
            Self::Resume => control.resume(),
            Self::Abort => control.abort(),
        }
    }
}

/// Feeds commands read from `input` to `control` until the input ends.
fn drive_from_console(input: impl io::BufRead, control: &PacingControl) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        match ConsoleCommand::parse(&line) {
            Some(command) => {
                log::info!("pacing: {command:?}");
                command.apply(control);
            }
            None => log::warn!("unknown command '{}', expected p, r or q", line.trim()),
        }
    }
}

/// The pacing control shared by every paced solve of this run. The first call
/// starts a thread that drives it from standard input.
fn console_control() -> Arc<PacingControl> {
    static CONTROL: OnceLock<Arc<PacingControl>> = OnceLock::new();

    let control = CONTROL.get_or_init(|| {
        let control = PacingControl::shared();
        let handle = Arc::clone(&control);
        let spawned = thread::Builder::new()
            .name("pacing-console".to_string())
            .spawn(move || drive_from_console(io::stdin().lock(), &handle));
        match spawned {
            Ok(_) => println!("c Pacing: type p to pause, r to resume, q to abort"),
            Err(e) => log::warn!("pacing controls unavailable: {e}"),
        }
        control
    });
    Arc::clone(control)
}

/// Solves a single DIMACS file, or every `.cnf` file below a directory.
///
/// # Errors
///
/// If the path does not exist, or a file cannot be read or parsed.
pub(crate) fn solve_path(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if path.is_dir() {
        solve_dir(path, common)
    } else if path.is_file() {
        solve_file(path, common)
    } else {
        Err(format!("No such file or directory: {}", path.display()))
    }
}

/// Solves every `.cnf` file below `path`.
///
/// # Errors
///
/// If any file cannot be read or parsed.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            log::debug!("Skipping non-CNF file: {}", file_path.display());
            continue;
        }
        solve_file(file_path, common)?;
    }

    Ok(())
}

/// Parses and solves one DIMACS file.
///
/// # Errors
///
/// If the file cannot be read or parsed.
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<(), String> {
    let time = Instant::now();
    let cnf = parse_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let parse_time = time.elapsed();

    solve_and_report(&cnf, common, Some(path), parse_time)
}

/// Parses and solves DIMACS text given on the command line.
///
/// # Errors
///
/// If the text is not valid DIMACS.
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> Result<(), String> {
    let time = Instant::now();
    let cnf = parse_str(&input.replace("\\n", "\n")).map_err(|e| e.to_string())?;
    let parse_time = time.elapsed();

    solve_and_report(&cnf, common, None, parse_time)
}

/// Solves `cnf` and prints the status line, then optionally the model,
/// the verification result and the statistics table.
///
/// # Errors
///
/// If the options are invalid, or a model fails verification.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<(), String> {
    let config = common.solver_config()?;

    if let Some(name) = label {
        println!("c Solving: {}", name.display());
    }
    log::debug!(
        "{} variables, {} clauses, {} literals",
        cnf.num_vars,
        cnf.len(),
        cnf.num_literals()
    );

    let mut sink = common.sink();
    let result = solve(cnf, &config, &mut sink);
    let (allocated_mib, resident_mib) = memory_usage();

    println!("s {}", result.status);
    if let Some(reason) = result.stop_reason {
        println!("c Stopped: {reason}");
    }

    if common.print_solution {
        if let Some(model) = &result.model {
            println!("{model}");
        }
    }

    if common.stats {
        print_stats(parse_time, cnf, &result, allocated_mib, resident_mib);
    }

    if common.verify {
        verify_solution(cnf, &result)?;
    }

    Ok(())
}

/// Checks a satisfying assignment against the original formula.
///
/// # Errors
///
/// If the model falsifies a clause.
pub(crate) fn verify_solution(cnf: &Cnf, result: &SolveResult) -> Result<(), String> {
    let Some(model) = &result.model else {
        return Ok(());
    };
    if cnf.verify(model) {
        println!("c Verified: true");
        Ok(())
    } else {
        Err("Solution failed verification!".to_string())
    }
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> (f64, f64) {
    let _ = epoch::advance();
    let read = |mib: Result<usize, tikv_jemalloc_ctl::Error>| mib.unwrap_or(0) as f64 / (1024.0 * 1024.0);
    (
        read(stats::allocated::read()),
        read(stats::resident::read()),
    )
}

/// Prints a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("c |  {label:<28} {value:>18}  |");
}

/// Prints a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("c |  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    cnf: &Cnf,
    result: &SolveResult,
    allocated: f64,
    resident: f64,
) {
    let s = &result.stats;
    let elapsed_secs = s.elapsed.as_secs_f64();

    println!("c =======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.len());
    stat_line("Literals (original)", cnf.num_literals());

    println!("c ========================[ Search Statistics ]=========================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("c ======================================================================");
}
