#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A reader for the DIMACS CNF format.
//!
//! The format is line oriented at the top level:
//! - lines starting with `c` are comments,
//! - a line starting with `p` is the problem header, `p cnf <vars> <clauses>`,
//! - a line starting with `%` ends the data (some benchmark sets append junk),
//! - every other line contributes whitespace-separated literals.
//!
//! Literals form one token stream: a clause ends at the `0` sentinel, not at
//! the end of the line, so clauses may span lines and a line may hold several
//! clauses. A final clause missing its `0` is accepted. A `0` on its own is the
//! empty clause and is kept, since it makes the formula unsatisfiable.
//!
//! The header is informational. The variable count of the resulting [`Cnf`] is
//! always the largest variable actually used; a disagreeing header is only
//! logged.

use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

const LOG_TARGET: &str = "dimacs";

/// Errors raised while reading DIMACS input.
#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: '{token}' is not a literal")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: malformed problem line '{text}'")]
    MalformedHeader { line: usize, text: String },
}

/// The declared sizes from a `p cnf` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    vars: usize,
    clauses: usize,
}

fn parse_header(text: &str, line: usize) -> Result<Header, DimacsError> {
    let malformed = || DimacsError::MalformedHeader {
        line,
        text: text.to_string(),
    };

    let mut parts = text.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("p"), Some("cnf")) => {}
        _ => return Err(malformed()),
    }
    let vars = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let clauses = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    Ok(Header { vars, clauses })
}

/// Parses DIMACS text from `reader`.
///
/// # Errors
///
/// [`DimacsError::Io`] if reading fails, [`DimacsError::InvalidLiteral`] for a
/// token that is not an integer, [`DimacsError::MalformedHeader`] for a `p`
/// line that is not `p cnf <vars> <clauses>`.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, DimacsError> {
    let mut cnf = Cnf::default();
    let mut header = None;
    let mut current: Vec<Literal> = Vec::new();
    let mut open = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim_start();

        match trimmed.chars().next() {
            None | Some('c') => continue,
            Some('%') => break,
            Some('p') => {
                header = Some(parse_header(trimmed, line_no)?);
                continue;
            }
            Some(_) => {}
        }

        for token in trimmed.split_whitespace() {
            // `i32::MIN` has no negation, so it cannot be a literal.
            let value = token
                .parse::<i32>()
                .ok()
                .filter(|&v| v != i32::MIN)
                .ok_or_else(|| DimacsError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })?;

            if value == 0 {
                cnf.add_clause(current.drain(..).collect::<Clause>());
                open = false;
            } else {
                current.push(Literal::from_i32(value));
                open = true;
            }
        }
    }

    if open {
        cnf.add_clause(current.into_iter().collect::<Clause>());
    }

    if let Some(h) = header {
        if h.vars != cnf.num_vars || h.clauses != cnf.len() {
            log::warn!(
                target: LOG_TARGET,
                "header declares {} variables and {} clauses, found {} and {}",
                h.vars,
                h.clauses,
                cnf.num_vars,
                cnf.len()
            );
        }
    }

    Ok(cnf)
}

/// Parses DIMACS text held in memory.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_str(text: &str) -> Result<Cnf, DimacsError> {
    parse_dimacs(text.as_bytes())
}

/// Opens and parses a DIMACS file.
///
/// # Errors
///
/// See [`parse_dimacs`]; also fails if the file cannot be opened.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, DimacsError> {
    let file = std::fs::File::open(path)?;
    parse_dimacs(io::BufReader::new(file))
}
