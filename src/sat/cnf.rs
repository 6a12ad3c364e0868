#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Formulas in conjunctive normal form.

use crate::sat::assignment::Model;
use crate::sat::clause::Clause;
use crate::sat::literal::Literal;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A formula: a conjunction of clauses over variables `1..=num_vars`.
///
/// `num_vars` is the largest variable that occurs in any clause. Variables
/// below it that never occur are legal and simply unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    pub clauses: Vec<Clause>,
    pub num_vars: usize,
}

impl Cnf {
    /// Builds a formula from clauses written as DIMACS integers.
    ///
    /// # Panics
    ///
    /// If any literal is `0`.
    pub fn new<I, C>(clauses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        clauses
            .into_iter()
            .map(|c| c.into_iter().map(Literal::from_i32).collect::<Clause>())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.iter().map(Clause::len).sum()
    }

    /// `true` if the formula contains the empty clause and is therefore
    /// unsatisfiable without search.
    #[must_use]
    pub fn has_empty_clause(&self) -> bool {
        self.iter().any(Clause::is_empty)
    }

    pub fn add_clause(&mut self, clause: Clause) {
        let max_var = clause
            .iter()
            .map(|l| l.variable() as usize)
            .max()
            .unwrap_or(0);
        self.num_vars = self.num_vars.max(max_var);
        self.clauses.push(clause);
    }

    /// `true` if every clause has a literal that holds in `model`.
    #[must_use]
    pub fn verify(&self, model: &Model) -> bool {
        self.iter()
            .all(|clause| clause.iter().any(|&lit| model.satisfies(lit)))
    }
}

impl FromIterator<Clause> for Cnf {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        let mut cnf = Self::default();
        for clause in iter {
            cnf.add_clause(clause);
        }
        cnf
    }
}

impl From<Vec<Vec<i32>>> for Cnf {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        Self::new(clauses)
    }
}

impl Display for Cnf {
    /// DIMACS text, header included.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            if clause.is_empty() {
                writeln!(f, "0")?;
            } else {
                writeln!(f, "{} 0", clause.iter().join(" "))?;
            }
        }
        Ok(())
    }
}
