#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses: ordered disjunctions of literals.
//!
//! For clauses of two or more literals, positions 0 and 1 are the watched
//! literals. The propagation engine permutes literals in place to keep them
//! meaningful; the clause's index in the store never changes.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use core::ops::{Index, IndexMut};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Inline capacity of a clause before it spills to the heap.
pub const INLINE_LITERALS: usize = 8;

/// A disjunction of literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    /// The literals, watched literals first.
    pub literals: SmallVec<[Literal; INLINE_LITERALS]>,
    /// Whether the clause was derived by conflict analysis.
    pub learnt: bool,
}

impl Clause {
    /// Builds an original clause from DIMACS integers.
    #[must_use]
    pub fn new(literals: &[i32]) -> Self {
        literals.iter().copied().map(Literal::from_i32).collect()
    }

    /// Builds a learned clause. The asserting literal must be at index 0.
    #[must_use]
    pub fn learnt(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
            learnt: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Literal] {
        &self.literals
    }

    /// `true` if some literal of the clause is true under `assignment`.
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.iter()
            .any(|&lit| assignment.literal_value(lit) == Some(true))
    }

    /// `true` if every literal of the clause is false under `assignment`.
    #[must_use]
    pub fn is_falsified(&self, assignment: &Assignment) -> bool {
        self.iter()
            .all(|&lit| assignment.literal_value(lit) == Some(false))
    }

    /// Literals as DIMACS integers.
    #[must_use]
    pub fn to_i32s(&self) -> Vec<i32> {
        self.iter().map(|lit| lit.to_i32()).collect()
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self {
            literals: iter.into_iter().collect(),
            learnt: false,
        }
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

impl From<Vec<i32>> for Clause {
    fn from(literals: Vec<i32>) -> Self {
        Self::new(&literals)
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        Self::new(literals)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.iter().join(","))
    }
}
