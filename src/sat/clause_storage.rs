#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause store: every original and learned clause, append-only.
//!
//! Clauses are addressed by their index, which never changes. Original clauses
//! occupy `0..num_original()`, learned clauses follow in the order they were
//! derived.

use crate::sat::clause::Clause;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClauseStore {
    clauses: Vec<Clause>,
    num_original: usize,
}

impl ClauseStore {
    #[must_use]
    pub fn new(original: Vec<Clause>) -> Self {
        let num_original = original.len();
        Self {
            clauses: original,
            num_original,
        }
    }

    /// Appends `clause` and returns its index.
    pub fn push(&mut self, clause: Clause) -> usize {
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub const fn num_original(&self) -> usize {
        self.num_original
    }

    #[must_use]
    pub fn num_learnt(&self) -> usize {
        self.clauses.len() - self.num_original
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Original clauses with their indices.
    pub fn original(&self) -> impl Iterator<Item = (usize, &Clause)> {
        self.clauses.iter().take(self.num_original).enumerate()
    }

    /// Learned clauses, oldest first.
    pub fn learnt(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().skip(self.num_original)
    }
}

impl Index<usize> for ClauseStore {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl IndexMut<usize> for ClauseStore {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Literal;

    #[test]
    fn test_learnt_clauses_are_appended() {
        let mut store = ClauseStore::new(vec![Clause::new(&[1, 2]), Clause::new(&[-1])]);
        assert_eq!(store.num_original(), 2);

        let idx = store.push(Clause::learnt([Literal::from(2)]));
        assert_eq!(idx, 2);
        assert_eq!(store.num_learnt(), 1);
        assert!(store[idx].learnt);
        assert_eq!(store.original().count(), 2);
        assert_eq!(store.learnt().count(), 1);
    }
}
