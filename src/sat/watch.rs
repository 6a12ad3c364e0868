#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The watch index.
//!
//! For every literal `L` the index lists the clauses in which `¬L` occurs, so
//! that when `L` becomes true the propagation engine only inspects clauses
//! that may have lost a literal. Every literal of every clause is registered,
//! not just the two watched positions; the two-watched-literal engine uses
//! positions 0 and 1 to decide cheaply whether a visited clause needs work.
//!
//! Entries start empty and only grow, one registration per clause literal.

use crate::sat::clause::Clause;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchIndex(Vec<SmallVec<[usize; 6]>>);

impl WatchIndex {
    /// Empty entries for every literal over `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![SmallVec::new(); 2 * (num_vars + 1)])
    }

    /// Registers clause `idx` under `¬L` for every literal `L` in `clause`.
    pub fn add_clause(&mut self, clause: &Clause, idx: usize) {
        for &lit in clause.iter() {
            let slot = (!lit).index();
            if slot >= self.0.len() {
                self.0.resize(slot + 2, SmallVec::new());
            }
            self.0[slot].push(idx);
        }
    }

    /// Clauses that contain `¬lit`.
    #[must_use]
    pub fn watchers(&self, lit: Literal) -> &[usize] {
        self.0.get(lit.index()).map_or(&[][..], SmallVec::as_slice)
    }

    /// Total number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().map(SmallVec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(SmallVec::is_empty)
    }
}

impl Index<Literal> for WatchIndex {
    type Output = [usize];

    fn index(&self, index: Literal) -> &Self::Output {
        self.watchers(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_under_negation() {
        let mut watches = WatchIndex::new(3);
        watches.add_clause(&Clause::new(&[1, -2, 3]), 0);
        watches.add_clause(&Clause::new(&[-1]), 1);

        assert_eq!(watches[Literal::from(-1)], [0]);
        assert_eq!(watches[Literal::from(2)], [0]);
        assert_eq!(watches[Literal::from(1)], [1]);
        assert!(watches[Literal::from(-3)].contains(&0));
        assert!(watches[Literal::from(3)].is_empty());
        assert_eq!(watches.len(), 4);
    }

    #[test]
    fn test_unknown_literal_has_no_watchers() {
        let watches = WatchIndex::new(1);
        assert!(watches.watchers(Literal::from(9)).is_empty());
        assert!(watches.is_empty());
    }

    #[test]
    fn test_grows_for_new_variables() {
        let mut watches = WatchIndex::new(1);
        watches.add_clause(&Clause::new(&[5]), 0);
        assert_eq!(watches[Literal::from(-5)], [0]);
    }
}
