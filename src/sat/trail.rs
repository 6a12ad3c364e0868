#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The assignment trail.
//!
//! The trail owns the current assignment together with, for every assigned
//! variable, the decision level it was assigned at and the reason it was
//! assigned. Literals are recorded in chronological order, which is the order
//! conflict analysis walks backwards and the order backjumping undoes.
//!
//! The suffix of the trail that has not been handed to the propagation engine
//! yet is the pending queue: every push enqueues, and the engine drains it by
//! advancing `curr_idx`.

use crate::sat::assignment::{Assignment, Model};
use crate::sat::literal::{Literal, Variable};
use std::ops::Index;

/// Why a variable holds its value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    /// A branching choice. Empty reason.
    #[default]
    Decision,
    /// A unit clause of the input formula, asserted at level 0. Empty reason:
    /// these are axioms, not consequences of the search. Holds the clause index.
    Unit(usize),
    /// Forced by the clause at this index of the clause store.
    Clause(usize),
}

impl Reason {
    /// The index of the antecedent clause, if the reason is not empty.
    #[must_use]
    pub const fn clause(self) -> Option<usize> {
        match self {
            Self::Clause(idx) => Some(idx),
            Self::Decision | Self::Unit(_) => None,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.clause().is_none()
    }
}

/// One assigned literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub lit: Literal,
    pub decision_level: usize,
    pub reason: Reason,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    t: Vec<Step>,
    /// Index of the first literal not yet handed to propagation.
    pub curr_idx: usize,
    assignment: Assignment,
    level: Vec<usize>,
    reason: Vec<Reason>,
    decision_level: usize,
}

impl Index<usize> for Trail {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl Trail {
    /// An empty trail over variables `1..=num_vars`, at decision level 0.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            curr_idx: 0,
            assignment: Assignment::new(num_vars),
            level: vec![0; num_vars + 1],
            reason: vec![Reason::Decision; num_vars + 1],
            decision_level: 0,
        }
    }

    #[must_use]
    pub const fn decision_level(&self) -> usize {
        self.decision_level
    }

    /// Opens a new decision level. The decision literal is pushed afterwards.
    pub const fn new_decision_level(&mut self) {
        self.decision_level += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.t.iter()
    }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[must_use]
    pub fn value(&self, lit: Literal) -> Option<bool> {
        self.assignment.literal_value(lit)
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.assignment.is_assigned(var)
    }

    /// Decision level of an assigned variable.
    #[must_use]
    pub fn level(&self, var: Variable) -> usize {
        self.level[var as usize]
    }

    /// Reason of an assigned variable.
    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.reason[var as usize]
    }

    /// Assigns `lit` at the current decision level and enqueues it.
    ///
    /// The variable must be unassigned.
    pub fn push(&mut self, lit: Literal, reason: Reason) {
        let var = lit.variable();
        debug_assert!(
            !self.assignment.is_assigned(var),
            "variable {var} pushed twice onto the trail"
        );
        debug_assert!(
            self.t
                .last()
                .is_none_or(|s| s.decision_level <= self.decision_level),
            "trail levels must be non-decreasing"
        );

        self.assignment.assign(lit);
        self.level[var as usize] = self.decision_level;
        self.reason[var as usize] = reason;
        self.t.push(Step {
            lit,
            decision_level: self.decision_level,
            reason,
        });
    }

    /// Undoes, newest first, every assignment above `level`, then makes
    /// `level` the current decision level. Level-0 facts are never removed.
    ///
    /// Returns the number of literals removed.
    pub fn backstep_to(&mut self, level: usize) -> usize {
        debug_assert!(
            level <= self.decision_level,
            "cannot backjump forward from {} to {level}",
            self.decision_level
        );

        let before = self.t.len();
        while let Some(step) = self.t.last() {
            if step.decision_level <= level {
                break;
            }
            let var = step.lit.variable();
            self.assignment.unassign(var);
            self.level[var as usize] = 0;
            self.reason[var as usize] = Reason::Decision;
            self.t.pop();
        }

        self.curr_idx = self.curr_idx.min(self.t.len());
        self.decision_level = level;
        before - self.t.len()
    }

    /// Hands the next pending literal to propagation.
    pub fn next_pending(&mut self) -> Option<Literal> {
        let step = self.t.get(self.curr_idx)?;
        self.curr_idx += 1;
        Some(step.lit)
    }

    /// Abandons every pending literal.
    pub fn clear_pending(&mut self) {
        self.curr_idx = self.t.len();
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.curr_idx < self.t.len()
    }

    /// The lowest-indexed unassigned variable.
    #[must_use]
    pub fn first_unassigned(&self) -> Option<Variable> {
        self.assignment.first_unassigned()
    }

    #[must_use]
    pub fn model(&self) -> Model {
        self.assignment.to_model()
    }
}
