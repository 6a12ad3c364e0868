#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Per-variable truth values and the model reported for satisfiable formulas.

use crate::sat::literal::{Literal, Variable};
use core::ops::Index;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// The value of a single variable.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Truth values of variables `1..=N`. Slot 0 is never used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl Assignment {
    /// All `num_vars` variables unassigned.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    /// Number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len() - 1
    }

    /// Makes `lit` true.
    pub fn assign(&mut self, lit: Literal) {
        self.0[lit.variable() as usize] = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        self.0[var as usize] = VarState::Unassigned;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.0.get(var as usize).copied().and_then(VarState::value)
    }

    /// `Some(true)` if `lit` is satisfied, `Some(false)` if falsified, `None`
    /// if its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|value| value == lit.polarity())
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self[var].is_assigned()
    }

    /// The lowest-indexed unassigned variable.
    #[must_use]
    pub fn first_unassigned(&self) -> Option<Variable> {
        self.0
            .iter()
            .skip(1)
            .position(|s| s.is_unassigned())
            .and_then(|i| Variable::try_from(i + 1).ok())
    }

    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.0.iter().skip(1).all(|s| s.is_assigned())
    }

    /// Snapshot of a total assignment.
    ///
    /// Unassigned variables are reported as false; the solver only calls this
    /// once every variable has a value.
    #[must_use]
    pub fn to_model(&self) -> Model {
        Model(
            self.0
                .iter()
                .map(|s| s.value().unwrap_or(false))
                .collect(),
        )
    }
}

/// A total assignment of variables `1..=N`, reported for satisfiable formulas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Model(Vec<bool>);

impl Model {
    /// Builds a model from the values of variables `1..=N`, in order.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = bool>) -> Self {
        Self(std::iter::once(false).chain(values).collect())
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// The value of `var`.
    ///
    /// # Panics
    ///
    /// If `var` is zero or greater than the number of variables.
    #[must_use]
    pub fn value(&self, var: Variable) -> bool {
        assert!(var != 0, "variable 0 does not exist");
        self.0[var as usize]
    }

    /// `true` if `lit` holds in the model. Literals over variables the model
    /// does not know are false.
    #[must_use]
    pub fn satisfies(&self, lit: Literal) -> bool {
        self.0
            .get(lit.variable() as usize)
            .is_some_and(|&value| value == lit.polarity())
    }

    /// The model as a list of signed literals, one per variable.
    #[must_use]
    pub fn literals(&self) -> Vec<i32> {
        self.0
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(var, &value)| {
                let var = i32::try_from(var).ok()?;
                Some(if value { var } else { -var })
            })
            .collect()
    }
}

impl Display for Model {
    /// DIMACS solution line: `v 1 -2 3 0`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let lits = self.literals();
        if lits.is_empty() {
            write!(f, "v 0")
        } else {
            write!(f, "v {} 0", lits.iter().join(" "))
        }
    }
}
