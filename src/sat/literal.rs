#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variables and literals.
//!
//! A variable is a positive integer `1..=N`. A literal is a signed integer whose
//! magnitude is the variable and whose sign is the polarity: `3` asserts that
//! variable 3 is true, `-3` that it is false. `0` is never a literal; it only
//! terminates clauses in DIMACS text.

use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// A propositional variable, `1..=N`.
pub type Variable = u32;

/// A signed literal.
///
/// Stored as the DIMACS integer itself, so conversion to and from the textual
/// form is free and the sign is the polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    /// Creates the literal of `var` with the given polarity (`true` = positive).
    ///
    /// # Panics
    ///
    /// If `var` is zero or does not fit in an `i32`.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        assert_ne!(var, 0, "variable 0 does not exist");
        let var = i32::try_from(var).expect("literal variable overflowed i32");
        if polarity { Self(var) } else { Self(-var) }
    }

    /// Creates a literal from its DIMACS integer form.
    ///
    /// # Panics
    ///
    /// If `value` is zero.
    #[must_use]
    pub fn from_i32(value: i32) -> Self {
        assert_ne!(value, 0, "0 is a clause terminator, not a literal");
        Self(value)
    }

    /// The DIMACS integer form of the literal.
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    /// The variable of the literal.
    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    /// `true` for a positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 > 0
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Dense index of the literal, used to address per-literal tables.
    ///
    /// Variable `v` maps to `2v` when positive and `2v + 1` when negative, so a
    /// table for `N` variables needs `2 * (N + 1)` slots.
    #[must_use]
    pub const fn index(self) -> usize {
        let var = self.variable() as usize;
        if self.polarity() { var * 2 } else { var * 2 + 1 }
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Not for &Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<Literal> for i32 {
    fn from(lit: Literal) -> Self {
        lit.0
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
