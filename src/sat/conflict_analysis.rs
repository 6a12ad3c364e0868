#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict analysis.
//!
//! Given a clause falsified by propagation, an analyser derives a new clause
//! implied by the formula that becomes unit after backjumping. The asserting
//! literal, the one that is forced after the backjump, is always at index 0.
//! A conflict at decision level 0 yields the empty clause, which means the
//! formula is unsatisfiable.

use crate::sat::clause_storage::ClauseStore;
use crate::sat::literal::Literal;
use crate::sat::trail::{Reason, Trail};
use bit_vec::BitVec;
use clap::ValueEnum;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

/// A cut of the implication graph.
///
/// `conflict_side` holds the current-level literals resolved away between
/// the conflict and the first unique implication point, newest first.
/// `reason_side` holds every other literal on the trail, the UIP included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImplicationCut {
    pub conflict_side: Vec<Literal>,
    pub reason_side: Vec<Literal>,
}

/// The result of analysing one conflict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Analysis {
    /// The learned clause, asserting literal first. Empty at level 0.
    pub learnt: Vec<Literal>,
    /// The implication-graph cut, for analysers that compute one.
    pub cut: Option<ImplicationCut>,
}

impl Analysis {
    const fn unsat() -> Self {
        Self {
            learnt: Vec::new(),
            cut: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.learnt.is_empty()
    }
}

/// A conflict analysis strategy.
pub trait Analyser {
    /// Analyses the conflict in clause `conflict` of `store`.
    fn analyse(&mut self, store: &ClauseStore, trail: &Trail, conflict: usize) -> Analysis;
}

/// First unique implication point analysis.
///
/// Resolves the conflict clause with the reasons of current-level literals,
/// newest first, until exactly one current-level literal is left unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstUip {
    /// Variables already taken into account, indexed by variable.
    seen: BitVec,
}

impl FirstUip {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: BitVec::from_elem(num_vars + 1, false),
        }
    }
}

impl Analyser for FirstUip {
    fn analyse(&mut self, store: &ClauseStore, trail: &Trail, conflict: usize) -> Analysis {
        let level = trail.decision_level();
        if level == 0 {
            return Analysis::unsat();
        }

        let num_vars = trail.assignment().num_vars();
        if self.seen.len() <= num_vars {
            self.seen.grow(num_vars + 1 - self.seen.len(), false);
        }
        self.seen.clear();

        let mut body = Vec::new();
        let mut conflict_side = Vec::new();
        let mut pending = 0usize;
        let mut resolved = None;
        let mut reason = store[conflict].as_slice();
        let mut i = trail.len();

        let uip = loop {
            for &lit in reason {
                let var = lit.variable();
                if Some(var) == resolved
                    || self.seen[var as usize]
                    || trail.level(var) == 0
                {
                    continue;
                }
                self.seen.set(var as usize, true);
                if trail.level(var) >= level {
                    pending += 1;
                } else {
                    body.push(lit);
                }
            }

            let step = loop {
                i -= 1;
                if self.seen[trail[i].lit.variable() as usize] {
                    break trail[i];
                }
            };
            let var = step.lit.variable();
            self.seen.set(var as usize, false);
            pending -= 1;

            if pending == 0 {
                break step.lit;
            }

            conflict_side.push(step.lit);
            resolved = Some(var);
            let Some(antecedent) = trail.reason(var).clause() else {
                panic!("literal {} above the first UIP has no reason", step.lit);
            };
            reason = store[antecedent].as_slice();
        };

        let learnt: Vec<Literal> = std::iter::once(!uip).chain(body).collect();

        let resolved: FxHashSet<Literal> = conflict_side.iter().copied().collect();
        let reason_side = trail
            .iter()
            .map(|s| s.lit)
            .filter(|l| !resolved.contains(l))
            .collect();

        Analysis {
            learnt,
            cut: Some(ImplicationCut {
                conflict_side,
                reason_side,
            }),
        }
    }
}

/// Decision-based analysis.
///
/// Follows reasons from the conflict clause back to the decisions that caused
/// it and learns the negation of their conjunction, which is the clause of
/// the collected (false) decision literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllDecisions;

impl AllDecisions {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Analyser for AllDecisions {
    fn analyse(&mut self, store: &ClauseStore, trail: &Trail, conflict: usize) -> Analysis {
        if trail.decision_level() == 0 {
            return Analysis::unsat();
        }

        let mut learnt = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack: Vec<Literal> = Vec::new();

        for &lit in store[conflict].iter() {
            if seen.insert(lit.variable()) {
                stack.push(lit);
            }
        }

        while let Some(lit) = stack.pop() {
            let var = lit.variable();
            if trail.level(var) == 0 {
                continue;
            }
            match trail.reason(var) {
                Reason::Clause(idx) => {
                    for &l in store[idx].iter() {
                        if seen.insert(l.variable()) {
                            stack.push(l);
                        }
                    }
                }
                Reason::Decision | Reason::Unit(_) => learnt.push(lit),
            }
        }

        assert!(
            !learnt.is_empty(),
            "conflict above level 0 must depend on a decision"
        );

        if let Some(front) = learnt.iter().position_max_by_key(|l| trail.level(l.variable())) {
            learnt.swap(0, front);
        }

        Analysis { learnt, cut: None }
    }
}

/// The available analysers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyserImpls {
    FirstUip(FirstUip),
    AllDecisions(AllDecisions),
}

impl Default for AnalyserImpls {
    fn default() -> Self {
        Self::FirstUip(FirstUip::default())
    }
}

impl Analyser for AnalyserImpls {
    fn analyse(&mut self, store: &ClauseStore, trail: &Trail, conflict: usize) -> Analysis {
        match self {
            Self::FirstUip(a) => a.analyse(store, trail, conflict),
            Self::AllDecisions(a) => a.analyse(store, trail, conflict),
        }
    }
}

/// Selects a conflict analysis strategy.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum AnalyserType {
    /// Learn the first unique implication point clause
    #[default]
    FirstUip,
    /// Learn the negation of the decisions behind the conflict
    AllDecisions,
}

impl Display for AnalyserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstUip => write!(f, "First UIP"),
            Self::AllDecisions => write!(f, "All Decisions"),
        }
    }
}

impl AnalyserType {
    #[must_use]
    pub fn to_impl(self, num_vars: usize) -> AnalyserImpls {
        match self {
            Self::FirstUip => AnalyserImpls::FirstUip(FirstUip::new(num_vars)),
            Self::AllDecisions => AnalyserImpls::AllDecisions(AllDecisions::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::Clause;

    fn lit(i: i32) -> Literal {
        Literal::from(i)
    }

    fn lits(c: &[i32]) -> Vec<Literal> {
        c.iter().copied().map(Literal::from).collect()
    }

    /// Level 1: decide 1, forcing 2 by (¬1 ∨ 2).
    /// Level 2: decide 3, forcing 4 by (¬3 ∨ ¬2 ∨ 4) and 5 by (¬4 ∨ 5);
    /// (¬4 ∨ ¬5) is then false.
    fn conflict_at_level_two() -> (ClauseStore, Trail) {
        let store = ClauseStore::new(vec![
            Clause::new(&[-1, 2]),
            Clause::new(&[-3, -2, 4]),
            Clause::new(&[-4, 5]),
            Clause::new(&[-4, -5]),
        ]);
        let mut trail = Trail::new(5);
        trail.new_decision_level();
        trail.push(lit(1), Reason::Decision);
        trail.push(lit(2), Reason::Clause(0));
        trail.new_decision_level();
        trail.push(lit(3), Reason::Decision);
        trail.push(lit(4), Reason::Clause(1));
        trail.push(lit(5), Reason::Clause(2));
        (store, trail)
    }

    #[test]
    fn test_first_uip() {
        let (store, trail) = conflict_at_level_two();
        let analysis = FirstUip::new(5).analyse(&store, &trail, 3);

        assert_eq!(analysis.learnt, lits(&[-4]));
        let cut = analysis.cut.unwrap_or_default();
        assert_eq!(cut.conflict_side, lits(&[5]));
        assert_eq!(cut.reason_side, lits(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_first_uip_keeps_lower_level_body() {
        let store = ClauseStore::new(vec![
            Clause::new(&[-1, 2]),
            Clause::new(&[-2, -3, 4]),
            Clause::new(&[-2, -3, -4]),
        ]);
        let mut trail = Trail::new(4);
        trail.new_decision_level();
        trail.push(lit(1), Reason::Decision);
        trail.push(lit(2), Reason::Clause(0));
        trail.new_decision_level();
        trail.push(lit(3), Reason::Decision);
        trail.push(lit(4), Reason::Clause(1));

        let analysis = FirstUip::new(4).analyse(&store, &trail, 2);
        assert_eq!(analysis.learnt, lits(&[-3, -2]));
    }

    #[test]
    fn test_first_uip_skips_level_zero() {
        let store = ClauseStore::new(vec![Clause::new(&[1]), Clause::new(&[-1, -2, 3]), Clause::new(&[-1, -3])]);
        let mut trail = Trail::new(3);
        trail.push(lit(1), Reason::Unit(0));
        trail.new_decision_level();
        trail.push(lit(2), Reason::Decision);
        trail.push(lit(3), Reason::Clause(1));

        let analysis = FirstUip::new(3).analyse(&store, &trail, 2);
        assert_eq!(analysis.learnt, lits(&[-3]));
    }

    #[test]
    fn test_all_decisions() {
        let (store, trail) = conflict_at_level_two();
        let analysis = AllDecisions.analyse(&store, &trail, 3);

        assert_eq!(analysis.learnt, lits(&[-3, -1]));
        assert!(analysis.cut.is_none());
    }

    #[test]
    fn test_level_zero_is_empty() {
        let store = ClauseStore::new(vec![Clause::new(&[1]), Clause::new(&[-1])]);
        let mut trail = Trail::new(1);
        trail.push(lit(1), Reason::Unit(0));

        for t in [AnalyserType::FirstUip, AnalyserType::AllDecisions] {
            assert!(t.to_impl(1).analyse(&store, &trail, 1).is_empty(), "{t}");
        }
    }

    #[test]
    fn test_type_display_and_default() {
        assert_eq!(AnalyserType::default(), AnalyserType::FirstUip);
        assert_eq!(AnalyserType::AllDecisions.to_string(), "All Decisions");
    }
}
