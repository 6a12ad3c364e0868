#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation.
//!
//! A propagator drains the trail's pending queue. For each pending literal it
//! finds the clauses that may have become unit or false, pushes the forced
//! literals back onto the trail (which enqueues them in turn) and stops at the
//! first falsified clause.
//!
//! Two strategies are provided:
//! - [`UnitSearch`] rescans every clause for every pending literal,
//! - [`WatchedLiterals`] visits only the clauses in the watch entry of the
//!   pending literal and keeps positions 0 and 1 of each clause meaningful.
//!
//! Both report every forced literal and every conflict through the
//! [`Monitor`], and both clear the pending queue when they find a conflict.

use crate::sat::clause_storage::ClauseStore;
use crate::sat::instrumentation::{Instrumentation, Monitor};
use crate::sat::literal::Literal;
use crate::sat::trail::{Reason, Trail};
use crate::sat::watch::WatchIndex;
use clap::ValueEnum;
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

/// How a propagation round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// The queue drained without a conflict.
    Quiet,
    /// `clause` is false under the current assignment. `lit` is the pending
    /// literal whose examination exposed it.
    Conflict { clause: usize, lit: Literal },
    /// The instrumentation asked the search to stop mid-round.
    Interrupted,
}

impl Propagation {
    /// The index of the falsified clause, if any.
    #[must_use]
    pub const fn conflict(self) -> Option<usize> {
        match self {
            Self::Conflict { clause, .. } => Some(clause),
            Self::Quiet | Self::Interrupted => None,
        }
    }
}

/// A unit propagation strategy.
pub trait Propagator {
    /// Drains the pending queue of `trail`.
    ///
    /// May reorder the literals of clauses in `store`, never adds or removes
    /// clauses.
    fn propagate<I: Instrumentation + ?Sized>(
        &mut self,
        store: &mut ClauseStore,
        watches: &WatchIndex,
        trail: &mut Trail,
        monitor: &mut Monitor<'_, I>,
    ) -> Propagation;
}

/// Assigns `lit` with `clause` as its reason and reports it.
///
/// Returns `false` if the sink asked to stop.
fn force<I: Instrumentation + ?Sized>(
    lit: Literal,
    clause: usize,
    trail: &mut Trail,
    monitor: &mut Monitor<'_, I>,
) -> bool {
    trail.push(lit, Reason::Clause(clause));
    monitor.propagated(lit);
    !monitor.is_aborted()
}

fn conflict<I: Instrumentation + ?Sized>(
    clause: usize,
    lit: Literal,
    store: &ClauseStore,
    trail: &mut Trail,
    monitor: &mut Monitor<'_, I>,
) -> Propagation {
    trail.clear_pending();
    monitor.conflict(store[clause].as_slice());
    Propagation::Conflict { clause, lit }
}

/// Propagation by exhaustive clause scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSearch {
    /// Literals forced in the current round.
    seen: FxHashSet<Literal>,
}

impl UnitSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// The single unassigned literal of `clause` if every other literal is false.
enum Scan {
    Satisfied,
    Falsified,
    Unit(Literal),
    Open,
}

fn scan(literals: &[Literal], trail: &Trail) -> Scan {
    let mut unassigned = None;
    for &lit in literals {
        match trail.value(lit) {
            Some(true) => return Scan::Satisfied,
            Some(false) => {}
            None if unassigned.is_some() => return Scan::Open,
            None => unassigned = Some(lit),
        }
    }
    unassigned.map_or(Scan::Falsified, Scan::Unit)
}

impl Propagator for UnitSearch {
    fn propagate<I: Instrumentation + ?Sized>(
        &mut self,
        store: &mut ClauseStore,
        _watches: &WatchIndex,
        trail: &mut Trail,
        monitor: &mut Monitor<'_, I>,
    ) -> Propagation {
        self.seen.clear();

        while let Some(lit) = trail.next_pending() {
            for idx in 0..store.len() {
                match scan(store[idx].as_slice(), trail) {
                    Scan::Satisfied | Scan::Open => {}
                    Scan::Falsified => return conflict(idx, lit, store, trail, monitor),
                    Scan::Unit(unit) => {
                        if self.seen.insert(unit) && !force(unit, idx, trail, monitor) {
                            return Propagation::Interrupted;
                        }
                    }
                }
            }
        }

        Propagation::Quiet
    }
}

/// Two-watched-literal propagation.
///
/// After a visit, a clause of two or more literals either has both watched
/// positions unassigned or a true literal at one of them, unless it was just
/// propagated or found false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchedLiterals;

impl WatchedLiterals {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// What visiting one clause produced.
enum Visit {
    Skip,
    Propagate(Literal),
    Conflict,
}

/// Restores the watch invariant of a clause with at least two literals, if
/// possible, by moving an unassigned or true literal into the watched
/// positions.
fn visit_long(literals: &mut [Literal], trail: &Trail) -> Visit {
    let v0 = trail.value(literals[0]);
    let v1 = trail.value(literals[1]);

    if v0.is_none() && v1.is_none() {
        return Visit::Skip;
    }
    if v0 == Some(true) || v1 == Some(true) {
        return Visit::Skip;
    }

    // Position 0 holds an unassigned literal once `first_ok` is set.
    let mut first_ok = v0.is_none();
    if v1.is_none() {
        literals.swap(0, 1);
        first_ok = true;
    }

    for j in 2..literals.len() {
        match trail.value(literals[j]) {
            None if first_ok => {
                literals.swap(1, j);
                return Visit::Skip;
            }
            None => {
                literals.swap(0, j);
                first_ok = true;
            }
            Some(true) => {
                literals.swap(0, j);
                return Visit::Skip;
            }
            Some(false) => {}
        }
    }

    if trail.value(literals[0]).is_some() {
        Visit::Conflict
    } else {
        Visit::Propagate(literals[0])
    }
}

impl Propagator for WatchedLiterals {
    fn propagate<I: Instrumentation + ?Sized>(
        &mut self,
        store: &mut ClauseStore,
        watches: &WatchIndex,
        trail: &mut Trail,
        monitor: &mut Monitor<'_, I>,
    ) -> Propagation {
        while let Some(lit) = trail.next_pending() {
            for &idx in watches.watchers(lit) {
                let clause = &mut store[idx];
                let visit = if clause.is_unit() {
                    match trail.value(clause[0]) {
                        None => Visit::Propagate(clause[0]),
                        Some(true) => Visit::Skip,
                        Some(false) => Visit::Conflict,
                    }
                } else {
                    visit_long(&mut clause.literals, trail)
                };

                match visit {
                    Visit::Skip => {}
                    Visit::Conflict => return conflict(idx, lit, store, trail, monitor),
                    Visit::Propagate(unit) => {
                        if !force(unit, idx, trail, monitor) {
                            return Propagation::Interrupted;
                        }
                    }
                }
            }
        }

        Propagation::Quiet
    }
}

/// The available propagators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagatorImpls {
    UnitSearch(UnitSearch),
    WatchedLiterals(WatchedLiterals),
}

impl Default for PropagatorImpls {
    fn default() -> Self {
        Self::WatchedLiterals(WatchedLiterals)
    }
}

impl Propagator for PropagatorImpls {
    fn propagate<I: Instrumentation + ?Sized>(
        &mut self,
        store: &mut ClauseStore,
        watches: &WatchIndex,
        trail: &mut Trail,
        monitor: &mut Monitor<'_, I>,
    ) -> Propagation {
        match self {
            Self::UnitSearch(p) => p.propagate(store, watches, trail, monitor),
            Self::WatchedLiterals(p) => p.propagate(store, watches, trail, monitor),
        }
    }
}

/// Selects a propagation strategy.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum PropagatorType {
    /// Rescan every clause for every pending literal
    UnitSearch,
    /// Visit only the clauses watching the pending literal
    #[default]
    WatchedLiterals,
}

impl Display for PropagatorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnitSearch => write!(f, "Unit Search"),
            Self::WatchedLiterals => write!(f, "Watched Literals"),
        }
    }
}

impl PropagatorType {
    #[must_use]
    pub fn to_impl(self) -> PropagatorImpls {
        match self {
            Self::UnitSearch => PropagatorImpls::UnitSearch(UnitSearch::new()),
            Self::WatchedLiterals => PropagatorImpls::WatchedLiterals(WatchedLiterals::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::Clause;
    use crate::sat::instrumentation::{Event, Recorder};

    struct Fixture {
        store: ClauseStore,
        watches: WatchIndex,
        trail: Trail,
    }

    fn fixture(num_vars: usize, clauses: &[&[i32]]) -> Fixture {
        let clauses: Vec<Clause> = clauses.iter().map(|c| Clause::new(c)).collect();
        let mut watches = WatchIndex::new(num_vars);
        for (i, c) in clauses.iter().enumerate() {
            watches.add_clause(c, i);
        }
        Fixture {
            store: ClauseStore::new(clauses),
            watches,
            trail: Trail::new(num_vars),
        }
    }

    fn run(p: PropagatorType, f: &mut Fixture, recorder: &mut Recorder) -> Propagation {
        let mut monitor = Monitor::new(recorder);
        p.to_impl()
            .propagate(&mut f.store, &f.watches, &mut f.trail, &mut monitor)
    }

    fn lit(i: i32) -> Literal {
        Literal::from(i)
    }

    const BOTH: [PropagatorType; 2] = [PropagatorType::UnitSearch, PropagatorType::WatchedLiterals];

    #[test]
    fn test_chain_of_implications() {
        for p in BOTH {
            let mut f = fixture(4, &[&[-1, 2], &[-2, 3], &[-3, -2, 4]]);
            f.trail.new_decision_level();
            f.trail.push(lit(1), Reason::Decision);

            let mut recorder = Recorder::new();
            assert_eq!(run(p, &mut f, &mut recorder), Propagation::Quiet, "{p}");

            assert_eq!(f.trail.value(lit(4)), Some(true), "{p}");
            assert_eq!(f.trail.reason(2), Reason::Clause(0), "{p}");
            assert_eq!(f.trail.reason(4), Reason::Clause(2), "{p}");
            assert_eq!(
                recorder.events,
                vec![Event::Propagate(2), Event::Propagate(3), Event::Propagate(4)],
                "{p}"
            );
            assert!(!f.trail.has_pending());
        }
    }

    #[test]
    fn test_conflict_clears_queue() {
        for p in BOTH {
            let mut f = fixture(3, &[&[-1, 2], &[-1, -2], &[-1, 3]]);
            f.trail.new_decision_level();
            f.trail.push(lit(1), Reason::Decision);

            let mut recorder = Recorder::new();
            let result = run(p, &mut f, &mut recorder);
            assert!(result.conflict().is_some(), "{p}");
            assert!(!f.trail.has_pending(), "{p}");
            assert!(
                recorder.events.iter().any(|e| matches!(e, Event::Conflict(_))),
                "{p}"
            );
            let idx = result.conflict().unwrap_or_default();
            assert!(f.store[idx].is_falsified(f.trail.assignment()), "{p}");
        }
    }

    #[test]
    fn test_unit_clause_conflict_at_level_zero() {
        for p in BOTH {
            let mut f = fixture(1, &[&[1], &[-1]]);
            f.trail.push(lit(1), Reason::Unit(0));

            let mut recorder = Recorder::new();
            let result = run(p, &mut f, &mut recorder);
            assert_eq!(result, Propagation::Conflict { clause: 1, lit: lit(1) }, "{p}");
        }
    }

    #[test]
    fn test_watched_literals_restore_invariant() {
        let mut f = fixture(4, &[&[1, 2, 3, 4]]);
        f.trail.new_decision_level();
        f.trail.push(lit(-1), Reason::Decision);
        f.trail.push(lit(-3), Reason::Decision);

        let mut recorder = Recorder::new();
        assert_eq!(
            run(PropagatorType::WatchedLiterals, &mut f, &mut recorder),
            Propagation::Quiet
        );

        let clause = &f.store[0];
        assert_eq!(f.trail.value(clause[0]), None);
        assert_eq!(f.trail.value(clause[1]), None);
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn test_watched_literals_prefers_true_literal() {
        let mut f = fixture(3, &[&[1, 2, 3]]);
        f.trail.new_decision_level();
        f.trail.push(lit(3), Reason::Decision);
        f.trail.push(lit(-1), Reason::Decision);
        f.trail.push(lit(-2), Reason::Decision);

        let mut recorder = Recorder::new();
        assert_eq!(
            run(PropagatorType::WatchedLiterals, &mut f, &mut recorder),
            Propagation::Quiet
        );
        assert_eq!(f.store[0][0], lit(3));
    }

    #[test]
    fn test_watches_open_or_satisfied_after_round() {
        let mut f = fixture(
            5,
            &[&[1, 2, 3], &[-1, 4, 5], &[-2, -4], &[2, -5, 3], &[-3, 4, 1]],
        );
        f.trail.new_decision_level();
        f.trail.push(lit(-1), Reason::Decision);

        let mut recorder = Recorder::new();
        assert_eq!(
            run(PropagatorType::WatchedLiterals, &mut f, &mut recorder),
            Propagation::Quiet
        );

        for clause in f.store.iter().filter(|c| c.len() >= 2) {
            let (w0, w1) = (f.trail.value(clause[0]), f.trail.value(clause[1]));
            let open = w0.is_none() && w1.is_none();
            let satisfied = w0 == Some(true) || w1 == Some(true);
            assert!(open || satisfied, "{clause}");
        }
    }

    #[test]
    fn test_unit_search_forces_each_literal_once() {
        let mut f = fixture(2, &[&[-1, 2], &[-1, 2]]);
        f.trail.new_decision_level();
        f.trail.push(lit(1), Reason::Decision);

        let mut recorder = Recorder::new();
        run(PropagatorType::UnitSearch, &mut f, &mut recorder);
        assert_eq!(recorder.count(|e| matches!(e, Event::Propagate(_))), 1);
        assert_eq!(f.trail.len(), 2);
    }

    #[test]
    fn test_type_display_and_default() {
        assert_eq!(PropagatorType::default(), PropagatorType::WatchedLiterals);
        assert_eq!(PropagatorType::UnitSearch.to_string(), "Unit Search");
    }
}
