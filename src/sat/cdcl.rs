#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The CDCL search driver.
//!
//! One [`Cdcl`] owns all the state of one solve: the clause store, the watch
//! index and the trail. The loop alternates propagation with either conflict
//! handling (analyse, learn, backjump, assert) or a decision, until every
//! variable is assigned (SAT), a conflict is found at level 0 (UNSAT), or a
//! budget or the instrumentation stops it (UNKNOWN).
//!
//! Decisions take the lowest unassigned variable and make it true.

use crate::sat::clause::Clause;
use crate::sat::clause_storage::ClauseStore;
use crate::sat::cnf::Cnf;
use crate::sat::conflict_analysis::{Analyser, AnalyserImpls};
use crate::sat::instrumentation::{targets, Instrumentation, Monitor};
use crate::sat::literal::Literal;
use crate::sat::propagation::{Propagation, Propagator, PropagatorImpls};
use crate::sat::solver::{SolveResult, SolverConfig, Status, StopReason};
use crate::sat::trail::{Reason, Trail};
use crate::sat::watch::WatchIndex;
use itertools::Itertools;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Cdcl {
    store: ClauseStore,
    watches: WatchIndex,
    trail: Trail,
    propagator: PropagatorImpls,
    analyser: AnalyserImpls,
    config: SolverConfig,
    num_vars: usize,
}

impl Cdcl {
    #[must_use]
    pub fn new(cnf: &Cnf, config: &SolverConfig) -> Self {
        let num_vars = cnf.num_vars;
        let store = ClauseStore::new(cnf.clauses.clone());
        let mut watches = WatchIndex::new(num_vars);
        for (idx, clause) in store.iter().enumerate() {
            watches.add_clause(clause, idx);
        }

        Self {
            store,
            watches,
            trail: Trail::new(num_vars),
            propagator: config.propagator.to_impl(),
            analyser: config.analyser.to_impl(num_vars),
            config: *config,
            num_vars,
        }
    }

    /// Clauses learned so far, oldest first.
    pub fn learnt_clauses(&self) -> impl Iterator<Item = &Clause> {
        self.store.learnt()
    }

    #[must_use]
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Asserts the unit clauses of the input at level 0.
    fn assert_units<I: Instrumentation + ?Sized>(&mut self, monitor: &mut Monitor<'_, I>) {
        let units = self
            .store
            .original()
            .filter(|(_, c)| c.is_unit())
            .map(|(idx, c)| (idx, c[0]))
            .collect_vec();

        for (idx, lit) in units {
            if self.trail.is_assigned(lit.variable()) {
                continue;
            }
            monitor.axiom(lit);
            self.trail.push(lit, Reason::Unit(idx));
        }
    }

    /// Appends a learned clause and indexes it.
    fn learn(&mut self, literals: Vec<Literal>) -> usize {
        let idx = self.store.push(Clause::learnt(literals));
        self.watches.add_clause(&self.store[idx], idx);
        idx
    }

    /// Moves the highest-level literal after the asserting one into position
    /// 1, so that any backjump undoing it also undoes the asserting literal.
    fn watch_highest_body(&self, learnt: &mut [Literal]) {
        if let Some(pos) = (1..learnt.len()).max_by_key(|&i| self.trail.level(learnt[i].variable())) {
            learnt.swap(1, pos);
        }
    }

    /// The level at which `learnt` becomes unit: the highest level among its
    /// literals other than the asserting one.
    fn backjump_level(&self, learnt: &[Literal]) -> usize {
        learnt
            .iter()
            .skip(1)
            .map(|l| self.trail.level(l.variable()))
            .max()
            .unwrap_or(0)
    }

    fn handle_conflict<I: Instrumentation + ?Sized>(
        &mut self,
        conflict: usize,
        monitor: &mut Monitor<'_, I>,
    ) -> Option<Status> {
        let analysis = self.analyser.analyse(&self.store, &self.trail, conflict);
        if analysis.is_empty() {
            return Some(Status::Unsat);
        }

        if let Some(cut) = &analysis.cut {
            monitor.analysed(cut);
        }

        let mut learnt = analysis.learnt;
        self.watch_highest_body(&mut learnt);
        let level = self.backjump_level(&learnt);
        let asserting = learnt[0];

        let idx = self.learn(learnt);
        log::debug!(target: targets::ANALYSIS, "learnt {} at level {}", self.store[idx], self.trail.decision_level());
        monitor.learnt(self.store[idx].as_slice());

        self.trail.backstep_to(level);
        self.trail.push(asserting, Reason::Clause(idx));
        monitor.backjumped(level, asserting);
        None
    }

    /// Runs the search to a terminal status.
    pub fn solve<I: Instrumentation + ?Sized>(mut self, sink: &mut I) -> SolveResult {
        let start = Instant::now();
        let mut monitor = Monitor::new(sink);
        log::info!(
            target: targets::SEARCH,
            "solving {} variables, {} clauses with {} and {}",
            self.num_vars,
            self.store.len(),
            self.config.propagator,
            self.config.analyser,
        );

        let (status, stop_reason) = self.search(&mut monitor, start);

        monitor.stats.elapsed = start.elapsed();
        monitor.finished(status);

        let model = (status == Status::Sat).then(|| self.trail.model());
        SolveResult {
            status,
            model,
            stats: monitor.stats,
            stop_reason,
        }
    }

    fn search<I: Instrumentation + ?Sized>(
        &mut self,
        monitor: &mut Monitor<'_, I>,
        start: Instant,
    ) -> (Status, Option<StopReason>) {
        if self.store.iter().any(Clause::is_empty) {
            log::info!(target: targets::SEARCH, "formula contains the empty clause");
            return (Status::Unsat, None);
        }

        self.assert_units(monitor);

        loop {
            if monitor.is_aborted() {
                log::info!(target: targets::SEARCH, "search aborted");
                return (Status::Unknown, Some(StopReason::Aborted));
            }

            monitor.stats.elapsed = start.elapsed();
            if let Some(reason) = self.config.budget.exceeded(&monitor.stats) {
                log::info!(
                    target: targets::SEARCH,
                    "{reason} after {} propagations, {} conflicts, {} decisions",
                    monitor.stats.propagations,
                    monitor.stats.conflicts,
                    monitor.stats.decisions,
                );
                return (Status::Unknown, Some(reason));
            }

            let propagation =
                self.propagator
                    .propagate(&mut self.store, &self.watches, &mut self.trail, monitor);
            if propagation == Propagation::Interrupted {
                continue;
            }
            monitor.round_done();

            if let Some(conflict) = propagation.conflict() {
                if let Some(status) = self.handle_conflict(conflict, monitor) {
                    return (status, None);
                }
                continue;
            }

            if !self.decide(monitor) {
                return (Status::Sat, None);
            }
        }
    }

    /// Branches on the lowest unassigned variable, made true. `false` once
    /// every variable is assigned.
    fn decide<I: Instrumentation + ?Sized>(&mut self, monitor: &mut Monitor<'_, I>) -> bool {
        let Some(var) = self.trail.first_unassigned() else {
            return false;
        };

        let lit = Literal::new(var, true);
        monitor.decided(lit);
        self.trail.new_decision_level();
        self.trail.push(lit, Reason::Decision);
        true
    }
}
