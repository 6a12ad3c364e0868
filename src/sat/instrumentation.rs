#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The instrumentation port.
//!
//! The search driver reports every observable step to an [`Instrumentation`]
//! sink and, after each one, passes through a [`Checkpoint`] where the sink may
//! pace the search (sleep, block while paused) or ask it to stop. Sinks only
//! ever see copies or shared slices of solver data, so nothing they do can
//! change the state of the search.
//!
//! Three sinks live here: [`NoopInstrumentation`] for batch solving,
//! [`LogInstrumentation`] which narrates the search through the `log` facade,
//! and [`Recorder`] which keeps every [`Event`] for later replay.
//! [`Paced`](crate::sat::pacing::Paced) adds interactive pacing on top of any
//! of them.

use crate::sat::conflict_analysis::ImplicationCut;
use crate::sat::literal::Literal;
use crate::sat::solver::{SolutionStats, Status};
use itertools::Itertools;

/// Log targets used by the solver.
pub mod targets {
    /// Forced assignments.
    pub const PROPAGATION: &str = "propagation";
    /// Conflicts and learned clauses.
    pub const ANALYSIS: &str = "analysis";
    pub const BACKJUMP: &str = "backjump";
    pub const DECISION: &str = "decision";
    /// Start, budgets and termination.
    pub const SEARCH: &str = "search";
}

/// Points at which the driver yields to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    Propagate,
    Conflict,
    Learn,
    Backjump,
    Decide,
    /// A propagation round drained its queue.
    RoundDone,
}

/// What the sink wants the driver to do after a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    Continue,
    Abort,
}

/// Callbacks invoked by the search driver.
///
/// Every method has a no-op default. Callbacks run synchronously on the
/// solver's thread, in exactly the order the search produces events.
pub trait Instrumentation {
    /// A decision: `lit` is assigned at a new decision level.
    fn on_decide(&mut self, _lit: Literal) {}

    /// `lit` was assigned by unit propagation, as a level-0 unit clause, or as
    /// the asserting literal of a learned clause.
    fn on_propagate(&mut self, _lit: Literal) {}

    /// `clause` is false under the current assignment.
    fn on_conflict(&mut self, _clause: &[Literal]) {}

    /// The implication-graph cut found by first-UIP analysis.
    fn on_analyze(&mut self, _cut: &ImplicationCut) {}

    /// `clause` was learned; its first literal is the asserting one.
    fn on_learned_clause(&mut self, _clause: &[Literal]) {}

    /// Assignments above `level` were undone.
    fn on_backjump(&mut self, _level: usize) {}

    /// A propagation round finished, with or without a conflict.
    fn on_done_propagating_round(&mut self) {}

    /// The search ended.
    fn on_result(&mut self, _status: Status) {}

    /// Called after each event. May block; returning [`Control::Abort`]
    /// stops the search.
    fn checkpoint(&mut self, _at: Checkpoint) -> Control {
        Control::Continue
    }

    /// Polled at the top of every search iteration and between propagations.
    fn should_abort(&self) -> bool {
        false
    }
}

impl<I: Instrumentation + ?Sized> Instrumentation for &mut I {
    fn on_decide(&mut self, lit: Literal) {
        (**self).on_decide(lit);
    }

    fn on_propagate(&mut self, lit: Literal) {
        (**self).on_propagate(lit);
    }

    fn on_conflict(&mut self, clause: &[Literal]) {
        (**self).on_conflict(clause);
    }

    fn on_analyze(&mut self, cut: &ImplicationCut) {
        (**self).on_analyze(cut);
    }

    fn on_learned_clause(&mut self, clause: &[Literal]) {
        (**self).on_learned_clause(clause);
    }

    fn on_backjump(&mut self, level: usize) {
        (**self).on_backjump(level);
    }

    fn on_done_propagating_round(&mut self) {
        (**self).on_done_propagating_round();
    }

    fn on_result(&mut self, status: Status) {
        (**self).on_result(status);
    }

    fn checkpoint(&mut self, at: Checkpoint) -> Control {
        (**self).checkpoint(at)
    }

    fn should_abort(&self) -> bool {
        (**self).should_abort()
    }
}

impl<I: Instrumentation + ?Sized> Instrumentation for Box<I> {
    fn on_decide(&mut self, lit: Literal) {
        (**self).on_decide(lit);
    }

    fn on_propagate(&mut self, lit: Literal) {
        (**self).on_propagate(lit);
    }

    fn on_conflict(&mut self, clause: &[Literal]) {
        (**self).on_conflict(clause);
    }

    fn on_analyze(&mut self, cut: &ImplicationCut) {
        (**self).on_analyze(cut);
    }

    fn on_learned_clause(&mut self, clause: &[Literal]) {
        (**self).on_learned_clause(clause);
    }

    fn on_backjump(&mut self, level: usize) {
        (**self).on_backjump(level);
    }

    fn on_done_propagating_round(&mut self) {
        (**self).on_done_propagating_round();
    }

    fn on_result(&mut self, status: Status) {
        (**self).on_result(status);
    }

    fn checkpoint(&mut self, at: Checkpoint) -> Control {
        (**self).checkpoint(at)
    }

    fn should_abort(&self) -> bool {
        (**self).should_abort()
    }
}

/// Batch mode: ignores every event and never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {}

/// One observed step of the search, with literals in DIMACS form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Decide(i32),
    Propagate(i32),
    Conflict(Vec<i32>),
    Analyze { conflict_side: Vec<i32> },
    Learn(Vec<i32>),
    Backjump(usize),
    RoundDone,
    Result(Status),
}

fn to_i32s(lits: &[Literal]) -> Vec<i32> {
    lits.iter().map(|l| l.to_i32()).collect()
}

/// Keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every learned clause, in order.
    pub fn learnt_clauses(&self) -> impl Iterator<Item = &Vec<i32>> {
        self.events.iter().filter_map(|e| match e {
            Event::Learn(clause) => Some(clause),
            _ => None,
        })
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Instrumentation for Recorder {
    fn on_decide(&mut self, lit: Literal) {
        self.events.push(Event::Decide(lit.to_i32()));
    }

    fn on_propagate(&mut self, lit: Literal) {
        self.events.push(Event::Propagate(lit.to_i32()));
    }

    fn on_conflict(&mut self, clause: &[Literal]) {
        self.events.push(Event::Conflict(to_i32s(clause)));
    }

    fn on_analyze(&mut self, cut: &ImplicationCut) {
        self.events.push(Event::Analyze {
            conflict_side: to_i32s(&cut.conflict_side),
        });
    }

    fn on_learned_clause(&mut self, clause: &[Literal]) {
        self.events.push(Event::Learn(to_i32s(clause)));
    }

    fn on_backjump(&mut self, level: usize) {
        self.events.push(Event::Backjump(level));
    }

    fn on_done_propagating_round(&mut self) {
        self.events.push(Event::RoundDone);
    }

    fn on_result(&mut self, status: Status) {
        self.events.push(Event::Result(status));
    }
}

/// Narrates the search through the `log` facade.
///
/// Decisions, conflicts, learned clauses and backjumps are logged at `debug`,
/// single propagations and round ends at `trace`, the result at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogInstrumentation {
    level: usize,
}

impl LogInstrumentation {
    #[must_use]
    pub const fn new() -> Self {
        Self { level: 0 }
    }
}

impl Instrumentation for LogInstrumentation {
    fn on_decide(&mut self, lit: Literal) {
        self.level += 1;
        log::debug!(target: targets::DECISION, "Branching by assigning literal {lit} at level {}", self.level);
    }

    fn on_propagate(&mut self, lit: Literal) {
        log::trace!(target: targets::PROPAGATION, "Propagating literal {lit}");
    }

    fn on_conflict(&mut self, clause: &[Literal]) {
        log::debug!(target: targets::ANALYSIS, "Clause made false: [{}]", clause.iter().join(","));
    }

    fn on_analyze(&mut self, cut: &ImplicationCut) {
        log::trace!(
            target: targets::ANALYSIS,
            "Conflict side of the implication graph: [{}]",
            cut.conflict_side.iter().join(",")
        );
    }

    fn on_learned_clause(&mut self, clause: &[Literal]) {
        log::debug!(target: targets::ANALYSIS, "Learned new clause: [{}]", clause.iter().join(","));
    }

    fn on_backjump(&mut self, level: usize) {
        log::debug!(
            target: targets::BACKJUMP,
            "Undoing {} level(s), back to level {level}",
            self.level.saturating_sub(level)
        );
        self.level = level;
    }

    fn on_done_propagating_round(&mut self) {
        log::trace!(target: targets::PROPAGATION, "Propagation round complete");
    }

    fn on_result(&mut self, status: Status) {
        match status {
            Status::Sat => log::info!(target: targets::SEARCH, "Found a satisfying assignment"),
            Status::Unsat => log::info!(target: targets::SEARCH, "No more choices to undo, formula is unsatisfiable"),
            Status::Unknown => log::info!(target: targets::SEARCH, "Search stopped without an answer"),
        }
    }
}

/// The driver's handle on a sink for the duration of one solve.
///
/// Owns the search counters, so every counted event is counted in exactly one
/// place, and latches an abort request so that later checkpoints no longer
/// pace the search.
pub struct Monitor<'a, I: Instrumentation + ?Sized> {
    sink: &'a mut I,
    pub stats: SolutionStats,
    aborted: bool,
}

impl<'a, I: Instrumentation + ?Sized> Monitor<'a, I> {
    pub fn new(sink: &'a mut I) -> Self {
        Self {
            sink,
            stats: SolutionStats::default(),
            aborted: false,
        }
    }

    /// `true` once the sink asked to stop, through a checkpoint or the flag.
    pub fn is_aborted(&self) -> bool {
        self.aborted || self.sink.should_abort()
    }

    fn pause(&mut self, at: Checkpoint) {
        if self.is_aborted() {
            self.aborted = true;
            return;
        }
        if self.sink.checkpoint(at) == Control::Abort {
            self.aborted = true;
        }
    }

    /// A level-0 unit clause of the input was asserted.
    pub fn axiom(&mut self, lit: Literal) {
        self.sink.on_propagate(lit);
        self.pause(Checkpoint::Propagate);
    }

    pub fn propagated(&mut self, lit: Literal) {
        self.stats.propagations += 1;
        log::trace!(target: targets::PROPAGATION, "enqueue {lit}");
        self.sink.on_propagate(lit);
        self.pause(Checkpoint::Propagate);
    }

    pub fn conflict(&mut self, clause: &[Literal]) {
        self.stats.conflicts += 1;
        self.sink.on_conflict(clause);
        self.pause(Checkpoint::Conflict);
    }

    pub fn round_done(&mut self) {
        self.sink.on_done_propagating_round();
        self.pause(Checkpoint::RoundDone);
    }

    pub fn analysed(&mut self, cut: &ImplicationCut) {
        self.sink.on_analyze(cut);
    }

    pub fn learnt(&mut self, clause: &[Literal]) {
        self.stats.learnt_clauses += 1;
        self.sink.on_learned_clause(clause);
        self.pause(Checkpoint::Learn);
    }

    /// Backjumped to `level` and asserted `lit`.
    pub fn backjumped(&mut self, level: usize, lit: Literal) {
        self.sink.on_backjump(level);
        self.sink.on_propagate(lit);
        self.pause(Checkpoint::Backjump);
    }

    pub fn decided(&mut self, lit: Literal) {
        self.stats.decisions += 1;
        self.sink.on_decide(lit);
        self.pause(Checkpoint::Decide);
    }

    pub fn finished(&mut self, status: Status) {
        self.sink.on_result(status);
    }
}
