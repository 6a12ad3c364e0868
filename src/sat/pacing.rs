#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Interactive pacing.
//!
//! [`Paced`] wraps any instrumentation sink and, at every checkpoint, sleeps
//! for a per-event delay and then blocks while the shared [`PacingControl`] is
//! paused. The control handle is meant to be held by another thread (a UI, a
//! signal handler, a test) which can pause, resume or abort the search. An
//! abort wakes any sleeping or paused checkpoint at once.

use crate::sat::conflict_analysis::ImplicationCut;
use crate::sat::instrumentation::{Checkpoint, Control, Instrumentation};
use crate::sat::literal::Literal;
use crate::sat::solver::Status;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How long each kind of checkpoint lingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub propagate: Duration,
    pub round_done: Duration,
    pub decide: Duration,
    pub learn: Duration,
    pub backjump: Duration,
    pub conflict: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            propagate: Duration::from_millis(500),
            round_done: Duration::ZERO,
            decide: Duration::from_millis(1000),
            learn: Duration::from_millis(1000),
            backjump: Duration::from_millis(1000),
            conflict: Duration::from_millis(500),
        }
    }
}

impl Delays {
    /// No delay anywhere. Pausing still works.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            propagate: Duration::ZERO,
            round_done: Duration::ZERO,
            decide: Duration::ZERO,
            learn: Duration::ZERO,
            backjump: Duration::ZERO,
            conflict: Duration::ZERO,
        }
    }

    /// The default delays multiplied by `factor`. Negative or non-finite
    /// factors count as zero.
    #[must_use]
    pub fn scaled(factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let d = Self::default();
        Self {
            propagate: d.propagate.mul_f64(factor),
            round_done: d.round_done.mul_f64(factor),
            decide: d.decide.mul_f64(factor),
            learn: d.learn.mul_f64(factor),
            backjump: d.backjump.mul_f64(factor),
            conflict: d.conflict.mul_f64(factor),
        }
    }

    #[must_use]
    pub const fn at(&self, checkpoint: Checkpoint) -> Duration {
        match checkpoint {
            Checkpoint::Propagate => self.propagate,
            Checkpoint::RoundDone => self.round_done,
            Checkpoint::Decide => self.decide,
            Checkpoint::Learn => self.learn,
            Checkpoint::Backjump => self.backjump,
            Checkpoint::Conflict => self.conflict,
        }
    }
}

/// Pause, resume and abort, shared between the solving thread and its
/// controller.
#[derive(Debug, Default)]
pub struct PacingControl {
    paused: Mutex<bool>,
    aborted: AtomicBool,
    wake: Condvar,
}

impl PacingControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that can be cloned into another thread.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn paused_guard(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next checkpoint block until [`resume`](Self::resume).
    pub fn pause(&self) {
        *self.paused_guard() = true;
    }

    pub fn resume(&self) {
        *self.paused_guard() = false;
        self.wake.notify_all();
    }

    /// Stops the search at its next checkpoint or iteration.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        // Taken so that a checkpoint cannot miss the notification between
        // checking the flag and starting to wait.
        let _guard = self.paused_guard();
        self.wake.notify_all();
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused_guard()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Sleeps for `delay`, returning early on abort.
    pub fn sleep(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let guard = self.paused_guard();
        let _unused = self
            .wake
            .wait_timeout_while(guard, delay, |_| !self.is_aborted())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks while paused and not aborted.
    pub fn wait_until_allowed(&self) {
        let guard = self.paused_guard();
        let _unused = self
            .wake
            .wait_while(guard, |paused| *paused && !self.is_aborted())
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// An instrumentation sink with interactive pacing.
#[derive(Debug)]
pub struct Paced<I> {
    pub inner: I,
    pub delays: Delays,
    control: Arc<PacingControl>,
}

impl<I: Instrumentation> Paced<I> {
    /// Wraps `inner` with the default delays and a fresh control handle.
    pub fn new(inner: I) -> Self {
        Self::with_control(inner, Delays::default(), PacingControl::shared())
    }

    pub const fn with_control(inner: I, delays: Delays, control: Arc<PacingControl>) -> Self {
        Self {
            inner,
            delays,
            control,
        }
    }

    /// The control handle, for use from another thread.
    #[must_use]
    pub fn control(&self) -> Arc<PacingControl> {
        Arc::clone(&self.control)
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Instrumentation> Instrumentation for Paced<I> {
    fn on_decide(&mut self, lit: Literal) {
        self.inner.on_decide(lit);
    }

    fn on_propagate(&mut self, lit: Literal) {
        self.inner.on_propagate(lit);
    }

    fn on_conflict(&mut self, clause: &[Literal]) {
        self.inner.on_conflict(clause);
    }

    fn on_analyze(&mut self, cut: &ImplicationCut) {
        self.inner.on_analyze(cut);
    }

    fn on_learned_clause(&mut self, clause: &[Literal]) {
        self.inner.on_learned_clause(clause);
    }

    fn on_backjump(&mut self, level: usize) {
        self.inner.on_backjump(level);
    }

    fn on_done_propagating_round(&mut self) {
        self.inner.on_done_propagating_round();
    }

    fn on_result(&mut self, status: Status) {
        self.inner.on_result(status);
    }

    fn checkpoint(&mut self, at: Checkpoint) -> Control {
        if self.inner.checkpoint(at) == Control::Abort {
            return Control::Abort;
        }
        self.control.sleep(self.delays.at(at));
        self.control.wait_until_allowed();
        if self.control.is_aborted() {
            Control::Abort
        } else {
            Control::Continue
        }
    }

    fn should_abort(&self) -> bool {
        self.control.is_aborted() || self.inner.should_abort()
    }
}
