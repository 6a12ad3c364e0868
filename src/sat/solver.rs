#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solve configuration and results.
//!
//! [`solve`] is the entry point: it builds a fresh [`Cdcl`] for one formula,
//! runs it to a terminal [`Status`] under a [`Budget`], and reports what
//! happened through a [`SolveResult`]. Every run ends in one of the three
//! statuses; running out of budget and being aborted are ordinary outcomes,
//! told apart by [`StopReason`].

use crate::sat::assignment::Model;
use crate::sat::cdcl::Cdcl;
use crate::sat::cnf::Cnf;
use crate::sat::conflict_analysis::AnalyserType;
use crate::sat::instrumentation::Instrumentation;
use crate::sat::propagation::PropagatorType;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Sat,
    Unsat,
    Unknown,
}

impl Display for Status {
    /// The DIMACS status word.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sat => write!(f, "SATISFIABLE"),
            Self::Unsat => write!(f, "UNSATISFIABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Why a solve ended with [`Status::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The instrumentation asked the search to stop.
    Aborted,
    PropagationBudget,
    ConflictBudget,
    TimeBudget,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted => write!(f, "aborted"),
            Self::PropagationBudget => write!(f, "propagation budget exhausted"),
            Self::ConflictBudget => write!(f, "conflict budget exhausted"),
            Self::TimeBudget => write!(f, "time budget exhausted"),
        }
    }
}

/// Resource ceilings. A solve stops once a counter goes strictly above its
/// ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub max_propagations: usize,
    pub max_conflicts: usize,
    pub max_time: Duration,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_propagations: 50_000,
            max_conflicts: 5_000,
            max_time: Duration::from_secs(10),
        }
    }
}

impl Budget {
    /// No ceilings at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_propagations: usize::MAX,
            max_conflicts: usize::MAX,
            max_time: Duration::MAX,
        }
    }

    #[must_use]
    pub const fn with_propagations(mut self, max: usize) -> Self {
        self.max_propagations = max;
        self
    }

    #[must_use]
    pub const fn with_conflicts(mut self, max: usize) -> Self {
        self.max_conflicts = max;
        self
    }

    #[must_use]
    pub const fn with_time(mut self, max: Duration) -> Self {
        self.max_time = max;
        self
    }

    /// The first ceiling exceeded by `stats`, checked in the order
    /// propagations, conflicts, time.
    #[must_use]
    pub fn exceeded(&self, stats: &SolutionStats) -> Option<StopReason> {
        if stats.propagations > self.max_propagations {
            Some(StopReason::PropagationBudget)
        } else if stats.conflicts > self.max_conflicts {
            Some(StopReason::ConflictBudget)
        } else if stats.elapsed > self.max_time {
            Some(StopReason::TimeBudget)
        } else {
            None
        }
    }
}

/// Everything a solve needs besides the formula and the instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverConfig {
    pub budget: Budget,
    pub propagator: PropagatorType,
    pub analyser: AnalyserType,
}

impl SolverConfig {
    /// Configuration from the two strategy switches.
    #[must_use]
    pub const fn from_flags(budget: Budget, use_watched_literals: bool, use_first_uip: bool) -> Self {
        Self {
            budget,
            propagator: if use_watched_literals {
                PropagatorType::WatchedLiterals
            } else {
                PropagatorType::UnitSearch
            },
            analyser: if use_first_uip {
                AnalyserType::FirstUip
            } else {
                AnalyserType::AllDecisions
            },
        }
    }

    #[must_use]
    pub const fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }
}

/// Search counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Forced assignments made by the propagation engine.
    pub propagations: usize,
    /// Falsified clauses found by the propagation engine.
    pub conflicts: usize,
    pub decisions: usize,
    pub learnt_clauses: usize,
    pub elapsed: Duration,
}

/// The outcome of one solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    pub status: Status,
    /// The satisfying assignment, when `status` is [`Status::Sat`].
    pub model: Option<Model>,
    pub stats: SolutionStats,
    /// Set exactly when `status` is [`Status::Unknown`].
    pub stop_reason: Option<StopReason>,
}

impl SolveResult {
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self.status, Status::Sat)
    }

    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        matches!(self.status, Status::Unsat)
    }
}

/// Solves `cnf` with a fresh solver.
pub fn solve<I: Instrumentation + ?Sized>(
    cnf: &Cnf,
    config: &SolverConfig,
    sink: &mut I,
) -> SolveResult {
    Cdcl::new(cnf, config).solve(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_checks_are_strict() {
        let budget = Budget::unlimited().with_propagations(2).with_conflicts(1);
        let mut stats = SolutionStats {
            propagations: 2,
            conflicts: 1,
            ..SolutionStats::default()
        };
        assert_eq!(budget.exceeded(&stats), None);

        stats.conflicts = 2;
        assert_eq!(budget.exceeded(&stats), Some(StopReason::ConflictBudget));

        stats.propagations = 3;
        assert_eq!(budget.exceeded(&stats), Some(StopReason::PropagationBudget));
    }

    #[test]
    fn test_time_budget() {
        let budget = Budget::unlimited().with_time(Duration::from_millis(5));
        let stats = SolutionStats {
            elapsed: Duration::from_millis(6),
            ..SolutionStats::default()
        };
        assert_eq!(budget.exceeded(&stats), Some(StopReason::TimeBudget));
    }

    #[test]
    fn test_from_flags() {
        let config = SolverConfig::from_flags(Budget::default(), false, true);
        assert_eq!(config.propagator, PropagatorType::UnitSearch);
        assert_eq!(config.analyser, AnalyserType::FirstUip);

        let config = SolverConfig::from_flags(Budget::default(), true, false);
        assert_eq!(config.propagator, PropagatorType::WatchedLiterals);
        assert_eq!(config.analyser, AnalyserType::AllDecisions);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Sat.to_string(), "SATISFIABLE");
        assert_eq!(Status::Unknown.to_string(), "UNKNOWN");
    }
}
