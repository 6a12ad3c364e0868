use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tinysat::sat::cnf::Cnf;
use tinysat::sat::conflict_analysis::AnalyserType;
use tinysat::sat::dimacs::parse_str;
use tinysat::sat::instrumentation::{
    Checkpoint, Control, Event, Instrumentation, NoopInstrumentation, Recorder,
};
use tinysat::sat::literal::Literal;
use tinysat::sat::pacing::{Delays, Paced, PacingControl};
use tinysat::sat::propagation::PropagatorType;
use tinysat::sat::solver::{Budget, SolveResult, SolverConfig, Status, StopReason, solve};

fn all_configs(budget: Budget) -> Vec<SolverConfig> {
    let mut configs = Vec::new();
    for propagator in [PropagatorType::UnitSearch, PropagatorType::WatchedLiterals] {
        for analyser in [AnalyserType::FirstUip, AnalyserType::AllDecisions] {
            configs.push(SolverConfig {
                budget,
                propagator,
                analyser,
            });
        }
    }
    configs
}

fn unlimited() -> SolverConfig {
    SolverConfig::default().with_budget(Budget::unlimited())
}

fn solve_quietly(cnf: &Cnf, config: &SolverConfig) -> SolveResult {
    solve(cnf, config, &mut NoopInstrumentation)
}

fn pigeonhole(pigeons: i32, holes: i32) -> Cnf {
    let var = |p: i32, h: i32| p * holes + h + 1;
    let mut clauses: Vec<Vec<i32>> = (0..pigeons)
        .map(|p| (0..holes).map(|h| var(p, h)).collect())
        .collect();
    for h in 0..holes {
        for p in 0..pigeons {
            for q in p + 1..pigeons {
                clauses.push(vec![-var(p, h), -var(q, h)]);
            }
        }
    }
    Cnf::new(clauses)
}

struct AbortImmediately;

impl Instrumentation for AbortImmediately {
    fn should_abort(&self) -> bool {
        true
    }
}

/// Aborts at the given decision.
struct AbortAtDecision {
    remaining: usize,
    recorder: Recorder,
}

impl Instrumentation for AbortAtDecision {
    fn on_decide(&mut self, lit: Literal) {
        self.recorder.on_decide(lit);
    }

    fn on_propagate(&mut self, lit: Literal) {
        self.recorder.on_propagate(lit);
    }

    fn on_result(&mut self, status: Status) {
        self.recorder.on_result(status);
    }

    fn checkpoint(&mut self, at: Checkpoint) -> Control {
        if at == Checkpoint::Decide {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                return Control::Abort;
            }
        }
        Control::Continue
    }
}

#[test]
fn test_single_unit_clause() {
    for config in all_configs(Budget::default()) {
        let result = solve_quietly(&Cnf::new(vec![vec![1]]), &config);
        assert_eq!(result.status, Status::Sat);
        assert_eq!(result.model.map(|m| m.literals()), Some(vec![1]));
        assert_eq!(result.stop_reason, None);
    }
}

#[test]
fn test_contradicting_unit_clauses() {
    for config in all_configs(Budget::default()) {
        let result = solve_quietly(&Cnf::new(vec![vec![1], vec![-1]]), &config);
        assert_eq!(result.status, Status::Unsat, "{config:?}");
        assert!(result.model.is_none());
    }
}

#[test]
fn test_every_sign_combination_of_two_variables() {
    let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]);
    for config in all_configs(Budget::default()) {
        let result = solve_quietly(&cnf, &config);
        assert_eq!(result.status, Status::Unsat, "{config:?}");
        assert!(result.stats.conflicts >= 1, "{config:?}");
        assert!(result.stats.learnt_clauses >= 1, "{config:?}");
    }
}

#[test]
fn test_zero_propagation_budget_still_decides() {
    let cnf = Cnf::new(vec![vec![1, 2]]);
    for config in all_configs(Budget::default().with_propagations(0)) {
        let result = solve_quietly(&cnf, &config);
        assert_eq!(result.status, Status::Sat, "{config:?}");
        assert_eq!(result.stats.propagations, 0);
        assert_eq!(result.stats.decisions, 2);
        assert!(result.model.is_some_and(|m| cnf.verify(&m)));
    }
}

#[test]
fn test_abort_before_search_leaves_fresh_solver_unaffected() {
    let cnf = Cnf::new(vec![vec![1, 2], vec![-1]]);
    let config = SolverConfig::default();

    let aborted = solve(&cnf, &config, &mut AbortImmediately);
    assert_eq!(aborted.status, Status::Unknown);
    assert_eq!(aborted.stop_reason, Some(StopReason::Aborted));
    assert!(aborted.model.is_none());

    let fresh = solve_quietly(&cnf, &config);
    assert_eq!(fresh.status, Status::Sat);
    assert_eq!(fresh.model.map(|m| m.literals()), Some(vec![-1, 2]));
}

#[test]
fn test_abort_from_checkpoint() {
    let mut sink = AbortAtDecision {
        remaining: 2,
        recorder: Recorder::new(),
    };
    let result = solve(&pigeonhole(4, 3), &SolverConfig::default(), &mut sink);

    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.stop_reason, Some(StopReason::Aborted));
    assert_eq!(result.stats.decisions, 2);
    let events = &sink.recorder.events;
    assert_eq!(events.last(), Some(&Event::Result(Status::Unknown)));
    assert!(matches!(events[events.len() - 2], Event::Decide(_)));
}

#[test]
fn test_pigeonhole_is_unsat() {
    let cnf = pigeonhole(4, 3);
    for config in all_configs(Budget::unlimited()) {
        let result = solve_quietly(&cnf, &config);
        assert_eq!(result.status, Status::Unsat, "{config:?}");
    }
}

#[test]
fn test_pigeonhole_with_room_is_sat() {
    let cnf = pigeonhole(4, 4);
    for config in all_configs(Budget::unlimited()) {
        let result = solve_quietly(&cnf, &config);
        assert_eq!(result.status, Status::Sat, "{config:?}");
        assert!(result.model.is_some_and(|m| cnf.verify(&m)), "{config:?}");
    }
}

#[test]
fn test_conflict_budget() {
    let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]);
    let config = SolverConfig::default().with_budget(Budget::unlimited().with_conflicts(0));
    let result = solve_quietly(&cnf, &config);

    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.stop_reason, Some(StopReason::ConflictBudget));
    assert_eq!(result.stats.conflicts, 1);
}

#[test]
fn test_time_budget() {
    let config =
        SolverConfig::default().with_budget(Budget::unlimited().with_time(Duration::from_nanos(1)));
    let result = solve_quietly(&pigeonhole(9, 8), &config);

    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.stop_reason, Some(StopReason::TimeBudget));
}

#[test]
fn test_events_follow_the_search() {
    let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]);
    for config in all_configs(Budget::default()) {
        let mut recorder = Recorder::new();
        let result = solve(&cnf, &config, &mut recorder);
        let events = &recorder.events;

        assert_eq!(events.last(), Some(&Event::Result(result.status)));
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::Result(_))).count(),
            1
        );

        for (i, event) in events.iter().enumerate() {
            match event {
                Event::Decide(_) => {
                    assert_eq!(events[i - 1], Event::RoundDone, "{config:?}");
                }
                Event::Learn(clause) => {
                    let before = match &events[i - 1] {
                        Event::Analyze { .. } => &events[i - 2],
                        other => other,
                    };
                    assert_eq!(*before, Event::RoundDone, "{config:?}");
                    assert!(matches!(events[i + 1], Event::Backjump(_)), "{config:?}");
                    assert_eq!(events[i + 2], Event::Propagate(clause[0]), "{config:?}");
                }
                Event::RoundDone => {
                    assert!(
                        !matches!(events.get(i + 1), Some(Event::Propagate(_) | Event::Conflict(_))),
                        "{config:?}"
                    );
                }
                _ => {}
            }
        }
    }
}

#[test]
fn test_resolving_is_idempotent() {
    let cnf = parse_str(
        "p cnf 5 6\n1 2 -3 0\n-1 -2 0\n2 3 4 0\n-4 5 0\n-5 -3 0\n3 -2 5 0\n",
    )
    .unwrap();
    for config in all_configs(Budget::default()) {
        let first = solve_quietly(&cnf, &config);
        let second = solve_quietly(&cnf, &config);
        assert_eq!(first.status, second.status);
        assert_eq!(first.model, second.model);
        assert_eq!(first.stats.decisions, second.stats.decisions);
    }
}

#[test]
fn test_formula_with_empty_clause() {
    let cnf = parse_str("p cnf 2 2\n1 2 0\n0\n").unwrap();
    let result = solve_quietly(&cnf, &SolverConfig::default());
    assert_eq!(result.status, Status::Unsat);
    assert_eq!(result.stats.decisions, 0);
}

#[test]
fn test_unused_variables_are_assigned() {
    let cnf = parse_str("p cnf 4 1\n4 0\n").unwrap();
    let result = solve_quietly(&cnf, &SolverConfig::default());
    assert_eq!(result.model.map(|m| m.to_string()), Some("v 1 2 3 4 0".to_string()));
}

#[test]
fn test_pause_then_resume() {
    let control = PacingControl::shared();
    control.pause();
    let mut sink = Paced::with_control(NoopInstrumentation, Delays::zero(), Arc::clone(&control));

    let handle = thread::spawn(move || solve(&pigeonhole(5, 4), &unlimited(), &mut sink));
    thread::sleep(Duration::from_millis(50));
    assert!(!handle.is_finished());

    control.resume();
    let result = handle.join().unwrap();
    assert_eq!(result.status, Status::Unsat);
}

#[test]
fn test_pause_then_abort() {
    let control = PacingControl::shared();
    control.pause();
    let mut sink = Paced::with_control(NoopInstrumentation, Delays::zero(), Arc::clone(&control));

    let handle = thread::spawn(move || solve(&pigeonhole(5, 4), &unlimited(), &mut sink));
    thread::sleep(Duration::from_millis(50));
    control.abort();

    let result = handle.join().unwrap();
    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.stop_reason, Some(StopReason::Aborted));
}
