//! A small conflict-driven clause-learning SAT solver whose every step can be
//! observed, paced and interrupted.
//!
//! ```
//! use tinysat::sat::cnf::Cnf;
//! use tinysat::sat::instrumentation::NoopInstrumentation;
//! use tinysat::sat::solver::{solve, SolverConfig, Status};
//!
//! let cnf = Cnf::new(vec![vec![1, 2], vec![-1]]);
//! let result = solve(&cnf, &SolverConfig::default(), &mut NoopInstrumentation);
//! assert_eq!(result.status, Status::Sat);
//! assert!(cnf.verify(&result.model.unwrap()));
//! ```

/// The `sat` module implements the solver: formulas, the DIMACS reader, the
/// propagation and conflict analysis strategies, the search driver and its
/// instrumentation.
pub mod sat;
