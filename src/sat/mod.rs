#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod cdcl;
pub mod clause;
pub mod clause_storage;
pub mod cnf;
pub mod conflict_analysis;
pub mod dimacs;
pub mod instrumentation;
pub mod literal;
pub mod pacing;
pub mod propagation;
pub mod solver;
pub mod trail;
pub mod watch;
