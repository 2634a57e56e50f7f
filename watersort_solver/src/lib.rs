//! # Water-Sort Solver Library
//!
//! This library provides the game model for the water-sort puzzle and a
//! depth-limited backtracking solver that finds a sequence of pours leaving
//! every bottle either empty or full of a single color.
//!
//! It is used by four binaries:
//! - `human_player`: play a board interactively from the command line.
//! - `ai_solver`: read a board file, search for a solution and print it.
//! - `heuristic_evaluator`: compare move orderings over random boards.
//! - `autoplay`: run the extract/solve/replay loop against a simulated puzzle.
//!
//! ## Modules
//! - `engine`: segments, bottles, the `Board` with move generation and
//!   application, the win test and the memoization key; `Game` for play.
//! - `solver`: the `Solver` search engine and the `solve_dfs` entry point.
//! - `heuristics`: move ordering and board diagnostics.
//! - `player`: interfaces to an external puzzle and the `Autoplayer` loop.
//! - `utils`: the text board format.

pub mod engine;
pub mod heuristics;
pub mod player;
pub mod solver;
pub mod utils;

pub use engine::{Board, Move};
pub use solver::{solve_dfs, Solver, SolverConfig};
