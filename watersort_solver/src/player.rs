//! Replaying solutions against an external puzzle.
//!
//! The puzzle itself lives outside this crate (a game window, a web page).
//! It is reached through two narrow interfaces: `BoardSource` reads the
//! current bottles and `PourActuator` performs the "select bottle" action,
//! two of which make a pour. `Clock` spaces those actions in time.
//!
//! `Autoplayer` runs the whole loop: extract, solve with a fresh solver,
//! replay, wait, and start over against the new state.
use crate::engine::{Board, Move};
use crate::solver::{Solver, SolverConfig};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("could not read the puzzle state: {0}")]
    Extraction(String),
    #[error("bottle {index} does not exist (the board has {bottles})")]
    NoSuchBottle { index: usize, bottles: usize },
    #[error("the puzzle rejected the pour {from} -> {to}")]
    RejectedPour { from: usize, to: usize },
    #[error("action failed: {0}")]
    Action(String),
}

/// Produces the puzzle's current bottles.
pub trait BoardSource {
    fn extract(&mut self) -> Result<Board, PlayerError>;
}

/// Performs the external action on one bottle. A pour is two actions: the
/// source, then the destination.
pub trait PourActuator {
    fn perform(&mut self, bottle: usize) -> Result<(), PlayerError>;
}

/// Waits between actions.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Real time, through `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that never waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantClock;

impl Clock for InstantClock {
    fn sleep(&mut self, _duration: Duration) {}
}

/// Spacing of replayed actions. The values only need to match the external
/// puzzle's animation latency; the solver does not depend on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Time between the first actions of two consecutive moves. The second
    /// action of a move comes half an interval after its first.
    pub move_interval: Duration,
    /// Pause after a full replay before the puzzle is read again.
    pub cycle_delay: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        PlaybackTiming {
            move_interval: Duration::from_millis(50),
            cycle_delay: Duration::from_millis(75),
        }
    }
}

/// Replays `moves` in order: for each, perform the source, wait half an
/// interval, perform the destination, wait the rest of the interval.
///
/// Stops at the first failing action.
pub fn play_solution<A, C>(
    moves: &[Move],
    actuator: &mut A,
    clock: &mut C,
    timing: &PlaybackTiming,
) -> Result<(), PlayerError>
where
    A: PourActuator + ?Sized,
    C: Clock + ?Sized,
{
    let half = timing.move_interval / 2;
    for (step, mv) in moves.iter().enumerate() {
        debug!(step, from = mv.from, to = mv.to, "replaying move");
        actuator.perform(mv.from)?;
        clock.sleep(half);
        actuator.perform(mv.to)?;
        clock.sleep(timing.move_interval - half);
    }
    Ok(())
}

/// Settings of the extract/solve/replay loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AutoplayConfig {
    pub solver: SolverConfig,
    pub timing: PlaybackTiming,
    /// When a search fails, wait `cycle_delay` and try again against a
    /// freshly read board instead of stopping.
    pub retry_on_failure: bool,
    /// Upper bound on the number of cycles; `None` runs until the puzzle is
    /// won or a search fails.
    pub max_cycles: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoplayOutcome {
    /// The puzzle was read in a won state.
    Solved,
    /// A search failed and retrying is disabled.
    NoSolution,
    /// `max_cycles` was reached first.
    CycleLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoplayReport {
    pub outcome: AutoplayOutcome,
    /// Boards read from the puzzle.
    pub cycles: usize,
    pub moves_played: usize,
    pub nodes_expanded: u64,
}

/// Drives a puzzle to completion.
///
/// Every cycle gets its own `Solver`, hence an empty dead-end memo. With a
/// configured seed, cycle `n` uses `seed + n` so that a retry explores a
/// different order.
pub struct Autoplayer<C: Clock> {
    config: AutoplayConfig,
    clock: C,
}

impl<C: Clock> Autoplayer<C> {
    pub fn new(config: AutoplayConfig, clock: C) -> Self {
        Autoplayer { config, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn solver_config(&self, cycle: usize) -> SolverConfig {
        SolverConfig {
            seed: self
                .config
                .solver
                .seed
                .map(|seed| seed.wrapping_add(cycle as u64)),
            ..self.config.solver
        }
    }

    pub fn run<P>(&mut self, puzzle: &mut P) -> Result<AutoplayReport, PlayerError>
    where
        P: BoardSource + PourActuator + ?Sized,
    {
        let mut cycles = 0;
        let mut moves_played = 0;
        let mut nodes_expanded = 0;

        let outcome = loop {
            if self.config.max_cycles.is_some_and(|limit| cycles >= limit) {
                break AutoplayOutcome::CycleLimit;
            }

            let board = puzzle.extract()?;
            let cycle = cycles;
            cycles += 1;
            if board.is_win() {
                info!(cycles, moves_played, "puzzle solved");
                break AutoplayOutcome::Solved;
            }

            let mut solver = Solver::new(self.solver_config(cycle));
            let solution = solver.solve_from_root(&board);
            nodes_expanded += solver.stats().nodes_expanded;

            match solution {
                Some(moves) => {
                    info!(cycle, moves = moves.len(), "solution found, replaying");
                    play_solution(&moves, &mut *puzzle, &mut self.clock, &self.config.timing)?;
                    moves_played += moves.len();
                }
                None if self.config.retry_on_failure => {
                    warn!(cycle, "no solution found, retrying");
                }
                None => {
                    warn!(cycle, "no solution found");
                    break AutoplayOutcome::NoSolution;
                }
            }
            self.clock.sleep(self.config.timing.cycle_delay);
        };

        Ok(AutoplayReport {
            outcome,
            cycles,
            moves_played,
            nodes_expanded,
        })
    }
}

/// An in-memory puzzle that behaves like a clickable game: the first
/// `perform` selects a bottle, the second pours into another one.
/// Selecting the same bottle twice cancels the selection.
#[derive(Clone, Debug)]
pub struct SimulatedPuzzle {
    board: Board,
    selected: Option<usize>,
    pours: usize,
}

impl SimulatedPuzzle {
    pub fn new(board: Board) -> Self {
        SimulatedPuzzle {
            board,
            selected: None,
            pours: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Successful pours so far.
    pub fn pours(&self) -> usize {
        self.pours
    }
}

impl BoardSource for SimulatedPuzzle {
    fn extract(&mut self) -> Result<Board, PlayerError> {
        Ok(self.board.clone())
    }
}

impl PourActuator for SimulatedPuzzle {
    fn perform(&mut self, bottle: usize) -> Result<(), PlayerError> {
        if bottle >= self.board.len() {
            return Err(PlayerError::NoSuchBottle {
                index: bottle,
                bottles: self.board.len(),
            });
        }
        match self.selected.take() {
            None => self.selected = Some(bottle),
            Some(from) if from == bottle => {}
            Some(from) => {
                let mv = Move::new(from, bottle);
                if !self.board.is_valid_move(mv) {
                    return Err(PlayerError::RejectedPour { from, to: bottle });
                }
                self.board.apply_move(mv);
                self.pours += 1;
            }
        }
        Ok(())
    }
}
