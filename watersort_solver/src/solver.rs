use crate::engine::{Board, BoardKey, Move};
use crate::heuristics::{order_moves, MoveOrdering};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Recursion budget used when none is configured.
pub const DEFAULT_MAX_DEPTH: u32 = 350;

/// Parameters of one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of moves explored along one path.
    pub max_depth: u32,
    /// Seed of the shuffle that precedes move ordering. `None` draws one
    /// from the operating system, so runs are not reproducible.
    pub seed: Option<u64>,
    pub ordering: MoveOrdering,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
            ordering: MoveOrdering::default(),
        }
    }
}

/// Counters collected while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes whose moves were enumerated.
    pub nodes_expanded: u64,
    /// Nodes cut short because their key was already in the dead-end memo.
    pub memo_hits: u64,
    /// Nodes added to the dead-end memo.
    pub dead_ends: u64,
    /// Nodes reached with no budget left.
    pub budget_exhausted: u64,
}

/// Depth-limited backtracking search with a dead-end memo.
///
/// A solver owns its memo and random generator and is meant for a single
/// top-level search: build a fresh one for every puzzle state you want to
/// solve.
///
/// The memo records boards that had no winning continuation *within the
/// budget remaining when they were explored*. Entries are never revisited,
/// so a board that failed with a small budget also fails when reached later
/// with a larger one. This trades completeness for speed and is kept as is.
pub struct Solver {
    config: SolverConfig,
    rng: SmallRng,
    dead_ends: FxHashSet<BoardKey>,
    stats: SearchStats,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Solver {
            config,
            rng,
            dead_ends: FxHashSet::default(),
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Number of boards currently recorded as dead ends.
    pub fn memo_len(&self) -> usize {
        self.dead_ends.len()
    }

    pub fn is_dead_end(&self, board: &Board) -> bool {
        self.dead_ends.contains(&board.canonical_key())
    }

    /// Searches from `board` with the configured `max_depth`.
    ///
    /// A zero budget fails before anything else is looked at. Otherwise a
    /// board that is already won yields an empty move list.
    pub fn solve_from_root(&mut self, board: &Board) -> Option<Vec<Move>> {
        let depth = self.config.max_depth;
        debug!(
            bottles = board.len(),
            depth,
            ordering = ?self.config.ordering,
            "starting search"
        );

        let result = if depth == 0 {
            None
        } else if board.is_win() {
            Some(Vec::new())
        } else {
            self.solve(board, depth)
        };

        debug!(
            found = result.is_some(),
            moves = result.as_ref().map_or(0, Vec::len),
            nodes_expanded = self.stats.nodes_expanded,
            memo_hits = self.stats.memo_hits,
            dead_ends = self.stats.dead_ends,
            "search finished"
        );
        result
    }

    /// Finds a move sequence from `board` to a won board using at most
    /// `remaining_depth` moves.
    ///
    /// # Returns
    /// * `Some(moves)`: the first winning sequence found under the move
    ///   ordering. Never empty: `board` itself is not tested for a win.
    /// * `None`: the budget ran out, `board` is a known dead end, or no
    ///   move leads to a win within the budget. The last case records
    ///   `board` in the dead-end memo.
    pub fn solve(&mut self, board: &Board, remaining_depth: u32) -> Option<Vec<Move>> {
        if remaining_depth == 0 {
            self.stats.budget_exhausted += 1;
            return None;
        }

        let key = board.canonical_key();
        if self.dead_ends.contains(&key) {
            self.stats.memo_hits += 1;
            trace!(remaining_depth, "dead-end memo hit");
            return None;
        }

        self.stats.nodes_expanded += 1;
        let mut moves = board.moves();
        order_moves(board, &mut moves, self.config.ordering, &mut self.rng);

        for mv in moves {
            let next_board = board.with_move(mv);
            if next_board.is_win() {
                return Some(vec![mv]);
            }
            if let Some(mut rest) = self.solve(&next_board, remaining_depth - 1) {
                rest.insert(0, mv);
                return Some(rest);
            }
        }

        trace!(remaining_depth, "recording dead end");
        self.stats.dead_ends += 1;
        self.dead_ends.insert(key);
        None
    }
}

/// Solves `board` with a fresh `Solver` built from `config`.
pub fn solve_dfs(board: &Board, config: SolverConfig) -> Option<Vec<Move>> {
    Solver::new(config).solve_from_root(board)
}

/// Plays `moves` on a copy of `board`, returning the final board.
///
/// # Returns
/// `None` if some move is illegal on the board it is applied to.
pub fn replay(board: &Board, moves: &[Move]) -> Option<Board> {
    let mut current = board.clone();
    for &mv in moves {
        if !current.is_valid_move(mv) {
            return None;
        }
        current.apply_move(mv);
    }
    Some(current)
}
