//! Move-ordering heuristics and board diagnostics.
//!
//! The solver never scores boards for their own sake: the heuristic is only
//! a sort key that decides which sibling move is tried first.
use crate::engine::{Board, Color, Move};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashSet;

/// How the solver orders the legal moves of a node before trying them.
///
/// Every variant starts with a random shuffle to break the structural bias
/// of `Board::moves`; the sorts that follow are stable, so ties keep their
/// shuffled order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MoveOrdering {
    /// Try first the moves that leave the most empty bottles.
    #[default]
    MostEmptyFirst,
    /// Ascending by empty-bottle count, the opposite greedy preference.
    FewestEmptyFirst,
    /// Shuffle only, no heuristic sort.
    ShuffleOnly,
}

/// The heuristic score of a board: its number of empty bottles.
pub fn heuristic_score(board: &Board) -> usize {
    board.count_empty()
}

/// Computes `heuristic_score(&board.with_move(mv))` without building the
/// resulting board.
///
/// A pour empties the source iff it held a single segment, and fills the
/// destination iff it was empty. Both cannot happen for a legal move.
pub fn heuristic_score_after(board: &Board, mv: Move) -> usize {
    let src = board.bottle(mv.from);
    let dst = board.bottle(mv.to);
    let emptied = usize::from(src.segments().len() == 1);
    let filled = usize::from(dst.is_empty());
    board.count_empty() + emptied - filled
}

/// Reorders `moves` in place: a shuffle driven by `rng`, then a stable sort
/// according to `ordering`.
pub fn order_moves<R: Rng + ?Sized>(
    board: &Board,
    moves: &mut [Move],
    ordering: MoveOrdering,
    rng: &mut R,
) {
    moves.shuffle(rng);
    match ordering {
        MoveOrdering::MostEmptyFirst => {
            moves.sort_by_cached_key(|&mv| Reverse(heuristic_score_after(board, mv)))
        }
        MoveOrdering::FewestEmptyFirst => {
            moves.sort_by_cached_key(|&mv| heuristic_score_after(board, mv))
        }
        MoveOrdering::ShuffleOnly => {}
    }
}

/// Counts the distinct colors present on the board.
pub fn count_distinct_colors(board: &Board) -> usize {
    let colors: HashSet<&Color> = board
        .bottles()
        .iter()
        .flat_map(|b| b.segments())
        .map(|s| s.color())
        .collect();
    colors.len()
}

/// Counts bottles that are already in their final state: full with a single
/// segment. Empty bottles are not counted.
pub fn count_sorted_bottles(board: &Board) -> usize {
    board
        .bottles()
        .iter()
        .filter(|b| !b.is_empty() && b.is_solved(board.capacity()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sample_board() -> Board {
        Board::from_layout(
            8,
            &[
                &[("red", 2)],
                &[],
                &[("blue", 2), ("red", 2)],
                &[("green", 3)],
            ],
        )
    }

    #[test]
    fn test_heuristic_score_after_matches_applied_board() {
        let board = sample_board();
        for mv in board.moves() {
            assert_eq!(
                heuristic_score_after(&board, mv),
                heuristic_score(&board.with_move(mv)),
                "mismatch for {mv}"
            );
        }
    }

    #[test]
    fn test_order_moves_most_empty_first() {
        let board = Board::from_layout(8, &[&[("red", 2)], &[], &[("blue", 2), ("red", 2)]]);
        // 2->0 keeps one empty bottle, 2->1 fills it, 0->2 empties bottle 0
        let mut rng = SmallRng::seed_from_u64(1);
        let mut moves = board.moves();
        assert_eq!(moves.len(), 3);
        order_moves(&board, &mut moves, MoveOrdering::MostEmptyFirst, &mut rng);
        assert_eq!(moves[0], Move::new(0, 2));
        assert_eq!(moves[2], Move::new(2, 1));

        order_moves(&board, &mut moves, MoveOrdering::FewestEmptyFirst, &mut rng);
        assert_eq!(moves[0], Move::new(2, 1));
        assert_eq!(moves[2], Move::new(0, 2));
    }

    #[test]
    fn test_order_moves_is_a_permutation() {
        let board = Board::new_random_with_seed(6, 2, 5, 3);
        let original = board.moves();
        for ordering in [
            MoveOrdering::MostEmptyFirst,
            MoveOrdering::FewestEmptyFirst,
            MoveOrdering::ShuffleOnly,
        ] {
            let mut rng = SmallRng::seed_from_u64(42);
            let mut moves = original.clone();
            order_moves(&board, &mut moves, ordering, &mut rng);
            let mut sorted_a = moves.clone();
            let mut sorted_b = original.clone();
            sorted_a.sort_by_key(|m| (m.from, m.to));
            sorted_b.sort_by_key(|m| (m.from, m.to));
            assert_eq!(sorted_a, sorted_b);
        }
    }

    #[test]
    fn test_order_moves_same_seed_same_order() {
        let board = Board::new_random_with_seed(6, 2, 5, 8);
        let mut first = board.moves();
        let mut second = board.moves();
        let ordering = MoveOrdering::ShuffleOnly;
        order_moves(&board, &mut first, ordering, &mut SmallRng::seed_from_u64(5));
        order_moves(&board, &mut second, ordering, &mut SmallRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_count_distinct_colors() {
        assert_eq!(count_distinct_colors(&sample_board()), 3);
        assert_eq!(count_distinct_colors(&Board::from_layout(8, &[&[]])), 0);
    }

    #[test]
    fn test_count_sorted_bottles() {
        let board = Board::from_layout(
            4,
            &[&[("red", 4)], &[], &[("blue", 2), ("blue", 2)], &[("green", 3)]],
        );
        assert_eq!(count_sorted_bottles(&board), 1);
    }
}
