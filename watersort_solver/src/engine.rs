//! Core model for the water-sort puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Color` and `Segment`: a contiguous unit of one liquid color with a height.
//! - `Bottle`: a capacity-bounded stack of segments, bottom to top.
//! - `Board`: every bottle at one point in time, with move generation,
//!   move application, the win test and the canonical memoization key.
//! - `Game`: an interactive session over a board with history for undo.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

/// Physical capacity of a bottle in the reference puzzle.
///
/// Boards built with `Board::new` use this value; `Board::with_capacity`
/// allows other sizes (the tests mostly use 8).
pub const CAPACITY: u32 = 20;

/// Names handed out by the random board generator, in order.
const PALETTE: [&str; 12] = [
    "red", "blue", "yellow", "green", "purple", "orange", "cyan", "magenta", "lime", "pink",
    "brown", "navy",
];

/// An opaque, comparable liquid color.
///
/// Colors are compared by name. Cloning is cheap (reference counted), which
/// matters because the solver copies boards at every search node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(Arc<str>);

impl Color {
    pub fn new(name: &str) -> Self {
        Color(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(name: &str) -> Self {
        Color::new(name)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contiguous colored unit of liquid inside a bottle.
///
/// Segments are immutable once created. Pouring onto a segment of the same
/// color replaces both with a new, taller segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    color: Color,
    height: u32,
}

impl Segment {
    pub fn new(color: impl Into<Color>, height: u32) -> Self {
        Segment {
            color: color.into(),
            height,
        }
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Two segments can be merged iff they share a color.
    pub fn is_mergeable_with(&self, other: &Segment) -> bool {
        self.color == other.color
    }
}

/// A bottle: an ordered stack of segments (index 0 is the bottom) together
/// with its cached total height.
///
/// Invariant: `total_height` always equals the sum of the segment heights.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bottle {
    segments: Vec<Segment>,
    total_height: u32,
}

impl Bottle {
    /// Creates a bottle without any liquid.
    pub fn empty() -> Self {
        Bottle::default()
    }

    /// Creates a bottle from segments listed bottom to top.
    ///
    /// No validation is performed: callers are trusted to respect the
    /// capacity and to supply positive heights.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let total_height = segments.iter().map(Segment::height).sum();
        Bottle {
            segments,
            total_height,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The topmost segment, the one a pour would move.
    pub fn top(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn is_full(&self, capacity: u32) -> bool {
        self.total_height >= capacity
    }

    /// A bottle is solved when it holds fewer than two segments and is
    /// either empty or filled exactly to `capacity`.
    ///
    /// The rule counts segments, not distinct colors: two unmerged segments
    /// of one color are not solved.
    pub fn is_solved(&self, capacity: u32) -> bool {
        self.segments.len() < 2 && (self.total_height == 0 || self.total_height == capacity)
    }

    fn pop(&mut self) -> Option<Segment> {
        let segment = self.segments.pop()?;
        self.total_height = match self.total_height.checked_sub(segment.height) {
            Some(height) => height,
            None => panic!(
                "bottle height underflow: removing {} from {}",
                segment.height, self.total_height
            ),
        };
        Some(segment)
    }

    fn push(&mut self, segment: Segment) {
        self.total_height += segment.height;
        self.segments.push(segment);
    }
}

/// A pour of the top segment of bottle `from` into bottle `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Structural identity of a board, used as the dead-end memo key.
///
/// Two boards with the same bottles, in the same order, holding the same
/// `(color, height)` sequences produce equal keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoardKey(Box<[Bottle]>);

/// A complete, self-contained puzzle state.
///
/// Bottle order is fixed; a bottle's index is its identity and is what
/// `Move` refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    bottles: Vec<Bottle>,
    capacity: u32,
}

impl Board {
    /// Creates a board whose bottles hold `CAPACITY` units each.
    pub fn new(bottles: Vec<Bottle>) -> Self {
        Board::with_capacity(CAPACITY, bottles)
    }

    /// Creates a board with an explicit bottle capacity.
    pub fn with_capacity(capacity: u32, bottles: Vec<Bottle>) -> Self {
        Board { bottles, capacity }
    }

    /// Builds a board from `(color, height)` pairs per bottle, bottom first.
    ///
    /// # Examples
    /// ```
    /// use watersort_solver::engine::Board;
    /// let board = Board::from_layout(8, &[&[("red", 4), ("blue", 4)], &[]]);
    /// assert_eq!(board.len(), 2);
    /// assert_eq!(board.bottle(0).total_height(), 8);
    /// assert!(board.bottle(1).is_empty());
    /// ```
    pub fn from_layout(capacity: u32, layout: &[&[(&str, u32)]]) -> Self {
        let bottles = layout
            .iter()
            .map(|segments| {
                Bottle::from_segments(
                    segments
                        .iter()
                        .map(|&(color, height)| Segment::new(color, height))
                        .collect(),
                )
            })
            .collect();
        Board::with_capacity(capacity, bottles)
    }

    /// Creates a scrambled board with a fixed seed (`514514`): six colors,
    /// two empty bottles, units of 5.
    pub fn new_random() -> Self {
        Board::new_random_with_seed(6, 2, 5, 514514)
    }

    /// Creates a scrambled board, reproducible from `seed`.
    ///
    /// Each of the `colors` colors totals `CAPACITY`, split into units of
    /// `unit`. All units are shuffled across `colors` full bottles, adjacent
    /// units of equal color are merged into one segment, and `empty_bottles`
    /// empty bottles are appended.
    ///
    /// # Panics
    /// Panics if `unit` is zero or does not divide `CAPACITY`.
    pub fn new_random_with_seed(colors: usize, empty_bottles: usize, unit: u32, seed: u64) -> Self {
        assert!(
            unit > 0 && CAPACITY % unit == 0,
            "unit {unit} must divide the capacity {CAPACITY}"
        );
        let units_per_bottle = (CAPACITY / unit) as usize;

        let names: Vec<Color> = (0..colors)
            .map(|i| match PALETTE.get(i) {
                Some(name) => Color::new(name),
                None => Color::new(&format!("color{i}")),
            })
            .collect();

        let mut units: Vec<usize> = (0..colors)
            .flat_map(|c| std::iter::repeat(c).take(units_per_bottle))
            .collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        units.shuffle(&mut rng);

        let mut bottles: Vec<Bottle> = units
            .chunks(units_per_bottle)
            .map(|chunk| {
                let mut segments: Vec<Segment> = Vec::new();
                for &c in chunk {
                    match segments.last_mut() {
                        Some(top) if top.color == names[c] => top.height += unit,
                        _ => segments.push(Segment::new(names[c].clone(), unit)),
                    }
                }
                Bottle::from_segments(segments)
            })
            .collect();
        bottles.extend((0..empty_bottles).map(|_| Bottle::empty()));

        Board::new(bottles)
    }

    pub fn bottles(&self) -> &[Bottle] {
        &self.bottles
    }

    /// # Panics
    /// Panics if `index` is out of range.
    pub fn bottle(&self, index: usize) -> &Bottle {
        &self.bottles[index]
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of bottles on the board.
    pub fn len(&self) -> usize {
        self.bottles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bottles.is_empty()
    }

    /// Checks whether pouring `mv.from` into `mv.to` is a legal move.
    ///
    /// A move is legal when:
    /// - both indices are on the board and differ,
    /// - the source holds at least one segment,
    /// - an empty destination receives only from a source with two or more
    ///   segments (moving a lone segment to an empty bottle changes nothing),
    /// - a non-empty destination is not full, its top color matches the
    ///   source's top color, and the poured height fits.
    pub fn is_valid_move(&self, mv: Move) -> bool {
        if mv.from == mv.to || mv.from >= self.bottles.len() || mv.to >= self.bottles.len() {
            return false;
        }
        let src = &self.bottles[mv.from];
        let dst = &self.bottles[mv.to];

        let Some(src_top) = src.top() else {
            return false;
        };
        let Some(dst_top) = dst.top() else {
            return src.segments.len() >= 2;
        };
        if dst.is_full(self.capacity) {
            return false;
        }
        src_top.is_mergeable_with(dst_top)
            && dst
                .total_height
                .checked_add(src_top.height)
                .is_some_and(|total| total <= self.capacity)
    }

    /// Enumerates every legal move.
    ///
    /// Sources are visited from the last bottle down to the first and,
    /// for each source, destinations from the first bottle up. The solver
    /// reorders this list, so the order carries no guarantee of its own.
    pub fn moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for from in (0..self.bottles.len()).rev() {
            for to in 0..self.bottles.len() {
                let mv = Move { from, to };
                if self.is_valid_move(mv) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// Applies `mv` in place.
    ///
    /// The source's top segment is removed. If the destination is empty the
    /// segment is placed there unchanged; otherwise the destination's top
    /// segment is replaced by one merged segment carrying the source color
    /// and both heights.
    ///
    /// `mv` must come from `moves()` on this very state. Anything else may
    /// break the bottle invariants.
    ///
    /// # Panics
    /// Panics if a bottle height would underflow or the source is empty;
    /// both mean move validation is broken.
    pub fn apply_move(&mut self, mv: Move) {
        let Some(poured) = self.bottles[mv.from].pop() else {
            panic!("invalid move {mv}: bottle {} is empty", mv.from);
        };
        let dst = &mut self.bottles[mv.to];
        match dst.pop() {
            None => dst.push(poured),
            Some(below) => dst.push(Segment {
                height: poured.height + below.height,
                color: poured.color,
            }),
        }
    }

    /// Returns an independent copy of the board with `mv` applied.
    pub fn with_move(&self, mv: Move) -> Board {
        let mut next = self.clone();
        next.apply_move(mv);
        next
    }

    /// True iff every bottle is solved (see `Bottle::is_solved`).
    pub fn is_win(&self) -> bool {
        self.bottles.iter().all(|b| b.is_solved(self.capacity))
    }

    /// Number of bottles holding no liquid.
    pub fn count_empty(&self) -> usize {
        self.bottles.iter().filter(|b| b.is_empty()).count()
    }

    /// Structural key for memoization. Capacity is not part of the key;
    /// a solver only ever compares boards of one puzzle.
    pub fn canonical_key(&self) -> BoardKey {
        BoardKey(self.bottles.clone().into_boxed_slice())
    }
}

impl fmt::Display for Board {
    /// One line per bottle: index, fill level and segments bottom to top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bottle) in self.bottles.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>2} [{:>2}/{}]", i, bottle.total_height, self.capacity)?;
            if bottle.is_empty() {
                write!(f, " -")?;
            }
            for segment in &bottle.segments {
                write!(f, " {}:{}", segment.color, segment.height)?;
            }
        }
        Ok(())
    }
}

/// An interactive session over a board: tracks steps and keeps the board
/// history so moves can be undone.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    steps: u32,
    history: Vec<Board>,
}

impl Game {
    /// Starts a session from `Board::new_random()`.
    pub fn new() -> Self {
        Game::new_with_board(Board::new_random())
    }

    pub fn new_with_board(initial_board: Board) -> Self {
        Game {
            board: initial_board,
            steps: 0,
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Pours `from` into `to` if the move is legal.
    ///
    /// # Returns
    /// `true` if the move was played, `false` if it was rejected (the board
    /// is left untouched).
    pub fn process_move(&mut self, from: usize, to: usize) -> bool {
        let mv = Move::new(from, to);
        if !self.board.is_valid_move(mv) {
            return false;
        }
        self.history.push(self.board.clone());
        self.board.apply_move(mv);
        self.steps += 1;
        true
    }

    /// Restores the board from before the last played move.
    ///
    /// Merges are not reversible by pouring back, so undo always goes
    /// through the saved snapshot.
    pub fn undo_last_move(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.board = previous;
                self.steps -= 1;
                true
            }
            None => false,
        }
    }

    pub fn is_won(&self) -> bool {
        self.board.is_win()
    }

    /// No legal move remains and the board is not won.
    pub fn is_stuck(&self) -> bool {
        !self.is_won() && self.board.moves().is_empty()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_board;

    fn two_bottle_board() -> Board {
        parse_board("capacity 8\nred:4 blue:4\n-\n").unwrap()
    }

    #[test]
    fn test_bottle_total_height_is_cached() {
        let bottle = Bottle::from_segments(vec![Segment::new("red", 3), Segment::new("blue", 5)]);
        assert_eq!(bottle.total_height(), 8);
        assert_eq!(bottle.top().map(|s| s.color().name()), Some("blue"));
        assert!(Bottle::empty().is_empty());
    }

    #[test]
    fn test_bottle_solved_boundaries() {
        let capacity = 8;
        assert!(Bottle::empty().is_solved(capacity));
        assert!(Bottle::from_segments(vec![Segment::new("red", 8)]).is_solved(capacity));
        // one color but not full
        assert!(!Bottle::from_segments(vec![Segment::new("red", 4)]).is_solved(capacity));
        // two unmerged segments of one color filling the bottle do not count
        let split = Bottle::from_segments(vec![Segment::new("red", 4), Segment::new("red", 4)]);
        assert!(!split.is_solved(capacity));
    }

    #[test]
    fn test_moves_two_bottles_single_move() {
        let board = two_bottle_board();
        assert_eq!(board.moves(), vec![Move::new(0, 1)]);
    }

    #[test]
    fn test_apply_move_into_empty_bottle() {
        let mut board = two_bottle_board();
        board.apply_move(Move::new(0, 1));

        assert_eq!(board.bottle(0).segments(), &[Segment::new("red", 4)]);
        assert_eq!(board.bottle(1).segments(), &[Segment::new("blue", 4)]);
        assert_eq!(board.bottle(0).total_height(), 4);
        assert_eq!(board.bottle(1).total_height(), 4);
        assert!(!board.is_win());
    }

    #[test]
    fn test_apply_move_merges_with_destination_top() {
        let mut board = Board::from_layout(8, &[&[("red", 2), ("blue", 2)], &[("blue", 3)]]);
        assert!(board.is_valid_move(Move::new(0, 1)));
        board.apply_move(Move::new(0, 1));

        assert_eq!(board.bottle(0).segments(), &[Segment::new("red", 2)]);
        assert_eq!(board.bottle(1).segments(), &[Segment::new("blue", 5)]);
        assert_eq!(board.bottle(1).total_height(), 5);
    }

    #[test]
    fn test_move_rules() {
        let board = Board::from_layout(
            8,
            &[
                &[("red", 4)],              // 0: single segment
                &[],                        // 1: empty
                &[("blue", 4), ("red", 4)], // 2: full, top red
                &[("green", 2), ("red", 4)], // 3: top red, room for 2
                &[("red", 4)],              // 4: room for 4
            ],
        );
        // lone segment into an empty bottle is not a move
        assert!(!board.is_valid_move(Move::new(0, 1)));
        // empty source
        assert!(!board.is_valid_move(Move::new(1, 0)));
        // full destination
        assert!(!board.is_valid_move(Move::new(0, 2)));
        // not enough room: 6 + 4 > 8
        assert!(!board.is_valid_move(Move::new(0, 3)));
        // fits exactly: 4 + 4 == 8
        assert!(board.is_valid_move(Move::new(0, 4)));
        // same bottle
        assert!(!board.is_valid_move(Move::new(4, 4)));
        // out of range
        assert!(!board.is_valid_move(Move::new(0, 9)));
        // color mismatch
        let mismatch = Board::from_layout(8, &[&[("red", 2)], &[("blue", 2)]]);
        assert!(mismatch.moves().is_empty());
    }

    #[test]
    fn test_moves_enumeration_order() {
        let board = Board::from_layout(8, &[&[("red", 1)], &[("blue", 1), ("red", 1)], &[]]);
        // sources descend, destinations ascend
        assert_eq!(board.moves(), vec![Move::new(1, 0), Move::new(1, 2), Move::new(0, 1)]);
    }

    #[test]
    fn test_with_move_leaves_original_untouched() {
        let board = two_bottle_board();
        let next = board.with_move(Move::new(0, 1));
        assert_eq!(board, two_bottle_board());
        assert_ne!(board, next);
    }

    #[test]
    fn test_pour_back_does_not_undo_merge() {
        let original = Board::from_layout(8, &[&[("blue", 2)], &[("red", 1), ("blue", 3)]]);
        let mut board = original.clone();
        board.apply_move(Move::new(0, 1));
        assert!(board.is_valid_move(Move::new(1, 0)));
        board.apply_move(Move::new(1, 0));
        // the merged blue:5 travels back as one segment
        assert_ne!(board, original);
        assert_eq!(board.bottle(0).segments(), &[Segment::new("blue", 5)]);
        assert_eq!(board.bottle(1).segments(), &[Segment::new("red", 1)]);

        let mut game = Game::new_with_board(original.clone());
        assert!(game.process_move(0, 1));
        assert!(game.undo_last_move());
        assert_eq!(game.board(), &original);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_apply_move_underflow_is_fatal() {
        let mut bottle = Bottle::from_segments(vec![Segment::new("red", 4)]);
        bottle.total_height = 1;
        let other = Bottle::from_segments(vec![Segment::new("red", 2)]);
        let mut board = Board::with_capacity(8, vec![bottle, other]);
        board.apply_move(Move::new(0, 1));
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_apply_move_destination_underflow_is_fatal() {
        let source = Bottle::from_segments(vec![Segment::new("red", 2)]);
        let mut destination = Bottle::from_segments(vec![Segment::new("red", 4)]);
        destination.total_height = 1;
        let mut board = Board::with_capacity(8, vec![source, destination]);
        board.apply_move(Move::new(0, 1));
    }

    #[test]
    fn test_move_check_does_not_overflow_near_u32_max() {
        let board = Board::from_layout(
            u32::MAX,
            &[&[("red", u32::MAX - 1)], &[("blue", 1), ("red", 2)]],
        );
        // both pours would exceed u32::MAX
        assert!(!board.is_valid_move(Move::new(0, 1)));
        assert!(!board.is_valid_move(Move::new(1, 0)));
        assert!(board.moves().is_empty());

        let fits = Board::from_layout(
            u32::MAX,
            &[&[("red", u32::MAX - 2)], &[("blue", 1), ("red", 2)]],
        );
        assert_eq!(fits.moves(), vec![Move::new(1, 0)]);
    }

    #[test]
    fn test_is_win() {
        let won = Board::from_layout(8, &[&[("red", 8)], &[], &[("blue", 8)]]);
        assert!(won.is_win());
        let partial = Board::from_layout(8, &[&[("red", 4)], &[("red", 4)]]);
        assert!(!partial.is_win());
        let split = Board::from_layout(8, &[&[("red", 4), ("red", 4)]]);
        assert!(!split.is_win());
        assert!(Board::with_capacity(8, vec![]).is_win());
    }

    #[test]
    fn test_count_empty() {
        let board = Board::from_layout(8, &[&[], &[("red", 8)], &[]]);
        assert_eq!(board.count_empty(), 2);
    }

    #[test]
    fn test_canonical_key_structural() {
        let a = Board::from_layout(8, &[&[("red", 4), ("blue", 4)], &[]]);
        // built independently, different allocations
        let b = Board::with_capacity(
            8,
            vec![
                Bottle::from_segments(vec![
                    Segment::new(Color::new(&String::from("red")), 4),
                    Segment::new("blue", 4),
                ]),
                Bottle::empty(),
            ],
        );
        assert_eq!(a.canonical_key(), b.canonical_key());

        let swapped = Board::from_layout(8, &[&[], &[("red", 4), ("blue", 4)]]);
        assert_ne!(a.canonical_key(), swapped.canonical_key());
        let different_height = Board::from_layout(8, &[&[("red", 4), ("blue", 3)], &[]]);
        assert_ne!(a.canonical_key(), different_height.canonical_key());
    }

    #[test]
    fn test_new_random_with_seed_determinism() {
        let board1 = Board::new_random_with_seed(5, 2, 5, 123);
        let board2 = Board::new_random_with_seed(5, 2, 5, 123);
        assert_eq!(board1, board2, "Boards with the same seed must be identical.");

        let board3 = Board::new_random_with_seed(5, 2, 5, 124);
        assert_ne!(board1, board3, "Boards with different seeds should differ.");
    }

    #[test]
    fn test_new_random_board_shape() {
        let board = Board::new_random_with_seed(4, 2, 5, 7);
        assert_eq!(board.len(), 6);
        assert_eq!(board.count_empty(), 2);
        for bottle in &board.bottles()[..4] {
            assert_eq!(bottle.total_height(), CAPACITY);
            // adjacent segments never share a color
            for pair in bottle.segments().windows(2) {
                assert_ne!(pair[0].color(), pair[1].color());
            }
        }
        let mut per_color = std::collections::HashMap::new();
        for bottle in board.bottles() {
            for segment in bottle.segments() {
                *per_color.entry(segment.color().clone()).or_insert(0) += segment.height();
            }
        }
        assert_eq!(per_color.len(), 4);
        assert!(per_color.values().all(|&total| total == CAPACITY));
    }

    #[test]
    fn test_display_board_formatting() {
        let board = two_bottle_board();
        let display_str = format!("{}", board);
        assert_eq!(display_str, " 0 [ 8/8] red:4 blue:4\n 1 [ 0/8] -");
    }

    #[test]
    fn test_game_process_and_undo() {
        let mut game = Game::new_with_board(two_bottle_board());
        assert!(!game.process_move(1, 0), "empty source must be rejected");
        assert_eq!(game.steps(), 0);

        assert!(game.process_move(0, 1));
        assert_eq!(game.steps(), 1);
        assert!(game.is_stuck());

        assert!(game.undo_last_move());
        assert_eq!(game.steps(), 0);
        assert_eq!(game.board(), &two_bottle_board());
        assert!(!game.undo_last_move());
    }
}
