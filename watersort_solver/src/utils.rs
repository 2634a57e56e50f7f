use crate::engine::{Board, Bottle, Segment, CAPACITY};
use std::fmt::Write as _;
use thiserror::Error;

/// Errors produced while reading a board from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("the board has no bottles")]
    NoBottles,
    #[error("line {line}: invalid capacity directive '{directive}'")]
    InvalidCapacity { line: usize, directive: String },
    #[error("line {line}: expected 'color:height', found '{token}'")]
    MalformedSegment { line: usize, token: String },
    #[error("line {line}: invalid color name '{name}'")]
    InvalidColor { line: usize, name: String },
    #[error("line {line}: height must be a positive integer, found '{height}'")]
    InvalidHeight { line: usize, height: String },
    #[error("line {line}: bottle holds {total}, more than the capacity {capacity}")]
    OverCapacity { line: usize, total: u64, capacity: u32 },
}

fn is_color_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Parses a board from its text representation.
///
/// The format is one bottle per line, bottom segment first:
/// - Segments are `color:height` tokens separated by whitespace or commas.
/// - A line holding only `-` or `empty` is an empty bottle.
/// - Blank lines and lines starting with `#` are ignored.
/// - An optional `capacity N` line, before the first bottle, overrides
///   `CAPACITY`.
///
/// Color names may use ASCII letters, digits, `_` and `-`.
///
/// # Returns
/// * `Ok(Board)` if every line parses and no bottle exceeds the capacity.
/// * `Err(ParseError)` naming the first offending line (1-based).
///
/// # Examples
/// ```
/// use watersort_solver::utils::parse_board;
///
/// let board = parse_board("capacity 8\nred:4 blue:4\n-\n").unwrap();
/// assert_eq!(board.capacity(), 8);
/// assert_eq!(board.len(), 2);
/// assert!(board.bottle(1).is_empty());
///
/// assert!(parse_board("red:0").is_err());
/// ```
pub fn parse_board(text: &str) -> Result<Board, ParseError> {
    let mut capacity = CAPACITY;
    let mut bottles = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut words = line.split_whitespace();
        if words.next() == Some("capacity") {
            // the directive only makes sense before any bottle
            let value = match (words.next(), words.next()) {
                (Some(word), None) => word.parse::<u32>().ok().filter(|&c| c > 0),
                _ => None,
            };
            match value {
                Some(c) if bottles.is_empty() => capacity = c,
                _ => {
                    return Err(ParseError::InvalidCapacity {
                        line: line_no,
                        directive: line.to_string(),
                    })
                }
            }
            continue;
        }

        if line == "-" || line.eq_ignore_ascii_case("empty") {
            bottles.push(Bottle::empty());
            continue;
        }

        let mut segments = Vec::new();
        for token in line
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            segments.push(parse_segment(token, line_no)?);
        }
        // summed wide so that heights near u32::MAX are reported, not wrapped
        let total: u64 = segments.iter().map(|s| u64::from(s.height())).sum();
        if total > u64::from(capacity) {
            return Err(ParseError::OverCapacity {
                line: line_no,
                total,
                capacity,
            });
        }
        bottles.push(Bottle::from_segments(segments));
    }

    if bottles.is_empty() {
        return Err(ParseError::NoBottles);
    }

    Ok(Board::with_capacity(capacity, bottles))
}

fn parse_segment(token: &str, line: usize) -> Result<Segment, ParseError> {
    let Some((name, height)) = token.split_once(':') else {
        return Err(ParseError::MalformedSegment {
            line,
            token: token.to_string(),
        });
    };
    if !is_color_name(name) {
        return Err(ParseError::InvalidColor {
            line,
            name: name.to_string(),
        });
    }
    match height.parse::<u32>() {
        Ok(h) if h > 0 => Ok(Segment::new(name, h)),
        _ => Err(ParseError::InvalidHeight {
            line,
            height: height.to_string(),
        }),
    }
}

/// Writes a board in the format read by `parse_board`.
///
/// The capacity line is omitted when it equals `CAPACITY`.
pub fn format_board(board: &Board) -> String {
    let mut output = String::new();
    if board.capacity() != CAPACITY {
        let _ = writeln!(output, "capacity {}", board.capacity());
    }
    for bottle in board.bottles() {
        if bottle.is_empty() {
            output.push('-');
        } else {
            let tokens: Vec<String> = bottle
                .segments()
                .iter()
                .map(|s| format!("{}:{}", s.color(), s.height()))
                .collect();
            output.push_str(&tokens.join(" "));
        }
        output.push('\n');
    }
    output
}
