use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use watersort_solver::engine::{Board, Game};
use watersort_solver::solver::{solve_dfs, SolverConfig};
use watersort_solver::utils::parse_board;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board file to play; a seeded random board is used when omitted
    board_file: Option<PathBuf>,

    /// Seed of the random board
    #[clap(short, long)]
    seed: Option<u64>,
}

fn initial_board(args: &Args) -> Result<Board, String> {
    match (&args.board_file, args.seed) {
        (Some(path), _) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            parse_board(&content).map_err(|e| format!("Invalid board format: {}", e))
        }
        (None, Some(seed)) => Ok(Board::new_random_with_seed(6, 2, 5, seed)),
        (None, None) => Ok(Board::new_random()),
    }
}

fn main() {
    let args = Args::parse();
    let board = match initial_board(&args) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let mut game = Game::new_with_board(board);
    println!("Welcome to Water Sort!");

    loop {
        println!("---------------------");
        println!("Steps: {}", game.steps());
        println!("{}", game.board());

        if game.is_won() {
            println!();
            println!("---------------------");
            println!("🎉 SORTED! 🎉");
            println!("Total Steps: {}", game.steps());
            println!("---------------------");
            break;
        }
        if game.is_stuck() {
            println!("No legal pour left. Undo with 'u' or quit with 'q'.");
        }

        print!("Enter your move (from to), 'h' for a hint, 'u' to undo, 'q' to quit: ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if game.undo_last_move() {
                    println!("Move undone.");
                } else {
                    println!("Cannot undo further (no moves made).");
                }
            }
            "h" => match solve_dfs(game.board(), SolverConfig::default()) {
                Some(moves) => match moves.first() {
                    Some(mv) => println!("Hint: pour {} ({} moves to go).", mv, moves.len()),
                    None => println!("Already sorted."),
                },
                None => println!("No solution from here. Try undoing."),
            },
            other => {
                let parts: Vec<&str> = other.split_whitespace().collect();
                let parsed = match parts.as_slice() {
                    [from, to] => from.parse::<usize>().ok().zip(to.parse::<usize>().ok()),
                    _ => None,
                };
                match parsed {
                    Some((from, to)) if from < game.board().len() && to < game.board().len() => {
                        if game.process_move(from, to) {
                            println!("Poured {} -> {}.", from, to);
                        } else {
                            println!(
                                "Invalid move: cannot pour bottle {} into bottle {}.",
                                from, to
                            );
                        }
                    }
                    Some(_) => println!(
                        "Invalid bottle: indices must be between 0 and {}.",
                        game.board().len().saturating_sub(1)
                    ),
                    None => println!("Invalid input format. Use 'from to', 'h', 'u', or 'q'."),
                }
            }
        }
    }
}
