use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use watersort_solver::engine::Board;
use watersort_solver::heuristics::MoveOrdering;
use watersort_solver::solver::{replay, Solver, SolverConfig, DEFAULT_MAX_DEPTH};
use watersort_solver::utils::parse_board;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Depth limit for the DFS solver
    #[clap(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u32,

    /// Seed for the move shuffle; omit for a random one
    #[clap(short, long)]
    seed: Option<u64>,

    /// How sibling moves are ordered before they are tried
    #[clap(short, long, value_enum, default_value_t = MoveOrdering::default())]
    ordering: MoveOrdering,

    /// Path to the board file (one bottle per line, `color:height` segments)
    board_file: PathBuf,
}

fn read_board_file(path: &Path) -> Result<Board, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    parse_board(&content).map_err(|e| format!("Invalid board format: {}", e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let board = match read_board_file(&args.board_file) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{}: {}", args.board_file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    println!("Loaded board from {}\n", args.board_file.display());
    println!("Initial board state:\n{}\n", board);
    println!("Searching for solution with depth limit {}...\n", args.depth);

    let mut solver = Solver::new(SolverConfig {
        max_depth: args.depth,
        seed: args.seed,
        ordering: args.ordering,
    });
    let result = solver.solve_from_root(&board);
    let stats = solver.stats();

    match result {
        Some(moves) => {
            println!("Solution found:\n");
            println!("Moves ({}):", moves.len());
            if moves.is_empty() {
                println!("  No moves needed.");
            }
            for (i, mv) in moves.iter().enumerate() {
                println!("  Move {}: {}", i + 1, mv);
            }
            println!(
                "\nNodes expanded: {}, dead ends recorded: {}\n",
                stats.nodes_expanded, stats.dead_ends
            );
            match replay(&board, &moves) {
                Some(final_board) => println!("Final board state:\n{}\n", final_board),
                None => {
                    eprintln!("The solver returned an illegal move sequence.");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        None => {
            println!("No solution found.\n");
            println!(
                "Nodes expanded: {}, dead ends recorded: {}",
                stats.nodes_expanded, stats.dead_ends
            );
            ExitCode::from(2)
        }
    }
}
