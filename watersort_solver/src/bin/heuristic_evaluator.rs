use clap::Parser;
use std::time::Instant;
use watersort_solver::engine::Board;
use watersort_solver::heuristics::{count_distinct_colors, count_sorted_bottles, MoveOrdering};
use watersort_solver::solver::{replay, Solver, SolverConfig, DEFAULT_MAX_DEPTH};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of random boards to evaluate
    #[clap(short, long, default_value_t = 20)]
    boards: usize,

    /// Seed of the first board; board `i` uses `start_seed + i`
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Colors per board
    #[clap(long, default_value_t = 6)]
    colors: usize,

    /// Empty bottles per board
    #[clap(long, default_value_t = 2)]
    empty: usize,

    /// Height of one scrambled unit; must divide the capacity
    #[clap(long, default_value_t = 5)]
    unit: u32,

    /// Depth limit for each search
    #[clap(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u32,
}

#[derive(Default)]
struct Tally {
    solved: usize,
    total_moves: usize,
    total_nodes: u64,
}

const ORDERINGS: [(&str, MoveOrdering); 3] = [
    ("most-empty", MoveOrdering::MostEmptyFirst),
    ("fewest-empty", MoveOrdering::FewestEmptyFirst),
    ("shuffle", MoveOrdering::ShuffleOnly),
];

fn main() {
    let args = Args::parse();
    if args.unit == 0 || watersort_solver::engine::CAPACITY % args.unit != 0 {
        eprintln!(
            "unit {} must divide the capacity {}",
            args.unit,
            watersort_solver::engine::CAPACITY
        );
        std::process::exit(1);
    }

    let mut tallies: Vec<Tally> = ORDERINGS.iter().map(|_| Tally::default()).collect();

    println!("Starting heuristic evaluation for {} boards...", args.boards);

    for board_idx in 0..args.boards {
        let seed = args.start_seed.wrapping_add(board_idx as u64);
        let board = Board::new_random_with_seed(args.colors, args.empty, args.unit, seed);

        println!(
            "\nEvaluating Board {} (Seed: {}, colors: {}, sorted bottles: {})",
            board_idx,
            seed,
            count_distinct_colors(&board),
            count_sorted_bottles(&board)
        );

        for ((name, ordering), tally) in ORDERINGS.iter().zip(tallies.iter_mut()) {
            let mut solver = Solver::new(SolverConfig {
                max_depth: args.depth,
                seed: Some(seed),
                ordering: *ordering,
            });
            let started = Instant::now();
            let result = solver.solve_from_root(&board);
            let elapsed = started.elapsed();
            let stats = solver.stats();
            tally.total_nodes += stats.nodes_expanded;

            match result {
                Some(moves) => {
                    let verified = replay(&board, &moves).is_some_and(|b| b.is_win());
                    if !verified {
                        eprintln!(
                            "Error: ordering {} left board {} (Seed: {}) unsorted",
                            name, board_idx, seed
                        );
                        continue;
                    }
                    tally.solved += 1;
                    tally.total_moves += moves.len();
                    println!(
                        "  Ordering: {:<12}, Moves: {:<5}, Nodes: {:<8}, Time: {:?}",
                        name,
                        moves.len(),
                        stats.nodes_expanded,
                        elapsed
                    );
                }
                None => println!(
                    "  Ordering: {:<12}, no solution, Nodes: {:<8}, Time: {:?}",
                    name, stats.nodes_expanded, elapsed
                ),
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of boards evaluated: {}", args.boards);
    println!("\n--- Results ---");

    for ((name, _), tally) in ORDERINGS.iter().zip(&tallies) {
        let avg_moves = if tally.solved == 0 {
            0.0
        } else {
            tally.total_moves as f64 / tally.solved as f64
        };
        let avg_nodes = if args.boards == 0 {
            0.0
        } else {
            tally.total_nodes as f64 / args.boards as f64
        };
        println!(
            "Ordering {:<12}: solved {}/{}, average moves = {:.2}, average nodes = {:.1}",
            name, tally.solved, args.boards, avg_moves, avg_nodes
        );
    }
}
