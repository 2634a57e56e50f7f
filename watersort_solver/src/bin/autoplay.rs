use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watersort_solver::engine::Board;
use watersort_solver::heuristics::MoveOrdering;
use watersort_solver::player::{
    AutoplayConfig, AutoplayOutcome, Autoplayer, BoardSource, Clock, InstantClock,
    PlaybackTiming, PlayerError, PourActuator, SimulatedPuzzle, SystemClock,
};
use watersort_solver::solver::{SolverConfig, DEFAULT_MAX_DEPTH};
use watersort_solver::utils::parse_board;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board file to load into the simulated puzzle; a seeded random board
    /// is used when omitted
    board_file: Option<PathBuf>,

    /// Seed of the random board and of the solver shuffle
    #[clap(short, long)]
    seed: Option<u64>,

    /// Depth limit for each search
    #[clap(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u32,

    #[clap(short, long, value_enum, default_value_t = MoveOrdering::default())]
    ordering: MoveOrdering,

    /// Milliseconds between two consecutive moves
    #[clap(long, default_value_t = 50)]
    move_interval_ms: u64,

    /// Milliseconds to wait after a replay before reading the board again
    #[clap(long, default_value_t = 75)]
    cycle_delay_ms: u64,

    /// Search again from a fresh read when a search fails
    #[clap(long)]
    retry: bool,

    /// Stop after this many cycles
    #[clap(long)]
    max_cycles: Option<usize>,

    /// Do not wait between actions
    #[clap(long)]
    instant: bool,

    /// Print every action sent to the puzzle
    #[clap(short, long)]
    verbose: bool,
}

/// Echoes each action on its way to the wrapped puzzle.
struct EchoingPuzzle<W: Write> {
    inner: SimulatedPuzzle,
    out: W,
    echo: bool,
}

impl<W: Write> BoardSource for EchoingPuzzle<W> {
    fn extract(&mut self) -> Result<Board, PlayerError> {
        self.inner.extract()
    }
}

impl<W: Write> PourActuator for EchoingPuzzle<W> {
    fn perform(&mut self, bottle: usize) -> Result<(), PlayerError> {
        if self.echo {
            writeln!(self.out, "  select {}", bottle)
                .map_err(|e| PlayerError::Action(e.to_string()))?;
        }
        self.inner.perform(bottle)
    }
}

fn initial_board(args: &Args) -> Result<Board, String> {
    match &args.board_file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            parse_board(&content).map_err(|e| format!("Invalid board format: {}", e))
        }
        None => Ok(match args.seed {
            Some(seed) => Board::new_random_with_seed(6, 2, 5, seed),
            None => Board::new_random(),
        }),
    }
}

fn run<C: Clock>(
    config: AutoplayConfig,
    clock: C,
    puzzle: &mut EchoingPuzzle<io::Stdout>,
) -> ExitCode {
    let mut player = Autoplayer::new(config, clock);
    match player.run(puzzle) {
        Ok(report) => {
            println!("\nFinal board state:\n{}\n", puzzle.inner.board());
            println!(
                "Outcome: {:?}, cycles: {}, moves played: {}, nodes expanded: {}",
                report.outcome, report.cycles, report.moves_played, report.nodes_expanded
            );
            match report.outcome {
                AutoplayOutcome::Solved => ExitCode::SUCCESS,
                AutoplayOutcome::NoSolution | AutoplayOutcome::CycleLimit => ExitCode::from(2),
            }
        }
        Err(e) => {
            eprintln!("Autoplay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let board = match initial_board(&args) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Initial board state:\n{}\n", board);

    let config = AutoplayConfig {
        solver: SolverConfig {
            max_depth: args.depth,
            seed: args.seed,
            ordering: args.ordering,
        },
        timing: PlaybackTiming {
            move_interval: Duration::from_millis(args.move_interval_ms),
            cycle_delay: Duration::from_millis(args.cycle_delay_ms),
        },
        retry_on_failure: args.retry,
        max_cycles: args.max_cycles,
    };
    let mut puzzle = EchoingPuzzle {
        inner: SimulatedPuzzle::new(board),
        out: io::stdout(),
        echo: args.verbose,
    };

    if args.instant {
        run(config, InstantClock, &mut puzzle)
    } else {
        run(config, SystemClock, &mut puzzle)
    }
}
