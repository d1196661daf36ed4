mod config;
mod constants;
mod game;
mod tactics;

use clap::Parser;
use game::search::{SearchConfig, Solver};
use game::{GameState, PositionEngine};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Position to solve, as a FEN string
    #[arg(long, conflicts_with_all = ["suite", "cases"])]
    fen: Option<String>,

    /// Search depth in plies (defaults to the profile's depth)
    #[arg(long)]
    depth: Option<u32>,

    /// Run the built-in tactic suite
    #[arg(long)]
    suite: bool,

    /// Run tactic cases from a JSON file
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Seed for shuffling quiet moves
    #[arg(long)]
    seed: Option<u64>,

    /// Load search settings from a named profile
    #[arg(long)]
    profile: Option<String>,

    /// Store the effective search settings under this profile name
    #[arg(long)]
    save_profile: Option<String>,

    /// Directory holding the profiles
    #[arg(long, default_value = config::PROFILES_DIR)]
    profiles_dir: PathBuf,

    /// List the stored profiles and exit
    #[arg(long)]
    list_profiles: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_profiles {
        for name in config::get_profiles(&args.profiles_dir)? {
            println!("{name}");
        }
        return Ok(());
    }

    let mut search_config = match &args.profile {
        Some(name) => config::load_profile(&args.profiles_dir, name)?,
        None => SearchConfig::default(),
    };
    if let Some(depth) = args.depth {
        search_config.search_depth = depth;
    }
    if args.seed.is_some() {
        search_config.shuffle_seed = args.seed;
    }
    if let Some(name) = &args.save_profile {
        config::save_profile(&args.profiles_dir, name, &search_config)?;
        tracing::info!(profile = %name, dir = %args.profiles_dir.display(), "saved profile");
    }

    if args.suite || args.cases.is_some() {
        let cases = match &args.cases {
            Some(path) => tactics::load_cases(path)?,
            None => tactics::builtin_cases(),
        };
        let results = tactics::run_suite(&cases, &search_config)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            for r in &results {
                match (&r.expected, &r.found) {
                    (Some(expected), Some(found)) => println!(
                        "FAIL {:<16} ply {} expected {} found {}",
                        r.name,
                        r.failed_ply.unwrap_or_default(),
                        expected,
                        found
                    ),
                    _ => println!("ok   {:<16} {:>9} nodes {:>6} ms", r.name, r.nodes, r.elapsed_ms),
                }
            }
        }
        let failed = results.iter().filter(|r| !r.passed).count();
        if failed > 0 {
            return Err(format!("{failed} of {} tactics failed", results.len()).into());
        }
        return Ok(());
    }

    let Some(fen) = args.fen else {
        return Err("nothing to do: pass --fen, --suite or --cases".into());
    };
    let mut state = GameState::from_fen(&fen)?;
    let side = state.side_to_move();
    let mut solver = Solver::new(search_config);
    let depth = solver.config().search_depth;
    let (best_move, score) = solver.solve_scored(&mut state, depth, side)?;
    let stats = solver.stats();

    if args.json {
        let report = serde_json::json!({
            "fen": fen,
            "depth": depth,
            "best_move": state.san(best_move),
            "score": score,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("bestmove {}", state.san(best_move));
        println!(
            "score {} depth {} nodes {} ({} quiescence, {} cutoffs)",
            score,
            depth,
            stats.total_nodes(),
            stats.quiescence_nodes,
            stats.cutoffs
        );
    }

    Ok(())
}
