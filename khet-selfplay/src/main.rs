//! Khet self-play
//!
//! Plays the search agent against itself from the starting position,
//! deepening each move until the depth limit, the per-move time budget or
//! Ctrl-C.

mod deepening;
mod stats;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use khet_core::game::start_game;
use khet_core::{EvalWeights, HeuristicEvaluator, Player, Pos, TieBreak};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::deepening::{deepen, Budget};
use crate::stats::{GameEnd, SelfPlayStats};

#[derive(Debug, PartialEq)]
struct Options {
    depth: u32,
    time_ms: Option<u64>,
    max_plies: u32,
    seed: Option<u64>,
    weights: Option<PathBuf>,
    quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            depth: 3,
            time_ms: None,
            max_plies: 200,
            seed: None,
            weights: None,
            quiet: false,
        }
    }
}

impl Options {
    fn parse(args: &[String]) -> anyhow::Result<Options> {
        let mut options = Options::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .with_context(|| format!("{} expects a value", arg))
            };
            match arg.as_str() {
                "--depth" => options.depth = parse_number(arg, value()?)?,
                "--time-ms" => options.time_ms = Some(parse_number(arg, value()?)?),
                "--max-plies" => options.max_plies = parse_number(arg, value()?)?,
                "--seed" => options.seed = Some(parse_number(arg, value()?)?),
                "--weights" => options.weights = Some(PathBuf::from(value()?)),
                "--quiet" => options.quiet = true,
                other => bail!("unknown argument {:?}", other),
            }
        }
        if options.depth == 0 {
            bail!("--depth must be at least 1");
        }
        Ok(options)
    }

    fn tie_break(&self, ply: u32) -> TieBreak {
        match self.seed {
            Some(seed) => TieBreak::Random {
                seed: seed.wrapping_add(ply as u64),
            },
            None => TieBreak::FirstFound,
        }
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> anyhow::Result<T> {
    value
        .parse::<T>()
        .ok()
        .with_context(|| format!("invalid value {:?} for {}", value, flag))
}

fn load_weights(path: &Path) -> anyhow::Result<EvalWeights> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read weights from {:?}", path))?;
    let weights: EvalWeights = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse weights in {:?}", path))?;
    weights
        .validate()
        .with_context(|| format!("invalid weights in {:?}", path))?;
    Ok(weights)
}

fn format_path(path: &[Pos]) -> String {
    path.iter()
        .map(|pos| pos.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = Options::parse(&args)?;
    let weights = match &options.weights {
        Some(path) => load_weights(path)?,
        None => EvalWeights::default(),
    };
    let evaluator = HeuristicEvaluator::new(weights);

    println!("Khet Self-Play");
    println!("==============");
    println!(
        "Depth: {}  Time/move: {}  Max plies: {}  Tie-break: {}",
        options.depth,
        options
            .time_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "unlimited".to_string()),
        options.max_plies,
        match options.seed {
            Some(seed) => format!("random (seed {})", seed),
            None => "first found".to_string(),
        }
    );
    println!();

    // Set up SIGINT handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\n\nInterrupt received, stopping after the current search...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut board = start_game();
    let mut player = Player::One;
    let mut stats = SelfPlayStats::new();
    if !options.quiet {
        println!("{}", board);
    }

    let end = loop {
        if stats.plies >= options.max_plies {
            break GameEnd::PlyLimit;
        }
        if !running.load(Ordering::SeqCst) {
            break GameEnd::Interrupted;
        }

        let budget = Budget {
            max_depth: options.depth,
            time: options.time_ms.map(Duration::from_millis),
            tie_break: options.tie_break(stats.plies),
        };
        let deepened = deepen(&board, player, &evaluator, budget, &running);
        let Some(result) = deepened.best else {
            break GameEnd::Interrupted;
        };
        let Some(mov) = result.best_move else {
            break if running.load(Ordering::SeqCst) {
                GameEnd::NoLegalMoves(player)
            } else {
                GameEnd::Interrupted
            };
        };

        let (_, outcome) = board.apply_and_resolve(player, mov);
        stats.record_ply(
            deepened.stats,
            deepened.depth_completed,
            deepened.stopped_early,
            outcome.destroyed.is_some(),
        );
        info!(
            ply = stats.plies,
            %player,
            %mov,
            score = result.score,
            depth = deepened.depth_completed,
            nodes = deepened.stats.nodes_visited,
            "ply played"
        );

        if !options.quiet {
            println!(
                "Ply {}: {} plays {}  (depth {}, score {}, nodes {})",
                stats.plies,
                player,
                mov,
                deepened.depth_completed,
                result.score,
                deepened.stats.nodes_visited
            );
            println!("Laser: {}", format_path(&outcome.path));
            if let Some(destroyed) = outcome.destroyed {
                println!(
                    "Destroyed: {:?} of {} at {}",
                    destroyed.piece.kind, destroyed.piece.owner, destroyed.pos
                );
            }
            println!("{}", board);
        }

        if let Some(winner) = outcome.winner {
            break GameEnd::KingDestroyed(winner);
        }
        player = player.opponent();
    };

    println!("==============");
    stats.print_summary(end);
    if !options.quiet {
        println!("\nFinal position:\n{}", board);
    }
    Ok(())
}
