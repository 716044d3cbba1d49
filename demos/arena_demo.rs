// Demonstration: run an arena with a baseline policy and print evaluation
// metrics plus the scoreboard.
//
// Build/run from this repo root:
//   RUST_LOG=tag_arena=info cargo run --example arena_demo -- --variant tag --policy heuristic --episodes 50

use std::env;
use std::process;

use tag_arena::{
    ArenaConfig, EvaluationMetrics, GoalArena, HeuristicPolicy, ManualPolicy, Policy,
    RandomPolicy, Scoreboard, TagArena,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let variant = arg_value(&args, "--variant").unwrap_or("tag");
    let policy_name = arg_value(&args, "--policy").unwrap_or("heuristic");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let config = match variant {
        "tag" => ArenaConfig::tag(),
        "goal" => ArenaConfig {
            max_steps: 1000,
            ..ArenaConfig::goal()
        },
        other => {
            eprintln!("Unknown --variant '{}'; expected 'tag' or 'goal'.", other);
            process::exit(2);
        }
    };

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(seed)),
        "heuristic" => Box::new(HeuristicPolicy::new(&config)),
        "idle" => Box::new(ManualPolicy::new(config.motion.scheme)),
        other => {
            eprintln!(
                "Unknown --policy '{}'; expected 'heuristic', 'random' or 'idle'.",
                other
            );
            process::exit(2);
        }
    };

    let scoreboard = Scoreboard::new();
    let metrics = match variant {
        "goal" => GoalArena::new(config, seed, scoreboard.clone()).and_then(|mut arena| {
            EvaluationMetrics::evaluate_goal(&mut arena, policy.as_mut(), episodes)
        }),
        _ => TagArena::new(config, seed, scoreboard.clone()).and_then(|mut arena| {
            EvaluationMetrics::evaluate_tag(&mut arena, policy.as_mut(), episodes)
        }),
    };

    match metrics {
        Ok(metrics) => {
            println!("Policy: {}", policy.name());
            println!("{}", metrics);
            println!();
            println!("{}", scoreboard.snapshot());
        }
        Err(err) => {
            eprintln!("evaluation failed: {}", err);
            process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
