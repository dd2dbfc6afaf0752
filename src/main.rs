//! popdyn CLI - Run cell space simulations from JSON configuration.

use std::path::PathBuf;
use std::time::Instant;

use popdyn::{SimulationConfig, SpaceStats};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [steps]", args[0]);
        eprintln!();
        eprintln!("Run a cell space simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  steps        Override the configured step count");
        eprintln!();
        eprintln!("An example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let mut config = SimulationConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });
    if let Some(steps) = args.get(2).and_then(|s| s.parse().ok()) {
        config.steps = steps;
    }

    let mut space = config.build_space().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("popdyn Simulation");
    println!("=================");
    println!("Grid: {}x{}", config.height, config.width);
    println!(
        "Layers: {}",
        space.layers().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Rules: {}",
        space
            .rules()
            .iter()
            .map(|r| r.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Steps: {} (snapshot every {})", config.steps, config.savestep);
    println!();

    let initial = SpaceStats::from_space(&space);
    print_stats("Initial state", &initial);

    let start = Instant::now();
    if let Err(e) = space.flow(config.steps, config.savestep) {
        eprintln!("Simulation failed: {}", e);
        std::process::exit(1);
    }
    let elapsed = start.elapsed();

    let final_stats = SpaceStats::from_space(&space);
    print_stats("Final state", &final_stats);

    for (name, stats) in &final_stats.layers {
        let before = initial.layers[name].total;
        println!("  {} change: {:+.6}", name, stats.total - before);
    }
    println!("Snapshots: {}", space.history().len());
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        config.steps as f32 / elapsed.as_secs_f32()
    );
}

fn print_stats(title: &str, stats: &SpaceStats) {
    println!("{} (step {}):", title, stats.step);
    for (name, layer) in &stats.layers {
        println!(
            "  {}: total={:.6}, range=[{:.6}, {:.6}], mean={:.6}",
            name, layer.total, layer.min, layer.max, layer.mean
        );
    }
    println!();
}

fn print_example_config() {
    let config = SimulationConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
