// CLI entry point for a headless Sandfall run.
//
// Loads a scenario, ticks the simulation for a fixed number of synthetic
// frames and prints the credit tally. Useful for balancing config tables
// and for reproducing a game state from the command line.
//
// Usage:
//   sandfall-headless [OPTIONS]
//     --map <PATH>          Scenario map (default: built-in demo map)
//     --config <PATH>       SimConfig JSON (default: built-in defaults)
//     --frames <N>          Frames to simulate (default: 3600)
//     --frame-ms <MS>       Frame length in ms (default: 16.67)
//     --report-every <N>    Progress log interval in frames, 0 = off (default: 600)
//     --save <PATH>         Write the final state as JSON
//     --log-level <LEVEL>   Log filter when RUST_LOG is unset (default: info)

use std::path::PathBuf;

use sandfall_headless::RunOptions;

fn main() {
    let (options, log_level) = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();

    match sandfall_headless::run(&options) {
        Ok(summary) => {
            println!("game time:       {:.0} ms", summary.game_time_ms);
            println!("player credits:  {}", summary.player_credits);
            println!("ai credits:      {}", summary.ai_credits);
            println!("harvesters:      {}", summary.harvesters);
            println!("pending effects: {}", summary.pending_effects);
        }
        Err(e) => {
            eprintln!("Run failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse command-line arguments into `RunOptions` plus the log filter.
/// Plain `std::env::args()` matching.
fn parse_args() -> (RunOptions, String) {
    let mut options = RunOptions::default();
    let mut log_level = String::from("info");
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--map" => {
                i += 1;
                options.map = Some(path_arg(&args, i, "--map"));
            }
            "--config" => {
                i += 1;
                options.config = Some(path_arg(&args, i, "--config"));
            }
            "--save" => {
                i += 1;
                options.save = Some(path_arg(&args, i, "--save"));
            }
            "--frames" => {
                i += 1;
                options.frames = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--frames requires a valid number");
                    std::process::exit(1);
                });
            }
            "--frame-ms" => {
                i += 1;
                options.frame_ms = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|ms: &f64| *ms > 0.0)
                    .unwrap_or_else(|| {
                        eprintln!("--frame-ms requires a positive number");
                        std::process::exit(1);
                    });
            }
            "--report-every" => {
                i += 1;
                options.report_every =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--report-every requires a valid number");
                        std::process::exit(1);
                    });
            }
            "--log-level" => {
                i += 1;
                log_level = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--log-level requires a value");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    (options, log_level)
}

fn path_arg(args: &[String], i: usize, flag: &str) -> PathBuf {
    args.get(i).map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{flag} requires a path");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: sandfall-headless [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --map <PATH>          Scenario map (default: built-in demo map)");
    println!("  --config <PATH>       SimConfig JSON (default: built-in defaults)");
    println!("  --frames <N>          Frames to simulate (default: 3600)");
    println!("  --frame-ms <MS>       Frame length in ms (default: 16.67)");
    println!("  --report-every <N>    Progress log interval in frames, 0 = off (default: 600)");
    println!("  --save <PATH>         Write the final state as JSON");
    println!("  --log-level <LEVEL>   Log filter when RUST_LOG is unset (default: info)");
    println!("  --help, -h            Show this help");
}
