//! leap_synth: gesture-driven audio-visual synth.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use leap_synth::app::{run, RunOptions};
use leap_synth::config::{describe_params, Settings};

#[derive(Parser, Debug)]
#[command(name = "leap_synth", version, about = "Gesture-driven audio-visual synth")]
struct Cli {
    /// Settings file (TOML). Missing sections keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the session to a standard MIDI file on exit.
    #[arg(short, long, value_name = "FILE.mid")]
    record: Option<PathBuf>,

    /// Print every tunable parameter with its range and current value, then exit.
    #[arg(long)]
    list_params: bool,

    /// Skip MIDI port probing and run silent.
    #[arg(long)]
    quick: bool,

    /// Seed for particle randomness.
    #[arg(long)]
    seed: Option<u64>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut settings = match &cli.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.visual.seed = seed;
    }

    if cli.list_params {
        print!("{}", describe_params(&settings));
        return;
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║     Leap Synth — Gesture-Driven Audio-Visual Synthesizer     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Input: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Input: mouse + keyboard simulation  (use --features leap for hardware)");
    println!("  Hold a pose to switch modes:");
    println!("    right hand  one finger = pads     two = ribbons  open = particles");
    println!("    left hand   one finger = theremin two = orbit    open = nebula");
    println!("  Console: set <param> <value> | tap <alg> | color <mode> | mode <name> | calibrate | clear");
    println!();

    let opts = RunOptions { record: cli.record, quick: cli.quick };
    if let Err(e) = run(settings, opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
