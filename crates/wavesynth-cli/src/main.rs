//! wavesynth CLI - play the real-time synthesizer from the command line.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wavesynth")]
#[command(author, version, about = "Real-time software synthesizer", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List output devices
    Devices(commands::devices::DevicesArgs),

    /// Play a sequence of keys from the computer-keyboard layout
    Play(commands::play::PlayArgs),

    /// Hold a single tone
    Tone(commands::tone::ToneArgs),

    /// Create, inspect and check the configuration file
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Play(args) => commands::play::run(args, config),
        Commands::Tone(args) => commands::tone::run(args, config),
        Commands::Config(args) => commands::config::run(args, config),
    }
}
