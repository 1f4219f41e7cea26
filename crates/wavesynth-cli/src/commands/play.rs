//! Keyboard sequence playback command.

use super::common::{
    Performance, engine_config, install_ctrlc, load_config, play_at_bit_depth, resolve_device,
    wait,
};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use wavesynth_core::{KeyboardLayout, Voice, VoiceSynth};
use wavesynth_io::{Engine, PcmSample};

#[derive(Args)]
pub struct PlayArgs {
    /// Keys to play in order; a space is a rest
    #[arg(short, long, default_value = "zxcvbnm,")]
    keys: String,

    /// How long each key is held, in milliseconds
    #[arg(long, default_value = "300")]
    note_ms: u64,

    /// Silence between keys, in milliseconds
    #[arg(long, default_value = "100")]
    gap_ms: u64,

    /// Output device (index or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Override the configured bit depth (8, 16 or 32)
    #[arg(long)]
    bit_depth: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Step {
    Note { key: char, hz: f64 },
    Rest,
}

fn parse_sequence(keys: &str, layout: &KeyboardLayout) -> Vec<Step> {
    keys.chars()
        .filter_map(|key| {
            if key == ' ' {
                return Some(Step::Rest);
            }
            match layout.key_frequency(key) {
                Some(hz) => Some(Step::Note { key, hz }),
                None => {
                    tracing::warn!(%key, "key is not on the keyboard layout, skipping");
                    None
                }
            }
        })
        .collect()
}

struct Sequence {
    steps: Vec<Step>,
    note: Duration,
    gap: Duration,
}

impl Performance for Sequence {
    fn perform<S: PcmSample>(&self, engine: &Engine<S>, voice: &Voice, running: &AtomicBool) {
        for step in &self.steps {
            if !engine.is_running() {
                break;
            }
            match *step {
                Step::Note { key, hz } => {
                    let t = engine.time();
                    voice.note_on(t, hz);
                    println!("Note On : {:.3}s {:.2}Hz ({})", t, hz, key);
                    let held = wait(running, self.note);

                    let t = engine.time();
                    voice.note_off(t);
                    println!("Note Off: {:.3}s", t);
                    if !held {
                        break;
                    }
                }
                Step::Rest => {
                    if !wait(running, self.note) {
                        break;
                    }
                }
            }
            if !wait(running, self.gap) {
                break;
            }
        }
    }
}

pub fn run(args: PlayArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let layout = config.keyboard.to_layout();

    let steps = parse_sequence(&args.keys, &layout);
    if steps.is_empty() {
        anyhow::bail!("nothing to play in '{}'", args.keys);
    }

    let device = resolve_device(args.output.as_deref(), config.engine.device.as_deref())?;
    let voice = Arc::new(Voice::new(config.envelope.to_shape()));
    let synth = VoiceSynth::new(Arc::clone(&voice), config.patch.to_patch()?);
    let running = install_ctrlc()?;

    println!("Playing {} step(s). Press Ctrl+C to stop.", steps.len());

    let sequence = Sequence {
        steps,
        note: Duration::from_millis(args.note_ms),
        gap: Duration::from_millis(args.gap_ms),
    };
    play_at_bit_depth(
        args.bit_depth.unwrap_or(config.engine.bit_depth),
        &device,
        engine_config(&config.engine),
        voice,
        synth,
        &sequence,
        &running,
    )
}
