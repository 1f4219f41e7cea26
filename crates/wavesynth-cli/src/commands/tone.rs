//! Single held tone command.

use super::common::{
    Performance, engine_config, install_ctrlc, load_config, play_at_bit_depth, resolve_device,
    wait,
};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use wavesynth_core::{Patch, Voice, VoiceSynth, Waveform};
use wavesynth_io::{Engine, PcmSample};

#[derive(Args)]
pub struct ToneArgs {
    /// Frequency in Hz
    #[arg(short, long, default_value = "440")]
    frequency: f64,

    /// Waveform: sine, square, triangle, analog-saw, digital-saw, noise
    #[arg(short, long, default_value = "sine")]
    waveform: Waveform,

    /// How long the note is held, in milliseconds
    #[arg(short, long, default_value = "1000")]
    duration_ms: u64,

    /// Output device (index or partial name)
    #[arg(short, long)]
    output: Option<String>,
}

struct Hold {
    hz: f64,
    duration: Duration,
}

impl Performance for Hold {
    fn perform<S: PcmSample>(&self, engine: &Engine<S>, voice: &Voice, running: &AtomicBool) {
        voice.note_on(engine.time(), self.hz);
        wait(running, self.duration);
        voice.note_off(engine.time());
    }
}

pub fn run(args: ToneArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    if !(args.frequency.is_finite() && args.frequency > 0.0) {
        anyhow::bail!("frequency must be a positive number of Hz");
    }

    let config = load_config(config_path)?;
    let device = resolve_device(args.output.as_deref(), config.engine.device.as_deref())?;
    let voice = Arc::new(Voice::new(config.envelope.to_shape()));
    let synth = VoiceSynth::new(Arc::clone(&voice), Patch::single(args.waveform));
    let running = install_ctrlc()?;

    println!(
        "Tone: {} at {:.2} Hz for {} ms",
        args.waveform, args.frequency, args.duration_ms
    );

    let hold = Hold {
        hz: args.frequency,
        duration: Duration::from_millis(args.duration_ms),
    };
    play_at_bit_depth(
        config.engine.bit_depth,
        &device,
        engine_config(&config.engine),
        voice,
        synth,
        &hold,
        &running,
    )
}
