//! Synthesis demo: oscillator bank, ADSR envelope, and the default patch.
//!
//! Run with: cargo run -p wavesynth-core --example synthesis_demo

use std::sync::Arc;
use wavesynth_core::{
    AdsrEnvelope, KeyboardLayout, Patch, Synthesis, Voice, VoiceSynth, Waveform, oscillate,
};

fn main() {
    let sample_rate = 44100.0;

    // --- Oscillator waveforms ---
    println!("=== Oscillator Waveforms (440 Hz, first 5 samples) ===\n");

    for waveform in Waveform::ALL {
        let samples: Vec<f64> = (0..5)
            .map(|n| oscillate(440.0, n as f64 / sample_rate, waveform))
            .collect();
        println!(
            "{:<12} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
            waveform.name(),
            samples[0],
            samples[1],
            samples[2],
            samples[3],
            samples[4]
        );
    }

    // --- ADSR envelope ---
    println!("\n=== ADSR Envelope (defaults, note off at 0.5 s) ===\n");

    let mut env = AdsrEnvelope::default();
    env.note_on(0.0);
    for t in [0.0, 0.05, 0.10, 0.105, 0.2] {
        let (stage, _) = env.stage_at(t);
        println!("t={t:<6.3} {stage:<8?} {:.4}", env.amplitude(t));
    }
    env.note_off(0.5);
    for t in [0.5, 0.6, 0.7, 0.8] {
        let (stage, _) = env.stage_at(t);
        println!("t={t:<6.3} {stage:<8?} {:.4}", env.amplitude(t));
    }

    // --- Keyboard + default patch ---
    println!("\n=== Keyboard Layout ===\n");

    let layout = KeyboardLayout::default();
    for key in "zxcvbnm,".chars() {
        if let Some(hz) = layout.key_frequency(key) {
            println!("{key} -> {hz:.2} Hz");
        }
    }

    println!("\n=== Default Patch on 'v' ===\n");

    let voice = Arc::new(Voice::default());
    let mut synth = VoiceSynth::new(Arc::clone(&voice), Patch::default());
    voice.note_on(0.0, layout.key_frequency('v').unwrap_or(110.0));

    let block: Vec<f64> = (0..4410).map(|n| synth.sample(n as f64 / sample_rate)).collect();
    let peak = block.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    println!("100 ms rendered, peak |x| = {peak:.4}");
}
