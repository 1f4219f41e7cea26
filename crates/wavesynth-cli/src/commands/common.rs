//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use wavesynth_config::{EngineSettings, SynthConfig, default_config_path, validate_config};
use wavesynth_core::{Voice, VoiceSynth};
use wavesynth_io::{CpalBackend, Engine, EngineConfig, PcmSample};

/// The explicit `--config` path, or the user default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_config_path, Path::to_path_buf)
}

/// Load and validate the configuration.
///
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<SynthConfig> {
    let config = match explicit {
        Some(path) => SynthConfig::load(path)?,
        None => SynthConfig::load_or_default(default_config_path())?,
    };
    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

/// Engine geometry from the `[engine]` section.
pub fn engine_config(settings: &EngineSettings) -> EngineConfig {
    EngineConfig {
        sample_rate: settings.sample_rate,
        channels: settings.channels,
        block_count: settings.block_count,
        block_samples: settings.block_samples,
    }
}

/// Choose an output device from `devices`.
///
/// `selector` may be an index into the list, an exact name, or a
/// case-insensitive partial name. Without a selector the first device is used.
pub fn pick_device(devices: &[String], selector: Option<&str>) -> anyhow::Result<String> {
    if devices.is_empty() {
        return Err(wavesynth_io::Error::NoDevice.into());
    }

    let Some(selector) = selector else {
        return Ok(devices[0].clone());
    };

    if let Ok(index) = selector.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "output device index {} (only {} devices available)",
                index,
                devices.len()
            )
        });
    }

    if let Some(exact) = devices.iter().find(|d| d.as_str() == selector) {
        return Ok(exact.clone());
    }

    let needle = selector.to_lowercase();
    devices
        .iter()
        .find(|d| d.to_lowercase().contains(&needle))
        .cloned()
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no output device matching '{}'. Use 'wavesynth devices' to list them.",
                selector
            )
        })
}

/// Resolve the device from the command line, then the config, then the
/// first enumerated device.
pub fn resolve_device(cli: Option<&str>, configured: Option<&str>) -> anyhow::Result<String> {
    let devices = wavesynth_io::enumerate()?;
    pick_device(&devices, cli.or(configured))
}

/// Install a Ctrl+C handler that clears the returned flag.
pub fn install_ctrlc() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}

/// Sleep for `duration`, returning early (with `false`) once `running` clears.
pub fn wait(running: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(10)));
    }
}

/// A voice driven from the command line while an engine plays it.
pub trait Performance {
    /// Drive note events against the running engine's clock.
    fn perform<S: PcmSample>(&self, engine: &Engine<S>, voice: &Voice, running: &AtomicBool);
}

/// Open the engine at the configured bit depth, run `performance`, and stop.
pub fn play_at_bit_depth<P: Performance>(
    bit_depth: u16,
    device: &str,
    config: EngineConfig,
    voice: Arc<Voice>,
    synth: VoiceSynth,
    performance: &P,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    match bit_depth {
        8 => play_session::<i8, P>(device, config, voice, synth, performance, running),
        16 => play_session::<i16, P>(device, config, voice, synth, performance, running),
        32 => play_session::<i32, P>(device, config, voice, synth, performance, running),
        other => anyhow::bail!("unsupported bit depth {} (expected 8, 16 or 32)", other),
    }
}

fn play_session<S: PcmSample, P: Performance>(
    device: &str,
    config: EngineConfig,
    voice: Arc<Voice>,
    synth: VoiceSynth,
    performance: &P,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let mut engine: Engine<S> = Engine::with_synthesis(&CpalBackend::new(), device, config, synth)
        .with_context(|| format!("failed to open output device '{}'", device))?;

    println!(
        "Output: {} ({} Hz, {}-bit, {} x {} samples, {:.1} ms buffered)",
        engine.device_name(),
        config.sample_rate,
        S::BITS,
        config.block_count,
        config.block_samples,
        config.latency() * 1000.0
    );

    performance.perform(&engine, &voice, running);

    // Let the release tail play out.
    wait(running, Duration::from_secs_f64(voice.shape().release_time));

    engine.stop().context("audio device failed during playback")?;
    let stats = engine.stats();
    if stats.underruns > 0 {
        println!("Warning: {} underrun(s) during playback", stats.underruns);
    }
    Ok(())
}
