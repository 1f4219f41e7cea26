//! Integration tests for the wavesynth-io streaming engine.
//!
//! Everything runs against the in-memory capture backend, so block contents,
//! device call order and shutdown are fully deterministic.

use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use wavesynth_core::{Patch, Voice, VoiceSynth};
use wavesynth_io::{
    CaptureBackend, CompletionMode, DeviceEvent, Engine, EngineConfig, Error, quantize,
};

const DEVICE: &str = CaptureBackend::<i16>::DEVICE_NAME;
const TIMEOUT: Duration = Duration::from_secs(10);

fn config(block_count: usize, block_samples: usize) -> EngineConfig {
    EngineConfig {
        sample_rate: 44100,
        channels: 1,
        block_count,
        block_samples,
    }
}

/// Poll until the producer has exited on its own.
fn wait_until_stopped<S: wavesynth_io::PcmSample>(engine: &Engine<S>) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while engine.is_running() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn unknown_device_is_rejected() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();

    let result = Engine::with_backend(&backend, "No Such Device", EngineConfig::default());
    assert!(matches!(result, Err(Error::DeviceNotFound(name)) if name == "No Such Device"));
    assert!(tap.events().is_empty());
}

#[test]
fn single_block_ring_is_rejected() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();

    let result = Engine::with_backend(&backend, DEVICE, config(1, 512));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert_eq!(tap.submitted(), 0);
}

#[test]
fn opens_named_device_among_several() {
    let backend =
        CaptureBackend::<i16>::new(CompletionMode::Manual).with_devices(["Speakers", "Headphones"]);
    let tap = backend.tap();

    let mut engine = Engine::with_backend(&backend, "Headphones", config(2, 16)).unwrap();
    assert_eq!(engine.device_name(), "Headphones");
    assert!(engine.is_running());
    assert!(tap.wait_for_blocks(2, TIMEOUT));
    engine.stop().unwrap();
}

#[test]
fn empty_device_list_is_no_device() {
    let backend =
        CaptureBackend::<i16>::new(CompletionMode::Manual).with_devices(Vec::<String>::new());

    let result = Engine::with_backend(&backend, DEVICE, EngineConfig::default());
    assert!(matches!(result, Err(Error::NoDevice)));
}

#[test]
fn oversized_geometry_is_an_error() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();

    let result = Engine::with_backend(&backend, DEVICE, config(2, usize::MAX / 2));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));

    let result = Engine::with_backend(&backend, DEVICE, config(usize::MAX / 2, 512));
    assert!(matches!(result, Err(Error::Allocation(_))));

    assert!(tap.events().is_empty());

    // Nothing was left open by the failed attempts.
    let mut engine = Engine::with_backend(&backend, DEVICE, config(2, 16)).unwrap();
    assert!(tap.wait_for_blocks(2, TIMEOUT));
    engine.stop().unwrap();
}

#[test]
fn capture_device_opens_once_at_a_time() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 2 });
    let tap = backend.tap();

    let mut first = Engine::with_backend(&backend, DEVICE, config(2, 16)).unwrap();
    let second = Engine::with_backend(&backend, DEVICE, config(2, 16));
    assert!(matches!(second, Err(Error::Stream(_))));

    // Two completed immediately, then a full ring stays in flight.
    assert!(tap.wait_for_blocks(4, TIMEOUT));
    first.stop().unwrap();
    assert_eq!(tap.in_flight(), 0);

    // The completion limit counts per opened device.
    let mut reopened = Engine::with_backend(&backend, DEVICE, config(2, 16)).unwrap();
    assert!(tap.wait_for_blocks(8, TIMEOUT));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(tap.submitted(), 8);
    assert_eq!(tap.in_flight(), 2);
    reopened.stop().unwrap();
}

// ---------------------------------------------------------------------------
// Clock and block contents
// ---------------------------------------------------------------------------

#[test]
fn clock_advances_exactly_one_block_per_block() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 4 });
    let tap = backend.tap();
    let mut engine = Engine::with_backend(&backend, DEVICE, config(8, 512)).unwrap();

    // 4 completed immediately, then the whole ring stays in flight.
    assert!(tap.wait_for_blocks(12, TIMEOUT));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(tap.submitted(), 12);
    assert_eq!(engine.time(), (12 * 512) as f64 / 44100.0);

    let stats = engine.stats();
    assert_eq!(stats.blocks_submitted, 12);
    assert_eq!(stats.blocks_completed, 4);

    engine.stop().unwrap();
}

#[test]
fn every_sample_is_quantized_synthesis_at_its_timestamp() {
    let synth = |t: f64| 1.5 * (2.0 * PI * 440.0 * t).sin();

    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine = Engine::with_synthesis(&backend, DEVICE, config(4, 128), synth).unwrap();

    assert!(tap.wait_for_blocks(4, TIMEOUT));
    assert!(tap.complete_next());
    assert!(tap.complete_next());
    assert!(tap.wait_for_blocks(6, TIMEOUT));
    engine.stop().unwrap();

    let blocks = tap.blocks();
    assert_eq!(blocks.len(), 6);
    for (k, block) in blocks.iter().enumerate() {
        assert_eq!(block.len(), 128);
        for (i, &sample) in block.iter().enumerate() {
            let n = k * 128 + i;
            let t = n as f64 / 44100.0;
            assert_eq!(sample, quantize::<i16>(synth(t)), "block {k} sample {i}");
        }
    }
}

#[test]
fn clipped_samples_hit_full_scale_for_each_bit_depth() {
    let backend = CaptureBackend::<i8>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine = Engine::with_synthesis(&backend, DEVICE, config(2, 8), |_t: f64| -3.0).unwrap();
    assert!(tap.wait_for_blocks(2, TIMEOUT));
    engine.stop().unwrap();
    assert!(tap.blocks().iter().flatten().all(|&s| s == -127));

    let backend = CaptureBackend::<i32>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine = Engine::with_synthesis(&backend, DEVICE, config(2, 8), |_t: f64| 3.0).unwrap();
    assert!(tap.wait_for_blocks(2, TIMEOUT));
    engine.stop().unwrap();
    assert!(tap.blocks().iter().flatten().all(|&s| s == i32::MAX));
}

#[test]
fn set_synthesis_takes_effect_on_next_block() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine =
        Engine::with_synthesis(&backend, DEVICE, config(2, 32), |_t: f64| 0.25).unwrap();

    assert!(tap.wait_for_blocks(2, TIMEOUT));
    engine.set_synthesis(|_t: f64| -0.5);
    assert!(tap.complete_next());
    assert!(tap.wait_for_blocks(3, TIMEOUT));
    engine.stop().unwrap();

    let blocks = tap.blocks();
    assert!(blocks[0].iter().all(|&s| s == quantize::<i16>(0.25)));
    assert!(blocks[1].iter().all(|&s| s == quantize::<i16>(0.25)));
    assert!(blocks[2].iter().all(|&s| s == quantize::<i16>(-0.5)));
}

#[test]
fn voice_synth_plays_note_events() {
    let voice = Arc::new(Voice::default());
    voice.note_on(0.0, 220.0);
    let synth = VoiceSynth::new(Arc::clone(&voice), Patch::default());

    let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 16 });
    let tap = backend.tap();
    let mut engine = Engine::with_synthesis(&backend, DEVICE, config(4, 512), synth).unwrap();
    assert!(tap.wait_for_blocks(20, TIMEOUT));
    engine.stop().unwrap();

    let blocks = tap.blocks();
    // Attack starts from silence.
    assert_eq!(blocks[0][0], 0);
    // Well into sustain, the note is clearly audible.
    let peak = blocks[19].iter().map(|s| s.unsigned_abs()).max().unwrap();
    assert!(peak > 10_000, "peak {peak}");
}

// ---------------------------------------------------------------------------
// Device protocol
// ---------------------------------------------------------------------------

#[test]
fn blocks_are_unprepared_before_reuse() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 20 });
    let tap = backend.tap();
    let mut engine = Engine::with_backend(&backend, DEVICE, config(4, 32)).unwrap();
    assert!(tap.wait_for_blocks(24, TIMEOUT));
    engine.stop().unwrap();

    // Per slot: Prepare, Submit, then Unprepare before the next Prepare.
    let mut submitted = [false; 4];
    for event in tap.events() {
        match event {
            DeviceEvent::Prepare(i) => assert!(!submitted[i], "slot {i} reused while prepared"),
            DeviceEvent::Submit(i) => submitted[i] = true,
            DeviceEvent::Unprepare(i) => {
                assert!(submitted[i], "slot {i} unprepared before submit");
                submitted[i] = false;
            }
        }
    }

    let submits: Vec<usize> = tap
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DeviceEvent::Submit(i) => Some(i),
            _ => None,
        })
        .collect();
    let expected: Vec<usize> = (0..24).map(|n| n % 4).collect();
    assert_eq!(submits, expected);
}

#[test]
fn manual_completion_paces_the_producer() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine = Engine::with_backend(&backend, DEVICE, config(3, 16)).unwrap();

    assert!(tap.wait_for_blocks(3, TIMEOUT));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(tap.submitted(), 3);
    assert_eq!(tap.in_flight(), 3);

    assert!(tap.complete_next());
    assert!(tap.wait_for_blocks(4, TIMEOUT));
    assert_eq!(engine.time(), (4 * 16) as f64 / 44100.0);

    engine.stop().unwrap();
}

// ---------------------------------------------------------------------------
// Shutdown and failure
// ---------------------------------------------------------------------------

#[test]
fn stop_wakes_producer_blocked_on_full_ring() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();
    let mut engine = Engine::with_backend(&backend, DEVICE, config(8, 512)).unwrap();

    assert!(tap.wait_for_blocks(8, TIMEOUT));
    let started = Instant::now();
    engine.stop().unwrap();
    assert!(started.elapsed() < TIMEOUT);
    assert!(!engine.is_running());

    // Second stop is a no-op.
    engine.stop().unwrap();
    assert_eq!(tap.submitted(), 8);
}

#[test]
fn submit_failure_is_returned_by_stop() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 100 })
        .fail_submit_after(3);
    let tap = backend.tap();
    let mut engine = Engine::with_backend(&backend, DEVICE, config(4, 64)).unwrap();

    assert!(wait_until_stopped(&engine));
    assert_eq!(tap.submitted(), 3);
    assert!(matches!(engine.stop(), Err(Error::Device(_))));
}

#[test]
fn drop_stops_engine() {
    let backend = CaptureBackend::<i16>::new(CompletionMode::Manual);
    let tap = backend.tap();
    {
        let _engine = Engine::with_backend(&backend, DEVICE, config(2, 16)).unwrap();
        assert!(tap.wait_for_blocks(2, TIMEOUT));
    }
    // The closed device let go of the blocks it still held.
    assert_eq!(tap.in_flight(), 0);
    assert!(!tap.complete_next());
    assert_eq!(tap.submitted(), 2);
}
