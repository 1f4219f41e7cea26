//! In-memory output backend.
//!
//! [`CaptureBackend`] stands in for a sound card: it records a copy of every
//! submitted block and lets the caller decide when blocks "finish playing".
//! The engine cannot tell it apart from a real device, which makes the whole
//! producer/completion cycle testable without audio hardware.
//!
//! ```rust
//! use std::time::Duration;
//! use wavesynth_io::{CaptureBackend, CompletionMode, Engine, EngineConfig};
//!
//! let backend = CaptureBackend::<i16>::new(CompletionMode::Immediate { limit: 4 });
//! let tap = backend.tap();
//! let config = EngineConfig { block_samples: 64, ..EngineConfig::default() };
//! let mut engine = Engine::with_backend(&backend, CaptureBackend::<i16>::DEVICE_NAME, config)?;
//! engine.set_synthesis(|_t: f64| 0.5);
//!
//! // 4 completed blocks plus a full ring of 8 that stay in flight.
//! assert!(tap.wait_for_blocks(12, Duration::from_secs(5)));
//! engine.stop()?;
//! # Ok::<(), wavesynth_io::Error>(())
//! ```

use crate::backend::{AudioBackend, OutputDevice};
use crate::engine::EngineConfig;
use crate::notifier::CompletionNotifier;
use crate::ring::Block;
use crate::sample::PcmSample;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// When captured blocks are handed back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Blocks stay in flight until [`CaptureTap::complete_next`] is called.
    Manual,
    /// The first `limit` submissions complete during `submit`; later ones
    /// stay in flight.
    Immediate {
        /// Number of submissions completed immediately.
        limit: usize,
    },
}

/// Device call recorded by the capture backend, with the block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// `prepare` was called on the block.
    Prepare(usize),
    /// `unprepare` was called on the block.
    Unprepare(usize),
    /// The block was submitted.
    Submit(usize),
}

#[derive(Debug)]
struct CaptureState<S> {
    captured: Vec<Vec<S>>,
    events: Vec<DeviceEvent>,
    in_flight: VecDeque<Block<S>>,
    notifier: Option<CompletionNotifier<S>>,
}

#[derive(Debug)]
struct Shared<S> {
    state: Mutex<CaptureState<S>>,
    changed: Condvar,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, CaptureState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Backend whose single device records blocks in memory.
///
/// Only one output can be open at a time; a second `open_output` fails until
/// the first device has been dropped.
#[derive(Debug)]
pub struct CaptureBackend<S> {
    devices: Vec<String>,
    mode: CompletionMode,
    fail_submit_after: Option<usize>,
    shared: Arc<Shared<S>>,
}

impl<S: PcmSample> CaptureBackend<S> {
    /// Name of the device a default capture backend exposes.
    pub const DEVICE_NAME: &'static str = "Capture Device";

    /// Create a backend exposing one device named [`Self::DEVICE_NAME`].
    pub fn new(mode: CompletionMode) -> Self {
        Self {
            devices: vec![Self::DEVICE_NAME.to_string()],
            mode,
            fail_submit_after: None,
            shared: Arc::new(Shared {
                state: Mutex::new(CaptureState {
                    captured: Vec::new(),
                    events: Vec::new(),
                    in_flight: VecDeque::new(),
                    notifier: None,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Replace the enumerated device names. Any of them can be opened.
    pub fn with_devices<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.devices = names.into_iter().map(Into::into).collect();
        self
    }

    /// Make every submission after the first `count` fail.
    pub fn fail_submit_after(mut self, count: usize) -> Self {
        self.fail_submit_after = Some(count);
        self
    }

    /// Observer handle for the captured stream.
    pub fn tap(&self) -> CaptureTap<S> {
        CaptureTap {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: PcmSample> AudioBackend<S> for CaptureBackend<S> {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn output_devices(&self) -> Result<Vec<String>> {
        Ok(self.devices.clone())
    }

    fn open_output(
        &self,
        device_name: &str,
        config: &EngineConfig,
        notifier: CompletionNotifier<S>,
    ) -> Result<Box<dyn OutputDevice<S>>> {
        if !self.devices.iter().any(|d| d == device_name) {
            return Err(Error::DeviceNotFound(device_name.to_string()));
        }
        {
            let mut state = self.shared.lock();
            if state.notifier.is_some() {
                return Err(Error::Stream("capture device already open".into()));
            }
            state.notifier = Some(notifier);
        }
        tracing::debug!(
            device = device_name,
            block_samples = config.block_samples,
            mode = ?self.mode,
            "capture device opened"
        );
        Ok(Box::new(CaptureDevice {
            shared: Arc::clone(&self.shared),
            mode: self.mode,
            fail_submit_after: self.fail_submit_after,
            submitted: 0,
        }))
    }
}

struct CaptureDevice<S> {
    shared: Arc<Shared<S>>,
    mode: CompletionMode,
    fail_submit_after: Option<usize>,
    /// Submissions accepted by this device, not the whole capture.
    submitted: usize,
}

impl<S> Drop for CaptureDevice<S> {
    // Blocks still in flight belong to this device's ring; drop them with it
    // so the backend can be opened again.
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.notifier = None;
        state.in_flight.clear();
    }
}

impl<S: PcmSample> OutputDevice<S> for CaptureDevice<S> {
    fn prepare(&mut self, block: &mut Block<S>) -> Result<()> {
        self.shared
            .lock()
            .events
            .push(DeviceEvent::Prepare(block.index()));
        Ok(())
    }

    fn unprepare(&mut self, block: &mut Block<S>) -> Result<()> {
        self.shared
            .lock()
            .events
            .push(DeviceEvent::Unprepare(block.index()));
        Ok(())
    }

    fn submit(&mut self, block: Block<S>) -> Result<()> {
        let submitted = self.submitted;
        if self.fail_submit_after.is_some_and(|n| submitted >= n) {
            return Err(Error::Device(format!(
                "capture device rejected block {}",
                block.index()
            )));
        }

        self.submitted += 1;
        let mut state = self.shared.lock();
        state.events.push(DeviceEvent::Submit(block.index()));
        state.captured.push(block.samples().to_vec());

        let complete_now = match self.mode {
            CompletionMode::Manual => false,
            CompletionMode::Immediate { limit } => submitted < limit,
        };
        let notifier = state.notifier.clone();
        let finished = if complete_now {
            Some(block)
        } else {
            state.in_flight.push_back(block);
            None
        };
        drop(state);
        self.shared.changed.notify_all();

        if let (Some(block), Some(notifier)) = (finished, notifier) {
            notifier.complete(block);
        }
        Ok(())
    }
}

/// Read access to what a [`CaptureBackend`] device has received.
#[derive(Debug)]
pub struct CaptureTap<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for CaptureTap<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: PcmSample> CaptureTap<S> {
    /// Copies of every submitted block, in submission order.
    pub fn blocks(&self) -> Vec<Vec<S>> {
        self.shared.lock().captured.clone()
    }

    /// Number of blocks submitted so far.
    pub fn submitted(&self) -> usize {
        self.shared.lock().captured.len()
    }

    /// Device calls in the order they happened.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.shared.lock().events.clone()
    }

    /// Blocks submitted but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight.len()
    }

    /// Wait until at least `count` blocks have been submitted.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub fn wait_for_blocks(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while state.captured.len() < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .shared
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Complete the oldest in-flight block. Returns `false` if none is pending.
    pub fn complete_next(&self) -> bool {
        let mut state = self.shared.lock();
        let Some(block) = state.in_flight.pop_front() else {
            return false;
        };
        let notifier = state.notifier.clone();
        drop(state);

        if let Some(notifier) = notifier {
            notifier.complete(block);
        }
        true
    }
}
