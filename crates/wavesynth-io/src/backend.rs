//! Output device abstraction.
//!
//! The engine talks to hardware only through these two traits, so the
//! producer loop is the same whether blocks end up in a cpal stream or in
//! the in-memory [`CaptureBackend`](crate::CaptureBackend).
//!
//! ```text
//! ┌──────────┐ claim  ┌──────────┐ prepare + submit ┌──────────────┐
//! │BlockRing │───────►│ Producer │─────────────────►│ OutputDevice │
//! └──────────┘        └──────────┘                  └──────┬───────┘
//!      ▲                                                   │
//!      │              release                              │ played
//!      └────────────── CompletionNotifier ◄────────────────┘
//! ```
//!
//! Completions are expected in submission order.

use crate::engine::EngineConfig;
use crate::notifier::CompletionNotifier;
use crate::ring::Block;
use crate::sample::PcmSample;
use crate::Result;

/// An open output stream that accepts filled blocks.
///
/// The producer calls [`prepare`](Self::prepare) immediately before
/// [`submit`](Self::submit), and [`unprepare`](Self::unprepare) on a
/// returned block before refilling it. Submitted blocks come back through
/// the [`CompletionNotifier`] given to [`AudioBackend::open_output`].
pub trait OutputDevice<S: PcmSample>: Send {
    /// Register a filled block with the device.
    fn prepare(&mut self, block: &mut Block<S>) -> Result<()>;

    /// Release a played block's device registration.
    fn unprepare(&mut self, block: &mut Block<S>) -> Result<()>;

    /// Queue a prepared block for playback.
    fn submit(&mut self, block: Block<S>) -> Result<()>;
}

/// Source of output devices.
pub trait AudioBackend<S: PcmSample> {
    /// Human-readable backend name (e.g. "cpal", "capture").
    fn name(&self) -> &str;

    /// Output device names, in the order the backend reports them.
    fn output_devices(&self) -> Result<Vec<String>>;

    /// Open `device_name` for playback with the engine's geometry.
    fn open_output(
        &self,
        device_name: &str,
        config: &EngineConfig,
        notifier: CompletionNotifier<S>,
    ) -> Result<Box<dyn OutputDevice<S>>>;
}
