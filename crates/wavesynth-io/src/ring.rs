//! Fixed pool of PCM blocks shared by the producer and the output device.
//!
//! Blocks are moved rather than indexed: a claimed [`Block`] leaves the ring
//! and only comes back through [`BlockRing::release`]. While the device holds
//! a block, nothing else can reach its samples.

use crate::sample::PcmSample;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One fixed-length chunk of quantised samples.
#[derive(Debug)]
pub struct Block<S> {
    index: usize,
    samples: Box<[S]>,
    prepared: bool,
}

impl<S: PcmSample> Block<S> {
    fn new(index: usize, len: usize) -> Self {
        Self {
            index,
            samples: vec![S::default(); len].into_boxed_slice(),
            prepared: false,
        }
    }

    fn try_new(index: usize, len: usize) -> Result<Self> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|e| Error::Allocation(format!("block {index}: {e}")))?;
        samples.resize(len, S::default());
        Ok(Self {
            index,
            samples: samples.into_boxed_slice(),
            prepared: false,
        })
    }

    /// Ring slot this block belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Samples in the block.
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Mutable samples, available while the block is being filled.
    pub fn samples_mut(&mut self) -> &mut [S] {
        &mut self.samples
    }

    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the block has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the block is currently registered with the output device.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub(crate) fn set_prepared(&mut self, prepared: bool) {
        self.prepared = prepared;
    }
}

/// Where a ring slot's block currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// Back in the ring, ready to be claimed.
    Free,
    /// Claimed by the producer.
    Filling,
    /// Handed to the output device.
    Submitted,
}

#[derive(Debug)]
enum Slot<S> {
    Free(Block<S>),
    Filling,
    Submitted,
}

impl<S> Slot<S> {
    fn state(&self) -> BlockState {
        match self {
            Slot::Free(_) => BlockState::Free,
            Slot::Filling => BlockState::Filling,
            Slot::Submitted => BlockState::Submitted,
        }
    }
}

#[derive(Debug)]
struct RingState<S> {
    slots: Vec<Slot<S>>,
    free: usize,
    closed: bool,
    /// Submitted indices, oldest first.
    outstanding: VecDeque<usize>,
}

impl<S> RingState<S> {
    fn check_invariants(&self) {
        debug_assert!(self.free <= self.slots.len());
        debug_assert_eq!(
            self.free,
            self.slots
                .iter()
                .filter(|s| matches!(s, Slot::Free(_)))
                .count()
        );
    }
}

/// Circular pool of `count` equal-length blocks with a free count.
///
/// The producer claims slots round-robin with [`claim`](Self::claim); the
/// completion path hands them back with [`release`](Self::release). Closing
/// the ring wakes every waiter, so a producer blocked on a full ring always
/// observes shutdown.
///
/// Completions are expected in submission order. A completion for any other
/// block is still accepted but logged.
#[derive(Debug)]
pub struct BlockRing<S> {
    state: Mutex<RingState<S>>,
    available: Condvar,
    block_samples: usize,
}

impl<S: PcmSample> BlockRing<S> {
    /// Allocate `count` blocks of `block_samples` samples each, all free.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot be allocated; see [`try_new`](Self::try_new).
    pub fn new(count: usize, block_samples: usize) -> Self {
        let slots = (0..count)
            .map(|i| Slot::Free(Block::new(i, block_samples)))
            .collect();
        Self::from_slots(slots, block_samples)
    }

    /// Like [`new`](Self::new), but reports storage that is too large or
    /// cannot be allocated as [`Error::Allocation`].
    pub fn try_new(count: usize, block_samples: usize) -> Result<Self> {
        let too_large = || {
            Error::Allocation(format!(
                "{count} blocks of {block_samples} samples exceed the address space"
            ))
        };
        let bytes = count
            .checked_mul(block_samples)
            .and_then(|n| n.checked_mul(size_of::<S>()))
            .ok_or_else(too_large)?;
        if bytes > isize::MAX as usize {
            return Err(too_large());
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(count)
            .map_err(|e| Error::Allocation(e.to_string()))?;
        for i in 0..count {
            slots.push(Slot::Free(Block::try_new(i, block_samples)?));
        }
        Ok(Self::from_slots(slots, block_samples))
    }

    fn from_slots(slots: Vec<Slot<S>>, block_samples: usize) -> Self {
        let count = slots.len();
        Self {
            state: Mutex::new(RingState {
                slots,
                free: count,
                closed: false,
                outstanding: VecDeque::with_capacity(count),
            }),
            available: Condvar::new(),
            block_samples,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RingState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the block at `index`, waiting until it has been returned.
    ///
    /// Returns `None` once the ring is closed, whether or not the slot is free.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn claim(&self, index: usize) -> Option<Block<S>> {
        let guard = self.lock();
        let mut state = self
            .available
            .wait_while(guard, |s| {
                !s.closed && !matches!(s.slots[index], Slot::Free(_))
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return None;
        }

        let Slot::Free(block) = std::mem::replace(&mut state.slots[index], Slot::Filling) else {
            return None;
        };
        state.free -= 1;
        state.check_invariants();
        tracing::trace!(index, free = state.free, "block claimed");
        Some(block)
    }

    /// Record that the block at `index` is about to go to the device.
    pub(crate) fn mark_submitted(&self, index: usize) {
        let mut state = self.lock();
        if matches!(state.slots[index], Slot::Filling) {
            state.slots[index] = Slot::Submitted;
            state.outstanding.push_back(index);
        }
    }

    /// Return a block to its slot and wake one waiter.
    pub fn release(&self, block: Block<S>) {
        let index = block.index();
        let mut state = self.lock();

        match state.slots[index].state() {
            BlockState::Free => {
                tracing::warn!(index, "released a block that is already free");
                return;
            }
            // Claimed but never submitted.
            BlockState::Filling => {}
            BlockState::Submitted => match state.outstanding.front().copied() {
                Some(oldest) if oldest == index => {
                    state.outstanding.pop_front();
                }
                oldest => {
                    tracing::warn!(
                        index,
                        expected = ?oldest,
                        "block completed out of submission order"
                    );
                    state.outstanding.retain(|&i| i != index);
                }
            },
        }

        state.slots[index] = Slot::Free(block);
        state.free += 1;
        state.check_invariants();
        drop(state);
        self.available.notify_one();
    }

    /// Close the ring and wake every waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of blocks currently free.
    pub fn free_count(&self) -> usize {
        self.lock().free
    }

    /// Total number of blocks.
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }

    /// Samples per block.
    pub fn block_samples(&self) -> usize {
        self.block_samples
    }

    /// State of the slot at `index`, or `None` if out of range.
    pub fn state(&self, index: usize) -> Option<BlockState> {
        self.lock().slots.get(index).map(Slot::state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_ring_is_all_free() {
        let ring: BlockRing<i16> = BlockRing::new(4, 16);
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.free_count(), 4);
        assert_eq!(ring.block_samples(), 16);
        assert_eq!(ring.state(0), Some(BlockState::Free));
        assert_eq!(ring.state(4), None);
    }

    #[test]
    fn test_claim_submit_release_cycle() {
        let ring: BlockRing<i16> = BlockRing::new(2, 8);

        let block = ring.claim(0).unwrap();
        assert_eq!(block.index(), 0);
        assert_eq!(block.len(), 8);
        assert_eq!(ring.free_count(), 1);
        assert_eq!(ring.state(0), Some(BlockState::Filling));

        ring.mark_submitted(0);
        assert_eq!(ring.state(0), Some(BlockState::Submitted));

        ring.release(block);
        assert_eq!(ring.free_count(), 2);
        assert_eq!(ring.state(0), Some(BlockState::Free));
    }

    #[test]
    fn test_samples_survive_round_trip() {
        let ring: BlockRing<i16> = BlockRing::new(2, 4);
        let mut block = ring.claim(1).unwrap();
        block.samples_mut().copy_from_slice(&[1, 2, 3, 4]);
        ring.mark_submitted(1);
        ring.release(block);

        let block = ring.claim(1).unwrap();
        assert_eq!(block.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_claim_waits_for_release() {
        let ring: Arc<BlockRing<i16>> = Arc::new(BlockRing::new(2, 4));
        let block = ring.claim(0).unwrap();
        ring.mark_submitted(0);

        let waiter = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || ring.claim(0).map(|b| b.index()))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        ring.release(block);
        assert_eq!(waiter.join().unwrap(), Some(0));
    }

    #[test]
    fn test_close_wakes_waiter() {
        let ring: Arc<BlockRing<i16>> = Arc::new(BlockRing::new(2, 4));
        let _held = ring.claim(0).unwrap();

        let waiter = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || ring.claim(0).is_none())
        };

        thread::sleep(Duration::from_millis(20));
        ring.close();
        assert!(waiter.join().unwrap());
        assert!(ring.is_closed());
    }

    #[test]
    fn test_claim_after_close_returns_none() {
        let ring: BlockRing<i16> = BlockRing::new(2, 4);
        ring.close();
        assert!(ring.claim(0).is_none());
        assert_eq!(ring.free_count(), 2);
    }

    #[test]
    fn test_try_new_matches_new() {
        let ring: BlockRing<i16> = BlockRing::try_new(3, 16).unwrap();
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.free_count(), 3);
        assert_eq!(ring.claim(2).unwrap().samples(), &[0; 16]);
    }

    #[test]
    fn test_try_new_rejects_oversized_storage() {
        let result = BlockRing::<i16>::try_new(2, usize::MAX / 2);
        assert!(matches!(result, Err(Error::Allocation(_))));

        let result = BlockRing::<i32>::try_new(usize::MAX / 4, 512);
        assert!(matches!(result, Err(Error::Allocation(_))));

        // Fits in usize, but not in a single allocation.
        let result = BlockRing::<i8>::try_new(1, isize::MAX as usize + 1);
        assert!(matches!(result, Err(Error::Allocation(_))));
    }

    #[test]
    fn test_out_of_order_release_still_frees() {
        let ring: BlockRing<i16> = BlockRing::new(3, 4);
        let a = ring.claim(0).unwrap();
        ring.mark_submitted(0);
        let b = ring.claim(1).unwrap();
        ring.mark_submitted(1);

        ring.release(b);
        ring.release(a);
        assert_eq!(ring.free_count(), 3);
    }
}
