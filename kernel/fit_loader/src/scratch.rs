//! Statically reserved working memory for the lzma decoder
//!
//! The loader runs before any allocator exists, so the probability arena of the decoder is a static region that
//! can be claimed by exactly one user at a time.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use lzma_decode::MAX_PROBABILITY_COUNT;
use thiserror_no_std::Error;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("The scratch arena is already claimed")]
pub struct ScratchBusy;

/// A fixed size arena of decoder probabilities which can be claimed exclusively
#[derive(Debug)]
pub struct StaticScratch<const N: usize> {
    is_claimed: AtomicBool,
    probabilities: UnsafeCell<[u16; N]>,
}

/// Exclusive access to a [`StaticScratch`] arena which is released again when dropped.
///
/// Use it via the implemented [`Deref`] and [`DerefMut`] traits.
pub struct ScratchGuard<'a, const N: usize> {
    scratch: &'a StaticScratch<N>,
}

/// An arena large enough for every legal lzma coder configuration
pub type ProbabilityArena = StaticScratch<MAX_PROBABILITY_COUNT>;

/// The arena used by [`boot`](crate::boot) and [`load_and_decompress`](crate::load_and_decompress)
pub static SCRATCH: ProbabilityArena = StaticScratch::new();

impl<const N: usize> StaticScratch<N> {
    pub const fn new() -> Self {
        Self {
            is_claimed: AtomicBool::new(false),
            probabilities: UnsafeCell::new([0; N]),
        }
    }

    /// Claim the arena if nobody else holds it.
    ///
    /// This never waits; a claimed arena is reported as [`ScratchBusy`].
    pub fn claim(&self) -> Result<ScratchGuard<'_, N>, ScratchBusy> {
        if self.is_claimed.swap(true, Ordering::Acquire) {
            Err(ScratchBusy)
        } else {
            Ok(ScratchGuard { scratch: self })
        }
    }

    fn release(&self) {
        self.is_claimed.store(false, Ordering::Release)
    }
}

impl<const N: usize> Default for StaticScratch<N> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<const N: usize> Sync for StaticScratch<N> {}

impl<const N: usize> Deref for ScratchGuard<'_, N> {
    type Target = [u16];

    fn deref(&self) -> &Self::Target {
        // Safety: The very existence of this guard guarantees that the arena is claimed exclusively
        unsafe { &*self.scratch.probabilities.get() }
    }
}

impl<const N: usize> DerefMut for ScratchGuard<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: The very existence of this guard guarantees that the arena is claimed exclusively
        unsafe { &mut *self.scratch.probabilities.get() }
    }
}

impl<const N: usize> Drop for ScratchGuard<'_, N> {
    fn drop(&mut self) {
        self.scratch.release();
    }
}
