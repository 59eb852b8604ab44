//! Process-wide pool of byte blocks.
//!
//! Blocks are bucketed by power-of-two size. Every `/proc` scrape creates and
//! drops a handful of buffers, so recycling blocks keeps the allocator out of
//! the hot path. Requests above the largest class bypass the pool.

use std::sync::{LazyLock, Mutex, PoisonError};

use tracing::debug;

/// Smallest size class, 16 bytes.
const MIN_CLASS_SHIFT: u32 = 4;
/// Largest size class, 1 MiB.
const MAX_CLASS_SHIFT: u32 = 20;
const CLASS_COUNT: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;
/// Blocks retained per size class.
const BLOCKS_PER_CLASS: usize = 32;

static SHARED: LazyLock<BytePool> = LazyLock::new(BytePool::new);

/// A bounded free list of byte blocks per size class.
#[derive(Debug)]
pub struct BytePool {
    classes: Vec<Mutex<Vec<Box<[u8]>>>>,
}

impl Default for BytePool {
    fn default() -> Self {
        Self::new()
    }
}

impl BytePool {
    pub fn new() -> Self {
        Self {
            classes: (0..CLASS_COUNT).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// The pool shared by every [`Buffer`](super::Buffer).
    pub fn shared() -> &'static BytePool {
        &SHARED
    }

    /// Size class index for a block length, if that length is poolable.
    fn class_of(len: usize) -> Option<usize> {
        if !len.is_power_of_two() {
            return None;
        }
        let shift = len.trailing_zeros();
        (MIN_CLASS_SHIFT..=MAX_CLASS_SHIFT)
            .contains(&shift)
            .then(|| (shift - MIN_CLASS_SHIFT) as usize)
    }

    /// Size of the block handed out for a request of `min_len` bytes.
    pub fn block_size(min_len: usize) -> usize {
        let size = min_len.max(1 << MIN_CLASS_SHIFT).next_power_of_two();
        if size > 1 << MAX_CLASS_SHIFT {
            min_len
        } else {
            size
        }
    }

    /// Hands out a block of at least `min_len` bytes.
    ///
    /// Contents of recycled blocks are unspecified.
    pub fn rent(&self, min_len: usize) -> Box<[u8]> {
        let size = Self::block_size(min_len);
        let Some(class) = Self::class_of(size) else {
            debug!(size, "block larger than the biggest pool class, allocating");
            return vec![0u8; size].into_boxed_slice();
        };
        let recycled = self.classes[class]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        recycled.unwrap_or_else(|| vec![0u8; size].into_boxed_slice())
    }

    /// Returns a block to the pool. Blocks that do not fit a class, or that
    /// would overflow a full class, are dropped.
    pub fn give_back(&self, block: Box<[u8]>) {
        let Some(class) = Self::class_of(block.len()) else {
            return;
        };
        let mut free = self.classes[class]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if free.len() < BLOCKS_PER_CLASS {
            free.push(block);
        }
    }

    /// Number of idle blocks currently held for `size`-byte requests.
    pub fn idle_blocks(&self, size: usize) -> usize {
        Self::class_of(Self::block_size(size))
            .map(|class| {
                self.classes[class]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .unwrap_or(0)
    }
}
