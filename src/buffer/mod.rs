//! Resizable byte buffers backed by the shared [`BytePool`].

mod pool;

pub use pool::BytePool;

use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::error::{Error, Result};
use crate::sys::Descriptor;

/// Estimate used by the slurp helpers when the caller has none.
pub const DEFAULT_ESTIMATED_LENGTH: usize = 512;

/// A length-tracked byte buffer whose storage comes from the shared pool.
///
/// `len() <= capacity()` always holds. Growing past the capacity rents a
/// larger block, copies the current contents into its prefix and returns the
/// old block; growing within the capacity only moves the length. The block is
/// handed back when the buffer is dropped or [`released`](Buffer::release).
#[derive(Debug, Default)]
pub struct Buffer {
    block: Box<[u8]>,
    len: usize,
}

impl Buffer {
    pub fn new(len: usize) -> Self {
        Self::with_capacity(len, 0)
    }

    /// Creates a buffer of `len` bytes backed by at least `min_capacity` bytes.
    pub fn with_capacity(len: usize, min_capacity: usize) -> Self {
        let wanted = len.max(min_capacity);
        let block = if wanted == 0 {
            Box::default()
        } else {
            BytePool::shared().rent(wanted)
        };
        Self { block, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// Sets the logical length, preserving the first `min(len, new_len)` bytes.
    pub fn resize(&mut self, new_len: usize) {
        if new_len > self.block.len() {
            let mut block = BytePool::shared().rent(new_len);
            block[..self.len].copy_from_slice(&self.block[..self.len]);
            let old = std::mem::replace(&mut self.block, block);
            if !old.is_empty() {
                BytePool::shared().give_back(old);
            }
        }
        self.len = new_len;
    }

    /// Returns the storage to the pool. Calling it again is a no-op.
    pub fn release(&mut self) {
        let block = std::mem::take(&mut self.block);
        if !block.is_empty() {
            BytePool::shared().give_back(block);
        }
        self.len = 0;
    }

    /// Reads `source` to exhaustion into a single buffer.
    pub fn from_reader(mut source: impl Read, estimated_len: usize) -> Result<Self> {
        let estimated_len = if estimated_len == 0 {
            DEFAULT_ESTIMATED_LENGTH
        } else {
            estimated_len
        };
        let mut buffer = Self::new(estimated_len);
        let mut total = 0;
        loop {
            let n = source
                .read(&mut buffer[total..])
                .map_err(|e| Error::system_call("read", e))?;
            if n == 0 {
                break;
            }
            total += n;
            if total == buffer.len() {
                buffer.resize(buffer.len() * 2);
            }
        }
        buffer.resize(total);
        Ok(buffer)
    }

    /// Reads a whole file into a single buffer.
    pub fn from_file(path: impl AsRef<Path>, estimated_len: usize) -> Result<Self> {
        Self::from_reader(Descriptor::open_read(path)?, estimated_len)
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.block[..self.len]
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.block[..self.len]
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    #[test]
    fn test_capacity_larger_than_length() {
        let data = pattern(32, 1);
        let mut buffer = Buffer::with_capacity(data.len(), 64);
        assert_eq!(buffer.len(), 32);
        assert!(buffer.capacity() >= 64);
        buffer.copy_from_slice(&data);
        assert_eq!(&buffer[..], &data[..]);
    }

    #[test]
    fn test_no_capacity_hint() {
        let data = pattern(128, 2);
        let mut buffer = Buffer::new(data.len());
        buffer.copy_from_slice(&data);
        assert_eq!(&buffer[..], &data[..]);
    }

    #[test]
    fn test_resize_within_capacity_keeps_block() {
        let data = pattern(16, 3);
        let mut buffer = Buffer::with_capacity(data.len(), 512);
        buffer.copy_from_slice(&data);
        let ptr = buffer.as_ptr();
        buffer.resize(data.len() * 4);
        assert_eq!(buffer.as_ptr(), ptr);
        assert_eq!(&buffer[..data.len()], &data[..]);
    }

    #[test]
    fn test_resize_beyond_capacity_copies_prefix() {
        let data = pattern(128, 4);
        let mut buffer = Buffer::with_capacity(data.len(), 64);
        buffer.copy_from_slice(&data);
        buffer.resize(data.len() * 8);
        assert_eq!(buffer.len(), 1024);
        assert!(buffer.capacity() >= 1024);
        assert_eq!(&buffer[..data.len()], &data[..]);
    }

    #[test]
    fn test_resize_small_to_large() {
        let data = pattern(16, 5);
        let mut buffer = Buffer::with_capacity(data.len(), 64);
        buffer.copy_from_slice(&data);
        buffer.resize(128);
        assert_eq!(&buffer[..data.len()], &data[..]);
    }

    #[test]
    fn test_shrink_keeps_prefix() {
        let data = pattern(128, 6);
        let mut buffer = Buffer::with_capacity(data.len(), 64);
        buffer.copy_from_slice(&data);
        buffer.resize(16);
        assert_eq!(&buffer[..], &data[..16]);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut buffer = Buffer::new(100);
        buffer.release();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 0);
        buffer.release();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_from_reader_grows() {
        let data = pattern(5000, 7);
        let buffer = Buffer::from_reader(&data[..], 16).unwrap();
        assert_eq!(&buffer[..], &data[..]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        std::fs::write(&path, "MemTotal: 1 kB\n").unwrap();
        let buffer = Buffer::from_file(&path, 0).unwrap();
        assert_eq!(&buffer[..], b"MemTotal: 1 kB\n");
    }
}
