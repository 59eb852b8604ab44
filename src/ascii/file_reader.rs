//! Buffered [`AsciiReader`] over a byte stream.
//!
//! Bytes are read into a pooled [`Buffer`]; `[start, end)` is the part read
//! but not yet consumed. When the tail is full the reader first shifts the
//! live bytes down to offset zero and only grows the buffer when there is no
//! dead prefix left to reclaim.
//!
//! While [`read_fragment`](AsciiReader::read_fragment) skips the separator
//! run after a fragment it may have to refill, so the fragment's first byte
//! is recorded as `locked_start`: compaction keeps everything from there on
//! and moves the lock along with the data. The fragment handed out borrows
//! the reader, so the next call (which may overwrite it) cannot happen while
//! it is alive.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use tracing::trace;

use crate::ascii::reader::AsciiReader;
use crate::ascii::search::{find_any, find_not_any, find_sequence};
use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::sys::Descriptor;

/// Smallest buffer a reader starts with.
const MIN_BUFFER_SIZE: usize = 16;

/// Streams fragments out of a file descriptor (or any [`Read`] source).
pub struct FileReader<R = Descriptor> {
    source: R,
    buffer: Buffer,
    locked_start: Option<usize>,
    start: usize,
    end: usize,
    source_exhausted: bool,
}

impl FileReader<Descriptor> {
    /// Opens `path` read-only; `initial_buffer_size` should cover a typical file.
    pub fn open(path: impl AsRef<Path>, initial_buffer_size: usize) -> Result<Self> {
        Ok(Self::new(Descriptor::open_read(path)?, initial_buffer_size))
    }
}

impl<R: Read> FileReader<R> {
    pub fn new(source: R, initial_buffer_size: usize) -> Self {
        Self {
            source,
            buffer: Buffer::new(initial_buffer_size.max(MIN_BUFFER_SIZE)),
            locked_start: None,
            start: 0,
            end: 0,
            source_exhausted: false,
        }
    }

    /// Current size of the read buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    fn buffered(&self) -> &[u8] {
        &self.buffer[self.start..self.end]
    }

    /// Performs one successful read into the tail, compacting or growing
    /// first when the tail is full. Does nothing once the source is exhausted.
    fn fill(&mut self) -> Result<()> {
        while !self.source_exhausted {
            if self.end < self.buffer.len() {
                let n = loop {
                    match self.source.read(&mut self.buffer[self.end..]) {
                        Ok(n) => break n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(Error::system_call("read", e)),
                    }
                };
                self.end += n;
                self.source_exhausted = n == 0;
                return Ok(());
            }

            let keep_from = self.locked_start.unwrap_or(self.start);
            if keep_from > 0 {
                self.buffer.copy_within(keep_from..self.end, 0);
                self.start -= keep_from;
                self.end -= keep_from;
                if let Some(locked) = self.locked_start.as_mut() {
                    *locked = 0;
                }
                trace!(shifted = keep_from, live = self.end, "compacted read buffer");
            } else {
                let size = self.buffer.len() * 2;
                trace!(from = self.buffer.len(), to = size, "growing read buffer");
                self.buffer.resize(size);
            }
        }
        Ok(())
    }

    fn ensure_buffered(&mut self) -> Result<()> {
        if self.start == self.end {
            self.fill()?;
        }
        Ok(())
    }

    fn consume(&mut self, count: usize) {
        self.start += count;
        if self.start == self.end && self.locked_start.is_none() {
            self.start = 0;
            self.end = 0;
        }
    }

    fn consume_all(&mut self) {
        self.consume(self.end - self.start);
    }

    /// Offset (relative to `start`) of the first separator, refilling as
    /// needed. Bytes already scanned are not scanned again.
    fn find_separator(&mut self, separators: &[u8]) -> Result<Option<usize>> {
        self.ensure_buffered()?;
        let mut scanned = 0;
        loop {
            if let Some(offset) = find_any(&self.buffered()[scanned..], separators) {
                return Ok(Some(scanned + offset));
            }
            if self.source_exhausted {
                return Ok(None);
            }
            scanned = self.end - self.start;
            self.fill()?;
        }
    }

    /// Releases the lock and returns where the locked fragment starts.
    fn unlock(&mut self) -> usize {
        let locked = self.locked_start.take().unwrap_or(self.start);
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        locked
    }
}

impl<R: Read> AsciiReader for FileReader<R> {
    fn end_of_stream(&self) -> bool {
        self.source_exhausted && self.start == self.end
    }

    fn skip_separators(&mut self, separators: &[u8]) -> Result<()> {
        loop {
            self.ensure_buffered()?;
            match find_not_any(self.buffered(), separators) {
                Some(offset) => {
                    self.consume(offset);
                    return Ok(());
                }
                None => {
                    self.consume_all();
                    if self.source_exhausted {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn skip_fragment(&mut self, separators: &[u8], exact: bool) -> Result<()> {
        if self.end_of_stream() {
            return Ok(());
        }
        // A token split by a refill must still be found, so keep its prefix.
        let (keep, width) = if exact {
            (separators.len().saturating_sub(1), separators.len())
        } else {
            (0, 1)
        };
        loop {
            self.ensure_buffered()?;
            let data = self.buffered();
            let buffered = data.len();
            let found = if exact {
                find_sequence(data, separators)
            } else {
                find_any(data, separators)
            };
            if let Some(pos) = found {
                self.consume(pos + width);
                return self.skip_separators(separators);
            }
            if self.source_exhausted {
                self.consume_all();
                return Ok(());
            }
            self.consume(buffered.saturating_sub(keep));
            self.fill()?;
        }
    }

    fn read_fragment(&mut self, separators: &[u8]) -> Result<&[u8]> {
        if self.end_of_stream() {
            return Ok(&[]);
        }
        let separator_pos = self.find_separator(separators)?;
        self.locked_start = Some(self.start);
        let len = match separator_pos {
            Some(pos) => {
                self.consume(pos + 1);
                if let Err(err) = self.skip_separators(separators) {
                    self.unlock();
                    return Err(err);
                }
                pos
            }
            None => {
                let len = self.end - self.start;
                self.consume_all();
                len
            }
        };
        let from = self.unlock();
        Ok(&self.buffer[from..from + len])
    }

    fn read_to_end(&mut self) -> Result<&[u8]> {
        while !self.source_exhausted {
            self.fill()?;
        }
        let (from, to) = (self.start, self.end);
        self.start = 0;
        self.end = 0;
        Ok(&self.buffer[from..to])
    }
}

impl<R> fmt::Debug for FileReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReader")
            .field("buffered", &String::from_utf8_lossy(&self.buffer[self.start..self.end]))
            .field("buffer_len", &self.buffer.len())
            .field("locked_start", &self.locked_start)
            .field("source_exhausted", &self.source_exhausted)
            .finish()
    }
}
