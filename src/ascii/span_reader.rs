//! [`AsciiReader`] over bytes that are already in memory.

use std::fmt;

use crate::ascii::reader::AsciiReader;
use crate::ascii::search::{find_any, find_not_any, find_sequence};
use crate::error::Result;

/// Reads fragments out of a borrowed slice, usually a single line.
///
/// No I/O and no allocation; the cursor is an index into the slice.
#[derive(Clone, Copy)]
pub struct SpanReader<'a> {
    span: &'a [u8],
    position: usize,
}

impl<'a> SpanReader<'a> {
    pub fn new(span: &'a [u8]) -> Self {
        Self { span, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Unread part of the slice.
    pub fn remaining(&self) -> &'a [u8] {
        &self.span[self.position..]
    }

    fn advance_past(&mut self, separator_pos: Option<usize>, width: usize, separators: &[u8]) {
        match separator_pos {
            Some(pos) => {
                self.position += pos + width;
                self.skip_run(separators);
            }
            None => self.position = self.span.len(),
        }
    }

    fn skip_run(&mut self, separators: &[u8]) {
        self.position = match find_not_any(self.remaining(), separators) {
            Some(offset) => self.position + offset,
            None => self.span.len(),
        };
    }
}

impl AsciiReader for SpanReader<'_> {
    fn end_of_stream(&self) -> bool {
        self.position == self.span.len()
    }

    fn skip_separators(&mut self, separators: &[u8]) -> Result<()> {
        self.skip_run(separators);
        Ok(())
    }

    fn skip_fragment(&mut self, separators: &[u8], exact: bool) -> Result<()> {
        if self.end_of_stream() {
            return Ok(());
        }
        let rest = self.remaining();
        if exact {
            self.advance_past(find_sequence(rest, separators), separators.len(), separators);
        } else {
            self.advance_past(find_any(rest, separators), 1, separators);
        }
        Ok(())
    }

    fn read_fragment(&mut self, separators: &[u8]) -> Result<&[u8]> {
        let rest = self.remaining();
        let separator_pos = find_any(rest, separators);
        self.advance_past(separator_pos, 1, separators);
        Ok(match separator_pos {
            Some(pos) => &rest[..pos],
            None => rest,
        })
    }

    fn read_to_end(&mut self) -> Result<&[u8]> {
        let rest = self.remaining();
        self.position = self.span.len();
        Ok(rest)
    }
}

impl fmt::Debug for SpanReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanReader")
            .field("remaining", &String::from_utf8_lossy(self.remaining()))
            .field("position", &self.position)
            .finish()
    }
}
