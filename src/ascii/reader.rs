//! The fragment API shared by [`SpanReader`](super::SpanReader) and
//! [`FileReader`](super::FileReader).

use crate::ascii::parser::{self, AsciiInt, Radix};
use crate::error::Result;

/// Word boundaries: space, tab, newline, carriage return, vertical tab, form feed.
pub const WHITESPACE: &[u8] = b" \n\t\x0b\x0c\r";

/// Line boundaries.
pub const LINE_SEPARATORS: &[u8] = b"\n\r";

/// Primitive operations of a forward-only ASCII reader.
///
/// A fragment returned by [`read_fragment`](AsciiReader::read_fragment) or
/// [`read_to_end`](AsciiReader::read_to_end) borrows the reader, so it has to
/// be converted before the next call.
///
/// Consecutive separators count as one boundary: after a fragment is located,
/// the run of separators that follows it is consumed too.
pub trait AsciiReader {
    /// `true` once every byte has been consumed and the source is exhausted.
    fn end_of_stream(&self) -> bool;

    /// Consumes bytes while they are in `separators`.
    fn skip_separators(&mut self, separators: &[u8]) -> Result<()>;

    /// Consumes up to and including the next separator and the run after it.
    ///
    /// With `exact`, `separators` is a literal token that has to match as a
    /// whole; bytes of the token directly following it are consumed as well.
    /// Without a match everything is consumed.
    fn skip_fragment(&mut self, separators: &[u8], exact: bool) -> Result<()>;

    /// Returns the bytes up to the next separator and consumes the separator
    /// run. Without a separator the remainder is returned; at the end of the
    /// stream the fragment is empty.
    fn read_fragment(&mut self, separators: &[u8]) -> Result<&[u8]>;

    /// Returns everything that is left.
    fn read_to_end(&mut self) -> Result<&[u8]>;
}

/// Word, line and number helpers built on [`AsciiReader`].
pub trait AsciiReaderExt: AsciiReader {
    fn read_word(&mut self) -> Result<&[u8]> {
        self.read_fragment(WHITESPACE)
    }

    fn skip_word(&mut self) -> Result<()> {
        self.skip_fragment(WHITESPACE, false)
    }

    /// Skips `count` words.
    fn skip_words(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.skip_word()?;
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<&[u8]> {
        self.read_fragment(LINE_SEPARATORS)
    }

    fn skip_line(&mut self) -> Result<()> {
        self.skip_fragment(LINE_SEPARATORS, false)
    }

    fn skip_white_spaces(&mut self) -> Result<()> {
        self.skip_separators(WHITESPACE)
    }

    fn read_fragment_by(&mut self, separator: u8) -> Result<&[u8]> {
        self.read_fragment(&[separator])
    }

    fn skip_fragment_by(&mut self, separator: u8) -> Result<()> {
        self.skip_fragment(&[separator], false)
    }

    /// Reads a word as an owned string, for fields that end up as text anyway.
    fn read_string_word(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.read_word()?).into_owned())
    }

    /// Reads a word and parses it as `T`.
    fn read_int<T: AsciiInt>(&mut self, radix: Radix) -> Result<T> {
        Ok(parser::parse(self.read_word()?, radix)?)
    }

    /// Reads a fragment ending at any of `separators` and parses it as `T`.
    fn read_int_by<T: AsciiInt>(&mut self, separators: &[u8], radix: Radix) -> Result<T> {
        Ok(parser::parse(self.read_fragment(separators)?, radix)?)
    }

    fn read_i16(&mut self, radix: Radix) -> Result<i16> {
        self.read_int(radix)
    }

    fn read_i32(&mut self, radix: Radix) -> Result<i32> {
        self.read_int(radix)
    }

    fn read_i64(&mut self, radix: Radix) -> Result<i64> {
        self.read_int(radix)
    }

    fn read_u64(&mut self, radix: Radix) -> Result<u64> {
        self.read_int(radix)
    }
}

impl<R: AsciiReader + ?Sized> AsciiReaderExt for R {}
