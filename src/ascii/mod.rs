//! Zero-copy tokenizing of kernel-generated ASCII text.
//!
//! Two readers share one fragment API ([`AsciiReader`]):
//! - [`FileReader`] streams a file through a pooled, growable buffer.
//! - [`SpanReader`] walks a slice that is already in memory.
//!
//! Word, line and integer helpers ([`AsciiReaderExt`]) are written once on
//! top of that trait and work for both.
//!
//! ```
//! use procfs_core::ascii::{AsciiReader, AsciiReaderExt, Radix, SpanReader};
//!
//! let mut reader = SpanReader::new(b"eth0:  1500   12\n");
//! assert_eq!(reader.read_word().unwrap(), b"eth0:");
//! assert_eq!(reader.read_i64(Radix::Decimal).unwrap(), 1500);
//! assert_eq!(reader.read_i64(Radix::Decimal).unwrap(), 12);
//! assert!(reader.end_of_stream());
//! ```

mod file_reader;
pub mod parser;
mod reader;
pub mod search;
mod span_reader;

pub use file_reader::FileReader;
pub use parser::{AsciiInt, Radix};
pub use reader::{AsciiReader, AsciiReaderExt, LINE_SEPARATORS, WHITESPACE};
pub use span_reader::SpanReader;
