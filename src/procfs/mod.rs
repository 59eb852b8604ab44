//! Decoders for individual `/proc` files.
//!
//! Each decoder opens its file with a [`FileReader`](crate::ascii::FileReader)
//! sized for the usual content, walks it with the fragment API and yields
//! typed records. Multi-record files are exposed as lazy iterators that own
//! the reader, so the descriptor is closed as soon as the iterator is dropped,
//! exhausted or not.

pub mod boot_time;
pub mod cpu;
pub mod disk;
pub mod link;
pub mod memory;
pub mod net;
pub mod process;

use std::iter::FusedIterator;

use crate::ascii::AsciiReader;
use crate::error::Result;

/// Lazy, single-pass sequence of records decoded from a reader.
///
/// `decode` returns `Ok(None)` when there are no more records. The first
/// error is yielded once and ends the sequence.
pub struct Records<R, F> {
    reader: R,
    decode: F,
    done: bool,
}

impl<R, F> Records<R, F> {
    pub fn new(reader: R, decode: F) -> Self {
        Self {
            reader,
            decode,
            done: false,
        }
    }
}

impl<R, F, T> Iterator for Records<R, F>
where
    R: AsciiReader,
    F: FnMut(&mut R) -> Result<Option<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.decode)(&mut self.reader) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R, F, T> FusedIterator for Records<R, F>
where
    R: AsciiReader,
    F: FnMut(&mut R) -> Result<Option<T>>,
{
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use tempfile::TempDir;

    use crate::config::ProcRoot;

    /// A throwaway proc tree populated with fixture files.
    pub struct FakeProc {
        dir: TempDir,
    }

    impl FakeProc {
        pub fn new() -> Self {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        pub fn with_file(self, relative: impl AsRef<Path>, content: &str) -> Self {
            let path = self.dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
            self
        }

        pub fn root(&self) -> ProcRoot {
            ProcRoot::new(self.dir.path())
        }
    }
}
