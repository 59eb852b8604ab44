//! System boot time from the `btime` line of `/proc/stat`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix};
use crate::config::ProcRoot;
use crate::error::{Error, Result};

const STAT_BUFFER_SIZE: usize = 4096;
const BTIME_MARKER: &[u8] = b"btime ";

/// Reads the boot time of the system.
pub fn boot_time(root: &ProcRoot) -> Result<DateTime<Utc>> {
    let mut reader = FileReader::open(root.path_for("stat"), STAT_BUFFER_SIZE)?;
    boot_time_from(&mut reader)
}

/// Finds the `btime` marker anywhere in the stream and decodes the seconds
/// after it.
pub fn boot_time_from<R: AsciiReader>(reader: &mut R) -> Result<DateTime<Utc>> {
    reader.skip_fragment(BTIME_MARKER, true)?;
    if reader.end_of_stream() {
        return Err(Error::NotSupported("btime"));
    }
    let seconds = reader.read_i64(Radix::Decimal)?;
    DateTime::from_timestamp(seconds, 0).ok_or(Error::NotSupported("btime"))
}

/// Boot time cached for a short interval.
///
/// `btime` moves when the wall clock is adjusted, so the value is re-read at
/// most once per `refresh_interval`.
pub struct BootTime {
    root: ProcRoot,
    refresh_interval: Duration,
    cached: Mutex<Option<(Instant, DateTime<Utc>)>>,
}

impl BootTime {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(root: ProcRoot) -> Self {
        Self::with_refresh_interval(root, Self::DEFAULT_REFRESH_INTERVAL)
    }

    pub fn with_refresh_interval(root: ProcRoot, refresh_interval: Duration) -> Self {
        Self {
            root,
            refresh_interval,
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Result<DateTime<Utc>> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((read_at, value)) = *cached
            && read_at.elapsed() < self.refresh_interval
        {
            return Ok(value);
        }
        let value = boot_time(&self.root)?;
        debug!(boot_time = %value, "boot time refreshed");
        *cached = Some((Instant::now(), value));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::SpanReader;
    use crate::procfs::testing::FakeProc;

    const STAT: &str = "cpu  100 5 30 500 0 2 3 0 0 0\nintr 1 2 3\nctxt 42\nbtime 1700000000\nprocesses 77\n";

    #[test]
    fn test_btime() {
        let mut reader = SpanReader::new(STAT.as_bytes());
        let value = boot_time_from(&mut reader).unwrap();
        assert_eq!(value.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_btime_split_across_refills() {
        for buffer_size in [1, 2, 3, 7, 16] {
            let mut reader = FileReader::new(STAT.as_bytes(), buffer_size);
            let value = boot_time_from(&mut reader).unwrap();
            assert_eq!(value.timestamp(), 1_700_000_000, "buffer {buffer_size}");
        }
    }

    #[test]
    fn test_missing_btime() {
        let mut reader = SpanReader::new(b"cpu  1 2 3\nctxt 42\n");
        assert!(matches!(
            boot_time_from(&mut reader),
            Err(Error::NotSupported("btime"))
        ));
    }

    #[test]
    fn test_cached_boot_time() {
        let proc = FakeProc::new().with_file("stat", STAT);
        let cache = BootTime::with_refresh_interval(proc.root(), Duration::from_secs(3600));
        assert_eq!(cache.get().unwrap().timestamp(), 1_700_000_000);

        std::fs::write(proc.root().path_for("stat"), "btime 1800000000\n").unwrap();
        assert_eq!(cache.get().unwrap().timestamp(), 1_700_000_000);

        let fresh = BootTime::with_refresh_interval(proc.root(), Duration::ZERO);
        assert_eq!(fresh.get().unwrap().timestamp(), 1_800_000_000);
    }
}
