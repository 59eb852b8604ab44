//! System memory totals from `/proc/meminfo`.

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader};
use crate::config::ProcRoot;
use crate::error::{Error, Result};

const MEMINFO_BUFFER_SIZE: usize = 2048;
const KIB: u64 = 1024;

const KEYS: [&[u8]; 5] = [b"MemTotal", b"MemFree", b"MemAvailable", b"SwapTotal", b"SwapFree"];

/// Memory and swap sizes, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStatistics {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

impl MemoryStatistics {
    pub fn read(root: &ProcRoot) -> Result<Self> {
        let mut reader = FileReader::open(root.path_for("meminfo"), MEMINFO_BUFFER_SIZE)?;
        Self::from_reader(&mut reader)
    }

    /// Stops reading as soon as every wanted key has been seen.
    pub fn from_reader<R: AsciiReader>(reader: &mut R) -> Result<Self> {
        let mut values: [Option<u64>; KEYS.len()] = [None; KEYS.len()];
        while values.iter().any(Option::is_none) {
            if reader.end_of_stream() {
                return Err(Error::NotSupported("meminfo"));
            }
            let mut fields = SpanReader::new(reader.read_line()?);
            let name = fields.read_fragment_by(b':')?;
            let Some(index) = KEYS.iter().position(|key| *key == name) else {
                continue;
            };
            fields.skip_white_spaces()?;
            values[index] = Some(fields.read_u64(Radix::Decimal)? * KIB);
        }

        let [total, free, available, swap_total, swap_free] = values.map(Option::unwrap_or_default);
        Ok(Self {
            total,
            free,
            available,
            swap_total,
            swap_free,
        })
    }

    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::testing::FakeProc;

    const MEMINFO: &str = "\
MemTotal:       16318076 kB
MemFree:         1234567 kB
MemAvailable:    8000000 kB
Buffers:          123456 kB
Cached:          4567890 kB
SwapCached:            0 kB
HugePages_Total:       0
SwapTotal:       2097148 kB
SwapFree:        2097000 kB
Dirty:               100 kB
";

    #[test]
    fn test_meminfo() {
        let mut reader = FileReader::new(MEMINFO.as_bytes(), 64);
        let stats = MemoryStatistics::from_reader(&mut reader).unwrap();
        assert_eq!(stats.total, 16318076 * 1024);
        assert_eq!(stats.free, 1234567 * 1024);
        assert_eq!(stats.available, 8000000 * 1024);
        assert_eq!(stats.swap_total, 2097148 * 1024);
        assert_eq!(stats.swap_free, 2097000 * 1024);
        assert_eq!(stats.used(), (16318076 - 8000000) * 1024);
        // The trailing lines were never needed.
        assert!(!reader.end_of_stream());
    }

    #[test]
    fn test_missing_key() {
        let mut reader = SpanReader::new(b"MemTotal: 1 kB\nMemFree: 1 kB\n");
        assert!(matches!(
            MemoryStatistics::from_reader(&mut reader),
            Err(Error::NotSupported("meminfo"))
        ));
    }

    #[test]
    fn test_read_from_root() {
        let proc = FakeProc::new().with_file("meminfo", MEMINFO);
        let stats = MemoryStatistics::read(&proc.root()).unwrap();
        assert_eq!(stats.swap_free, 2097000 * 1024);
    }
}
