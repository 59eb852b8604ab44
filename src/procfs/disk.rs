//! Block device I/O counters from `/proc/diskstats`.

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::procfs::Records;

const DISKSTATS_BUFFER_SIZE: usize = 4096;
/// Sector unit of the kernel block layer, independent of the device.
const SECTOR_SIZE: u64 = 512;

/// Counters for one direction (reads or writes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Completed requests.
    pub count: u64,
    /// Adjacent requests merged into one.
    pub merged: u64,
    pub bytes: u64,
    /// Seconds spent on these requests.
    pub time: f64,
}

impl Operation {
    fn parse(fields: &mut SpanReader<'_>) -> Result<Self> {
        Ok(Self {
            count: fields.read_u64(Radix::Decimal)?,
            merged: fields.read_u64(Radix::Decimal)?,
            bytes: fields.read_u64(Radix::Decimal)? * SECTOR_SIZE,
            time: fields.read_u64(Radix::Decimal)? as f64 / 1000.0,
        })
    }
}

/// One line of `/proc/diskstats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStatistics {
    pub device_name: String,
    pub reads: Operation,
    pub writes: Operation,
    /// Seconds the device had requests in flight.
    pub total_time: f64,
    /// In-flight time weighted by the number of requests.
    pub total_weighted_time: f64,
}

impl DiskStatistics {
    pub fn all(root: &ProcRoot) -> Result<impl Iterator<Item = Result<DiskStatistics>>> {
        let reader = FileReader::open(root.path_for("diskstats"), DISKSTATS_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader<R: AsciiReader>(reader: R) -> impl Iterator<Item = Result<DiskStatistics>> {
        Records::new(reader, |reader: &mut R| {
            if reader.end_of_stream() {
                return Ok(None);
            }
            Self::parse_line(reader.read_line()?).map(Some)
        })
    }

    fn parse_line(line: &[u8]) -> Result<Self> {
        let mut fields = SpanReader::new(line);
        fields.skip_white_spaces()?;
        // major and minor numbers
        fields.skip_words(2)?;
        let device_name = fields.read_string_word()?;
        let reads = Operation::parse(&mut fields)?;
        let writes = Operation::parse(&mut fields)?;
        // requests in flight
        fields.skip_word()?;
        let total_time = fields.read_u64(Radix::Decimal)? as f64 / 1000.0;
        let total_weighted_time = fields.read_u64(Radix::Decimal)? as f64 / 1000.0;
        Ok(Self {
            device_name,
            reads,
            writes,
            total_time,
            total_weighted_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::procfs::testing::FakeProc;

    const DISKSTATS: &str = "   7       0 loop0 46 0 1 12 0 0 0 0 0 40 12 0 0 0 0\n\
                             \x20  8       0 sda 1000 20 40000 500 2000 30 80000 900 3 1200 1400 0 0 0 0 10 20\n\
                             \x20  8       1 sda1 10 0 80 5 0 0 0 0 0 7 5\n";

    #[test]
    fn test_diskstats() {
        let disks: Vec<_> = DiskStatistics::from_reader(SpanReader::new(DISKSTATS.as_bytes()))
            .collect::<Result<_>>()
            .unwrap();
        let names: Vec<_> = disks.iter().map(|d| d.device_name.as_str()).collect();
        assert_eq!(names, vec!["loop0", "sda", "sda1"]);

        let sda = &disks[1];
        assert_eq!(
            sda.reads,
            Operation {
                count: 1000,
                merged: 20,
                bytes: 40000 * 512,
                time: 0.5,
            }
        );
        assert_eq!(sda.writes.count, 2000);
        assert_eq!(sda.writes.bytes, 80000 * 512);
        assert_eq!(sda.writes.time, 0.9);
        assert_eq!(sda.total_time, 1.2);
        assert_eq!(sda.total_weighted_time, 1.4);
    }

    #[test]
    fn test_short_line_of_old_kernel() {
        let disks: Vec<_> = DiskStatistics::from_reader(SpanReader::new(DISKSTATS.as_bytes()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(disks[2].total_weighted_time, 0.005);
    }

    #[test]
    fn test_truncated_line() {
        let mut disks = DiskStatistics::from_reader(SpanReader::new(b"8 0 sda 1 2 3\n"));
        assert!(matches!(disks.next(), Some(Err(Error::Format(_)))));
        assert!(disks.next().is_none());
    }

    #[test]
    fn test_all_from_fake_root() {
        let proc = FakeProc::new().with_file("diskstats", DISKSTATS);
        assert_eq!(DiskStatistics::all(&proc.root()).unwrap().count(), 3);
    }
}
