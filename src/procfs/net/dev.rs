//! Interface traffic counters from `/proc/net/dev`.

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::procfs::Records;

const NET_DEV_BUFFER_SIZE: usize = 4096;
/// bytes, packets, errs, drop
const DECODED_COLUMNS: usize = 4;
/// Receive columns of every kernel since 2.6.
const DEFAULT_RECEIVE_COLUMNS: usize = 8;

/// Counters for one direction of an interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDirection {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub drops: u64,
}

impl NetDirection {
    fn parse(fields: &mut SpanReader<'_>) -> Result<Self> {
        Ok(Self {
            bytes: fields.read_u64(Radix::Decimal)?,
            packets: fields.read_u64(Radix::Decimal)?,
            errors: fields.read_u64(Radix::Decimal)?,
            drops: fields.read_u64(Radix::Decimal)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetStatistics {
    pub interface_name: String,
    pub receive: NetDirection,
    pub transmit: NetDirection,
}

impl NetStatistics {
    /// Interfaces of the host network namespace.
    pub fn all(root: &ProcRoot) -> Result<impl Iterator<Item = Result<NetStatistics>>> {
        let reader = FileReader::open(root.path_for("net/dev"), NET_DEV_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader))
    }

    /// Interfaces seen by a process, i.e. of its network namespace.
    pub fn for_process(root: &ProcRoot, pid: u32) -> Result<impl Iterator<Item = Result<NetStatistics>>> {
        let reader = FileReader::open(root.pid_path(pid, "net/dev"), NET_DEV_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader))
    }

    /// Decodes the two header lines, then one record per interface.
    ///
    /// The receive block width is taken from the header, so columns added by
    /// newer kernels are skipped instead of shifting the transmit counters.
    pub fn from_reader<R: AsciiReader>(reader: R) -> impl Iterator<Item = Result<NetStatistics>> {
        let mut receive_columns = None;
        Records::new(reader, move |reader: &mut R| {
            let columns = match receive_columns {
                Some(columns) => columns,
                None => {
                    reader.skip_line()?;
                    let columns = receive_column_count(reader.read_line()?)?;
                    receive_columns = Some(columns);
                    columns
                }
            };
            if reader.end_of_stream() {
                return Ok(None);
            }
            Self::parse_line(reader.read_line()?, columns).map(Some)
        })
    }

    fn parse_line(line: &[u8], receive_columns: usize) -> Result<Self> {
        let mut fields = SpanReader::new(line);
        fields.skip_white_spaces()?;
        let interface_name = String::from_utf8_lossy(fields.read_fragment_by(b':')?).into_owned();
        fields.skip_white_spaces()?;
        let receive = NetDirection::parse(&mut fields)?;
        fields.skip_words(receive_columns.saturating_sub(DECODED_COLUMNS))?;
        let transmit = NetDirection::parse(&mut fields)?;
        Ok(Self {
            interface_name,
            receive,
            transmit,
        })
    }
}

/// Counts the column names between the first and second `|` of
/// ` face |bytes packets ... multicast|bytes ...`.
fn receive_column_count(header: &[u8]) -> Result<usize> {
    let mut header = SpanReader::new(header);
    header.skip_fragment_by(b'|')?;
    let mut columns = SpanReader::new(header.read_fragment_by(b'|')?);
    columns.skip_white_spaces()?;
    let mut count = 0;
    while !columns.end_of_stream() {
        columns.skip_word()?;
        count += 1;
    }
    Ok(if count < DECODED_COLUMNS {
        DEFAULT_RECEIVE_COLUMNS
    } else {
        count
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::testing::FakeProc;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:    1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0: 123456     789    1    2    0     0          0         5   654321     987    3    4    0     0       0          0
";

    #[test]
    fn test_net_dev() {
        let interfaces: Vec<_> = NetStatistics::from_reader(FileReader::new(NET_DEV.as_bytes(), 32))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].interface_name, "lo");

        let eth0 = &interfaces[1];
        assert_eq!(eth0.interface_name, "eth0");
        assert_eq!(
            eth0.receive,
            NetDirection {
                bytes: 123456,
                packets: 789,
                errors: 1,
                drops: 2,
            }
        );
        assert_eq!(
            eth0.transmit,
            NetDirection {
                bytes: 654321,
                packets: 987,
                errors: 3,
                drops: 4,
            }
        );
    }

    #[test]
    fn test_receive_columns_from_header() {
        let header = b" face |bytes    packets errs drop fifo frame compressed multicast|bytes";
        assert_eq!(receive_column_count(header).unwrap(), 8);
        assert_eq!(receive_column_count(b" face |bytes packets errs drop|bytes").unwrap(), 4);
        assert_eq!(receive_column_count(b"garbage").unwrap(), DEFAULT_RECEIVE_COLUMNS);

        let narrow = "Inter-|Receive|Transmit\n face |bytes packets errs drop|bytes packets errs drop\n  eth1: 1 2 3 4 5 6 7 8\n";
        let eth1 = NetStatistics::from_reader(SpanReader::new(narrow.as_bytes()))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(eth1.transmit.bytes, 5);
    }

    #[test]
    fn test_name_glued_to_counter() {
        let content = "a|b\n face |bytes packets errs drop fifo frame compressed multicast|x\n  eth0:12 1 0 0 0 0 0 0 34 2 0 0 0 0 0 0\n";
        let eth0 = NetStatistics::from_reader(SpanReader::new(content.as_bytes()))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(eth0.receive.bytes, 12);
        assert_eq!(eth0.transmit.bytes, 34);
    }

    #[test]
    fn test_header_only() {
        let content = "Inter-|Receive|Transmit\n face |bytes packets errs drop|bytes\n";
        assert_eq!(NetStatistics::from_reader(SpanReader::new(content.as_bytes())).count(), 0);
    }

    #[test]
    fn test_for_process() {
        let proc = FakeProc::new().with_file("42/net/dev", NET_DEV);
        let names: Vec<_> = NetStatistics::for_process(&proc.root(), 42)
            .unwrap()
            .map(|r| r.unwrap().interface_name)
            .collect();
        assert_eq!(names, vec!["lo", "eth0"]);
    }
}
