//! Neighbour table from `/proc/net/arp`.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, SpanReader};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::procfs::Records;
use crate::procfs::net::address::{NetHardwareAddress, parse_human_address};

const ARP_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetArpEntry {
    pub address: IpAddr,
    pub hardware_address: NetHardwareAddress,
    pub mask: String,
    pub device: String,
}

impl NetArpEntry {
    pub fn all(root: &ProcRoot) -> Result<impl Iterator<Item = Result<NetArpEntry>>> {
        let reader = FileReader::open(root.path_for("net/arp"), ARP_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader<R: AsciiReader>(reader: R) -> impl Iterator<Item = Result<NetArpEntry>> {
        let mut header_skipped = false;
        Records::new(reader, move |reader: &mut R| {
            if !header_skipped {
                reader.skip_line()?;
                header_skipped = true;
            }
            if reader.end_of_stream() {
                return Ok(None);
            }
            Self::parse_line(reader.read_line()?).map(Some)
        })
    }

    fn parse_line(line: &[u8]) -> Result<Self> {
        let mut fields = SpanReader::new(line);
        let address = parse_human_address(fields.read_word()?)?;
        // HW type and flags
        fields.skip_words(2)?;
        let hardware_address = NetHardwareAddress::parse(fields.read_word()?)?;
        let mask = fields.read_string_word()?;
        let device = fields.read_string_word()?;
        Ok(Self {
            address,
            hardware_address,
            mask,
            device,
        })
    }
}
