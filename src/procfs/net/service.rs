//! Socket tables: `/proc/net/{tcp,udp,raw}[6]` and `/proc/net/unix`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::procfs::Records;
use crate::procfs::net::address::NetEndPoint;

const SOCKETS_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetServiceKind {
    Tcp,
    Udp,
    Raw,
    Unix,
}

impl NetServiceKind {
    fn table(self) -> &'static str {
        match self {
            NetServiceKind::Tcp => "tcp",
            NetServiceKind::Udp => "udp",
            NetServiceKind::Raw => "raw",
            NetServiceKind::Unix => "unix",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

/// TCP connection state, numbered as in the kernel's `tcp_states.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    NewSynRecv,
}

impl TcpState {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => TcpState::Established,
            0x02 => TcpState::SynSent,
            0x03 => TcpState::SynRecv,
            0x04 => TcpState::FinWait1,
            0x05 => TcpState::FinWait2,
            0x06 => TcpState::TimeWait,
            0x07 => TcpState::Close,
            0x08 => TcpState::CloseWait,
            0x09 => TcpState::LastAck,
            0x0A => TcpState::Listen,
            0x0B => TcpState::Closing,
            0x0C => TcpState::NewSynRecv,
            _ => return None,
        })
    }
}

/// One socket of a kernel socket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetService {
    pub kind: NetServiceKind,
    /// `None` for unix sockets.
    pub local: Option<NetEndPoint>,
    pub remote: Option<NetEndPoint>,
    /// Raw `st` column. TCP state for TCP sockets, socket state otherwise.
    pub state: u8,
    /// Owner; not reported for unix sockets.
    pub uid: Option<u32>,
    pub inode: u64,
    /// Bound path of a unix socket, `@`-prefixed when abstract.
    pub path: Option<String>,
}

impl NetService {
    pub fn tcp(root: &ProcRoot, version: IpVersion) -> Result<impl Iterator<Item = Result<NetService>>> {
        Self::open(root, NetServiceKind::Tcp, version)
    }

    pub fn udp(root: &ProcRoot, version: IpVersion) -> Result<impl Iterator<Item = Result<NetService>>> {
        Self::open(root, NetServiceKind::Udp, version)
    }

    pub fn raw(root: &ProcRoot, version: IpVersion) -> Result<impl Iterator<Item = Result<NetService>>> {
        Self::open(root, NetServiceKind::Raw, version)
    }

    pub fn unix(root: &ProcRoot) -> Result<impl Iterator<Item = Result<NetService>>> {
        Self::open(root, NetServiceKind::Unix, IpVersion::V4)
    }

    fn open(
        root: &ProcRoot,
        kind: NetServiceKind,
        version: IpVersion,
    ) -> Result<impl Iterator<Item = Result<NetService>>> {
        let reader = FileReader::open(table_path(root, kind, version), SOCKETS_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader, kind))
    }

    /// Skips the column header, then decodes one socket per line.
    pub fn from_reader<R: AsciiReader>(
        reader: R,
        kind: NetServiceKind,
    ) -> impl Iterator<Item = Result<NetService>> {
        let mut header_skipped = false;
        Records::new(reader, move |reader: &mut R| {
            if !header_skipped {
                reader.skip_line()?;
                header_skipped = true;
            }
            if reader.end_of_stream() {
                return Ok(None);
            }
            let line = reader.read_line()?;
            match kind {
                NetServiceKind::Unix => Self::parse_unix(line).map(Some),
                _ => Self::parse_inet(line, kind).map(Some),
            }
        })
    }

    /// `sl local remote st tx:rx tr:when retrnsmt uid timeout inode ...`
    fn parse_inet(line: &[u8], kind: NetServiceKind) -> Result<Self> {
        let mut fields = SpanReader::new(line);
        fields.skip_white_spaces()?;
        fields.skip_word()?;
        let local = NetEndPoint::read(&mut fields)?;
        let remote = NetEndPoint::read(&mut fields)?;
        let state = fields.read_int::<u8>(Radix::Hex)?;
        fields.skip_words(3)?;
        let uid = fields.read_int::<u32>(Radix::Decimal)?;
        fields.skip_word()?;
        let inode = fields.read_u64(Radix::Decimal)?;
        Ok(Self {
            kind,
            local: Some(local),
            remote: Some(remote),
            state,
            uid: Some(uid),
            inode,
            path: None,
        })
    }

    /// `Num RefCount Protocol Flags Type St Inode [Path]`
    fn parse_unix(line: &[u8]) -> Result<Self> {
        let mut fields = SpanReader::new(line);
        fields.skip_words(5)?;
        let state = fields.read_int::<u8>(Radix::Hex)?;
        let inode = fields.read_u64(Radix::Decimal)?;
        let path = if fields.end_of_stream() {
            None
        } else {
            Some(String::from_utf8_lossy(fields.read_to_end()?).into_owned())
        };
        Ok(Self {
            kind: NetServiceKind::Unix,
            local: None,
            remote: None,
            state,
            uid: None,
            inode,
            path,
        })
    }

    /// Decoded TCP state; `None` for other protocols.
    pub fn tcp_state(&self) -> Option<TcpState> {
        match self.kind {
            NetServiceKind::Tcp => TcpState::from_code(self.state),
            _ => None,
        }
    }
}

fn table_path(root: &ProcRoot, kind: NetServiceKind, version: IpVersion) -> PathBuf {
    let table = match (kind, version) {
        (NetServiceKind::Unix, _) | (_, IpVersion::V4) => kind.table().to_string(),
        (_, IpVersion::V6) => format!("{}6", kind.table()),
    };
    root.path_for("net").join(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::testing::FakeProc;

    fn host_words(octets: [u8; 4]) -> String {
        format!("{:08X}", u32::from_ne_bytes(octets))
    }

    fn tcp_table() -> String {
        let header = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n";
        let listen = format!(
            "   0: {}:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345 1 0000000000000000 100 0 0 10 0\n",
            host_words([127, 0, 0, 1])
        );
        let established = format!(
            "   1: {}:D431 {}:01BB 01 00000000:00000000 02:000A7B2C 00000000  1000        0 67890 2 0000000000000000 20 4 30 10 -1\n",
            host_words([192, 168, 1, 10]),
            host_words([93, 184, 216, 34])
        );
        format!("{header}{listen}{established}")
    }

    #[test]
    fn test_tcp() {
        let proc = FakeProc::new().with_file("net/tcp", &tcp_table());
        let sockets: Vec<_> = NetService::tcp(&proc.root(), IpVersion::V4)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(sockets.len(), 2);

        let listen = &sockets[0];
        assert_eq!(listen.local.unwrap().to_string(), "127.0.0.1:22");
        assert!(listen.remote.unwrap().is_empty());
        assert_eq!(listen.tcp_state(), Some(TcpState::Listen));
        assert_eq!(listen.uid, Some(0));
        assert_eq!(listen.inode, 12345);

        let established = &sockets[1];
        assert_eq!(established.local.unwrap().to_string(), "192.168.1.10:54321");
        assert_eq!(established.remote.unwrap().to_string(), "93.184.216.34:443");
        assert_eq!(established.tcp_state(), Some(TcpState::Established));
        assert_eq!(established.uid, Some(1000));
        assert_eq!(established.inode, 67890);
    }

    #[test]
    fn test_tcp6() {
        let address = format!(
            "{}{}{}{}",
            host_words([0, 0, 0, 0]),
            host_words([0, 0, 0, 0]),
            host_words([0, 0, 0, 0]),
            host_words([0, 0, 0, 1])
        );
        let content = format!(
            "  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n   0: {address}:1F90 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000   100        0 555 1 0000000000000000 100 0 0 10 0\n"
        );
        let proc = FakeProc::new().with_file("net/tcp6", &content);
        let socket = NetService::tcp(&proc.root(), IpVersion::V6)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(socket.local.unwrap().to_string(), "[::1]:8080");
        assert_eq!(socket.inode, 555);
    }

    #[test]
    fn test_udp_has_no_tcp_state() {
        let content = tcp_table();
        let socket = NetService::from_reader(SpanReader::new(content.as_bytes()), NetServiceKind::Udp)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(socket.kind, NetServiceKind::Udp);
        assert_eq!(socket.state, 0x0A);
        assert_eq!(socket.tcp_state(), None);
    }

    #[test]
    fn test_unix() {
        let content = "\
Num       RefCount Protocol Flags    Type St Inode Path
0000000000000000: 00000002 00000000 00010000 0001 01 12345 /run/systemd/notify
0000000000000000: 00000003 00000000 00000000 0001 03 23456
0000000000000000: 00000002 00000000 00010000 0002 01 34567 @/tmp/.X11-unix/X0
";
        let proc = FakeProc::new().with_file("net/unix", content);
        let sockets: Vec<_> = NetService::unix(&proc.root())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(sockets.len(), 3);
        assert_eq!(sockets[0].path.as_deref(), Some("/run/systemd/notify"));
        assert_eq!(sockets[0].state, 1);
        assert_eq!(sockets[1].path, None);
        assert_eq!(sockets[1].inode, 23456);
        assert_eq!(sockets[2].path.as_deref(), Some("@/tmp/.X11-unix/X0"));
        assert!(sockets.iter().all(|s| s.local.is_none() && s.uid.is_none()));
    }

    #[test]
    fn test_table_paths() {
        let root = ProcRoot::new("/proc");
        assert_eq!(
            table_path(&root, NetServiceKind::Raw, IpVersion::V6),
            PathBuf::from("/proc/net/raw6")
        );
        assert_eq!(
            table_path(&root, NetServiceKind::Unix, IpVersion::V6),
            PathBuf::from("/proc/net/unix")
        );
    }
}
