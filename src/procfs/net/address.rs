//! Address fields as printed by the kernel networking tables.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, Radix, parser};
use crate::error::{FormatError, FormatErrorKind, Result};

const IPV4_HEX_LEN: usize = 8;
const IPV6_HEX_LEN: usize = 32;

/// Parses an address printed as 32-bit words in host byte order, as in
/// `/proc/net/tcp` (`0100007F` is `127.0.0.1` on little-endian hosts).
pub fn parse_hex_address(text: &[u8]) -> Result<IpAddr, FormatError> {
    let word = |chunk: &[u8]| parser::parse::<u32>(chunk, Radix::Hex).map(u32::to_ne_bytes);
    match text.len() {
        IPV4_HEX_LEN => Ok(IpAddr::V4(Ipv4Addr::from(word(text)?))),
        IPV6_HEX_LEN => {
            let mut octets = [0u8; 16];
            for (dst, chunk) in octets.chunks_exact_mut(4).zip(text.chunks_exact(IPV4_HEX_LEN)) {
                dst.copy_from_slice(&word(chunk)?);
            }
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => Err(FormatError::new(text, "IpAddr", FormatErrorKind::InvalidLength)),
    }
}

/// Parses a dotted or colon-separated address, as in `/proc/net/arp`.
pub fn parse_human_address(text: &[u8]) -> Result<IpAddr, FormatError> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| IpAddr::from_str(s).ok())
        .ok_or_else(|| FormatError::new(text, "IpAddr", FormatErrorKind::InvalidDigit))
}

/// Link-layer (MAC) address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetHardwareAddress(pub [u8; 6]);

impl NetHardwareAddress {
    const TEXT_LEN: usize = 17;

    /// Parses `aa:bb:cc:dd:ee:ff`.
    pub fn parse(text: &[u8]) -> Result<Self, FormatError> {
        let invalid = |kind| FormatError::new(text, "NetHardwareAddress", kind);
        if text.len() != Self::TEXT_LEN {
            return Err(invalid(FormatErrorKind::InvalidLength));
        }
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let start = i * 3;
            if i > 0 && text[start - 1] != b':' {
                return Err(invalid(FormatErrorKind::InvalidDigit));
            }
            *octet = parser::parse::<u8>(&text[start..start + 2], Radix::Hex)?;
        }
        Ok(Self(octets))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for NetHardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Address and port of a socket, read from an `ADDRESS:PORT` hex field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetEndPoint {
    pub address: IpAddr,
    pub port: u16,
}

impl NetEndPoint {
    pub fn read<R: AsciiReader + ?Sized>(reader: &mut R) -> Result<Self> {
        let address = parse_hex_address(reader.read_fragment_by(b':')?)?;
        let port = reader.read_int::<u16>(Radix::Hex)?;
        Ok(Self { address, port })
    }

    /// Unspecified address and port 0, as for listening or unbound sockets.
    pub fn is_empty(&self) -> bool {
        self.address.is_unspecified() && self.port == 0
    }
}

impl From<NetEndPoint> for SocketAddr {
    fn from(endpoint: NetEndPoint) -> Self {
        SocketAddr::new(endpoint.address, endpoint.port)
    }
}

impl fmt::Display for NetEndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::SpanReader;

    fn host_words(octets: [u8; 4]) -> String {
        format!("{:08X}", u32::from_ne_bytes(octets))
    }

    #[test]
    fn test_hex_ipv4() {
        let text = host_words([127, 0, 0, 1]);
        assert_eq!(
            parse_hex_address(text.as_bytes()).unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(
            parse_hex_address(b"00000000").unwrap(),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn test_hex_ipv6() {
        let text = format!(
            "{}{}{}{}",
            host_words([0x20, 0x01, 0x0d, 0xb8]),
            host_words([0, 0, 0, 0]),
            host_words([0, 0, 0, 0]),
            host_words([0, 0, 0, 1])
        );
        let expected: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(parse_hex_address(text.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn test_hex_invalid() {
        let err = parse_hex_address(b"0100007").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::InvalidLength);
        let err = parse_hex_address(b"0100007G").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::InvalidDigit);
    }

    #[test]
    fn test_human_address() {
        assert_eq!(
            parse_human_address(b"192.168.1.1").unwrap(),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))
        );
        assert!(parse_human_address(b"fe80::1").unwrap().is_ipv6());
        assert!(parse_human_address(b"300.1.1.1").is_err());
    }

    #[test]
    fn test_hardware_address() {
        let mac = NetHardwareAddress::parse(b"aa:bb:cc:0d:ee:ff").unwrap();
        assert_eq!(mac.0, [0xaa, 0xbb, 0xcc, 0x0d, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "aa:bb:cc:0d:ee:ff");
        assert!(NetHardwareAddress::parse(b"00:00:00:00:00:00").unwrap().is_empty());
        assert!(NetHardwareAddress::parse(b"aa-bb-cc-dd-ee-ff").is_err());
        assert!(NetHardwareAddress::parse(b"aa:bb").is_err());
    }

    #[test]
    fn test_endpoint() {
        let line = format!("{}:0050 00000000:0000", host_words([10, 0, 0, 2]));
        let mut reader = SpanReader::new(line.as_bytes());
        let local = NetEndPoint::read(&mut reader).unwrap();
        assert_eq!(local.to_string(), "10.0.0.2:80");
        assert!(!local.is_empty());
        let remote = NetEndPoint::read(&mut reader).unwrap();
        assert!(remote.is_empty());
        assert!(reader.end_of_stream());
    }
}
