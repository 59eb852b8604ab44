//! Networking tables under `/proc/net`.

pub mod address;
pub mod arp;
pub mod dev;
pub mod service;

pub use address::{NetEndPoint, NetHardwareAddress, parse_hex_address, parse_human_address};
pub use arp::NetArpEntry;
pub use dev::{NetDirection, NetStatistics};
pub use service::{IpVersion, NetService, NetServiceKind, TcpState};
