//! procfs-core - incremental parsing of Linux `/proc` files.
//!
//! The crate is built in two layers:
//! - `ascii`, `buffer`, `sys` - a zero-copy tokenizer that streams kernel
//!   text through pooled buffers using raw descriptors.
//! - `procfs` - decoders turning individual `/proc` files into typed records
//!   (CPU, memory, disks, network, processes, descriptor links).

pub mod ascii;
pub mod buffer;
pub mod config;
pub mod error;
pub mod procfs;
pub mod sys;

pub use config::ProcRoot;
pub use error::{Error, FormatError, FormatErrorKind, Result};
