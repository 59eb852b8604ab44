//! Open file descriptors as seen through `/proc/[pid]/fd/N` symlinks.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ascii::{Radix, parser};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::sys;

const SOCKET_PREFIX: &str = "socket:[";
const PIPE_PREFIX: &str = "pipe:[";
const ANON_PREFIX: &str = "anon_inode:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    File,
    Socket,
    Pipe,
    Anon,
}

/// Decoded descriptor target.
///
/// Files and anonymous inodes carry a path (`eventfd`, `[timerfd]` unwrapped
/// to `timerfd`); sockets and pipes carry an inode instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub path: Option<String>,
    pub inode: u64,
}

impl Link {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&sys::read_link(path)?)
    }

    /// Target of descriptor `fd` of process `pid`.
    pub fn read_fd(root: &ProcRoot, pid: u32, fd: u32) -> Result<Self> {
        Self::read(root.pid_path(pid, format!("fd/{fd}")))
    }

    pub fn parse(target: &str) -> Result<Self> {
        if let Some(inode) = bracketed(target, SOCKET_PREFIX) {
            return Self::with_inode(LinkKind::Socket, inode);
        }
        if let Some(inode) = bracketed(target, PIPE_PREFIX) {
            return Self::with_inode(LinkKind::Pipe, inode);
        }
        if let Some(name) = target.strip_prefix(ANON_PREFIX) {
            let name = name
                .strip_prefix('[')
                .and_then(|n| n.strip_suffix(']'))
                .unwrap_or(name);
            return Ok(Self {
                kind: LinkKind::Anon,
                path: Some(name.to_string()),
                inode: 0,
            });
        }
        Ok(Self {
            kind: LinkKind::File,
            path: Some(target.to_string()),
            inode: 0,
        })
    }

    fn with_inode(kind: LinkKind, inode: &str) -> Result<Self> {
        Ok(Self {
            kind,
            path: None,
            inode: parser::parse::<u64>(inode.as_bytes(), Radix::Decimal)?,
        })
    }
}

fn bracketed<'a>(target: &'a str, prefix: &str) -> Option<&'a str> {
    target.strip_prefix(prefix)?.strip_suffix(']')
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.path) {
            (LinkKind::Socket, _) => write!(f, "socket:[{}]", self.inode),
            (LinkKind::Pipe, _) => write!(f, "pipe:[{}]", self.inode),
            (LinkKind::Anon, Some(name)) => write!(f, "anon_inode:[{name}]"),
            (_, path) => f.write_str(path.as_deref().unwrap_or_default()),
        }
    }
}
