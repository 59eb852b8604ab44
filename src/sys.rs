//! Thin wrappers over the libc calls the readers need.
//!
//! Everything here is synchronous and blocking. Failures surface as
//! [`Error::SystemCall`] carrying the OS error code; the only retry is on
//! `EINTR`, which is not a failure of the call itself.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::buffer::Buffer;
use crate::error::{Error, Result};

/// Initial guess for symlink targets; doubled until the target fits.
const READ_LINK_INITIAL_SIZE: usize = 256;

/// Access mode for [`Descriptor::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
}

impl Access {
    fn flags(self) -> libc::c_int {
        let mode = match self {
            Access::ReadOnly => libc::O_RDONLY,
            Access::WriteOnly => libc::O_WRONLY,
        };
        mode | libc::O_CLOEXEC
    }
}

fn c_path(path: &Path, call: &'static str) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        Error::system_call(
            call,
            io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"),
        )
    })
}

/// An owned file descriptor, closed on drop.
#[derive(Debug)]
pub struct Descriptor {
    fd: libc::c_int,
}

impl Descriptor {
    pub fn open(path: impl AsRef<Path>, access: Access) -> Result<Self> {
        let path = c_path(path.as_ref(), "open")?;
        loop {
            // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
            let fd = unsafe { libc::open(path.as_ptr(), access.flags()) };
            if fd >= 0 {
                return Ok(Self { fd });
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(Error::system_call("open", err));
            }
        }
    }

    pub fn open_read(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Access::ReadOnly)
    }

    pub fn open_write(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Access::WriteOnly)
    }

    /// Reads up to `buf.len()` bytes. Zero means end of file.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            // SAFETY: the pointer/length pair describes `buf`, which is writable.
            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(Error::system_call("read", err));
            }
        }
    }

    /// Writes up to `buf.len()` bytes and returns how many were accepted.
    pub fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        loop {
            // SAFETY: the pointer/length pair describes `buf`.
            let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(Error::system_call("write", err));
            }
        }
    }

    /// Closes the descriptor, reporting a failed `close`.
    pub fn close(mut self) -> Result<()> {
        let fd = std::mem::replace(&mut self.fd, -1);
        // SAFETY: `fd` is owned by this descriptor and is not used again.
        if unsafe { libc::close(fd) } != 0 {
            return Err(Error::last_os_error("close"));
        }
        Ok(())
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        if self.fd >= 0 {
            // SAFETY: the descriptor is owned and closed exactly once.
            unsafe { libc::close(self.fd) };
        }
    }
}

fn into_io(err: Error) -> io::Error {
    match err {
        Error::SystemCall { source, .. } => source,
        other => io::Error::other(other),
    }
}

impl io::Read for Descriptor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf).map_err(into_io)
    }
}

impl io::Write for Descriptor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_from(buf).map_err(into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reads a symlink target into `target`, growing it until the target fits.
///
/// Returns the number of target bytes; `target.len()` equals it on return.
pub fn read_link_into(path: impl AsRef<Path>, target: &mut Buffer) -> Result<usize> {
    let path = c_path(path.as_ref(), "readlink")?;
    if target.is_empty() {
        target.resize(READ_LINK_INITIAL_SIZE);
    }
    loop {
        // SAFETY: `target` is writable for `target.len()` bytes.
        let n = unsafe {
            libc::readlink(path.as_ptr(), target.as_mut_ptr().cast(), target.len())
        };
        if n < 0 {
            return Err(Error::last_os_error("readlink"));
        }
        let n = n as usize;
        // A completely filled buffer may hold a truncated target.
        if n < target.len() {
            target.resize(n);
            return Ok(n);
        }
        let doubled = target.len() * 2;
        debug!(size = doubled, "symlink target did not fit, retrying");
        target.resize(doubled);
    }
}

/// Reads a symlink target as text.
pub fn read_link(path: impl AsRef<Path>) -> Result<String> {
    let mut target = Buffer::new(READ_LINK_INITIAL_SIZE);
    read_link_into(path, &mut target)?;
    Ok(String::from_utf8_lossy(&target).into_owned())
}

fn sysconf(name: libc::c_int, cache: &OnceLock<u64>) -> Result<u64> {
    if let Some(value) = cache.get() {
        return Ok(*value);
    }
    // SAFETY: sysconf has no memory-safety preconditions.
    let value = unsafe { libc::sysconf(name) };
    if value <= 0 {
        return Err(Error::last_os_error("sysconf"));
    }
    Ok(*cache.get_or_init(|| value as u64))
}

/// Clock ticks per second (`USER_HZ`), fetched once.
pub fn ticks_per_second() -> Result<u64> {
    static TICKS: OnceLock<u64> = OnceLock::new();
    sysconf(libc::_SC_CLK_TCK, &TICKS)
}

/// Memory page size in bytes, fetched once.
pub fn page_size() -> Result<u64> {
    static PAGE_SIZE: OnceLock<u64> = OnceLock::new();
    sysconf(libc::_SC_PAGESIZE, &PAGE_SIZE)
}
