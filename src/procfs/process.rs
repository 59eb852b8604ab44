//! Per-process files: `stat`, `io` and `cmdline`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader};
use crate::buffer::Buffer;
use crate::config::ProcRoot;
use crate::error::{Error, Result};
use crate::sys;

/// `stat` is a single line, usually well below this.
const STAT_ESTIMATED_LEN: usize = 512;
const IO_BUFFER_SIZE: usize = 256;
const CMDLINE_BUFFER_SIZE: usize = 1024;

/// Scheduler state letter of field (3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    Running,
    Sleeping,
    /// Uninterruptible disk sleep.
    Waiting,
    Zombie,
    Stopped,
    TracingStop,
    Dead,
    WakeKill,
    Waking,
    Parked,
    Idle,
    Unknown,
}

impl ProcessState {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'R' => ProcessState::Running,
            b'S' => ProcessState::Sleeping,
            b'D' => ProcessState::Waiting,
            b'Z' => ProcessState::Zombie,
            b'T' => ProcessState::Stopped,
            b't' => ProcessState::TracingStop,
            b'X' | b'x' => ProcessState::Dead,
            b'K' => ProcessState::WakeKill,
            b'W' => ProcessState::Waking,
            b'P' => ProcessState::Parked,
            b'I' => ProcessState::Idle,
            _ => ProcessState::Unknown,
        }
    }
}

/// Fields (1) to (24) of `/proc/[pid]/stat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStat {
    pub pid: i32,
    pub name: String,
    pub state: ProcessState,
    pub parent_pid: i32,
    pub group_id: i32,
    pub session_id: i32,
    pub minor_faults: u64,
    pub major_faults: u64,
    /// Seconds in user mode.
    pub user_time: f64,
    /// Seconds in kernel mode.
    pub kernel_time: f64,
    pub priority: i16,
    pub nice: i16,
    pub thread_count: i32,
    /// Start time in clock ticks after boot.
    pub start_time_ticks: u64,
    /// Bytes.
    pub virtual_memory_size: u64,
    /// Bytes.
    pub resident_set_size: u64,
}

impl ProcessStat {
    pub fn read(root: &ProcRoot, pid: u32) -> Result<Self> {
        Self::read_path(root.pid_path(pid, "stat"))
    }

    /// A thread of `pid`; the layout is the same as for processes.
    pub fn read_task(root: &ProcRoot, pid: u32, tid: u32) -> Result<Self> {
        Self::read_path(root.pid_path(pid, format!("task/{tid}/stat")))
    }

    fn read_path(path: std::path::PathBuf) -> Result<Self> {
        let content = Buffer::from_file(&path, STAT_ESTIMATED_LEN)?;
        trace!(path = %path.display(), len = content.len(), "stat loaded");
        Self::parse(&content, sys::ticks_per_second()?, sys::page_size()?)
    }

    /// Decodes a `stat` line.
    ///
    /// The command name may contain spaces and parentheses, so it is taken
    /// between the first `(` and the last `)`.
    pub fn parse(line: &[u8], ticks_per_second: u64, page_size: u64) -> Result<Self> {
        let (Some(open), Some(close)) = (memchr::memchr(b'(', line), memchr::memrchr(b')', line)) else {
            return Err(Error::NotSupported("stat command name"));
        };
        if close < open {
            return Err(Error::NotSupported("stat command name"));
        }

        let mut head = SpanReader::new(&line[..open]);
        head.skip_white_spaces()?;
        let pid = head.read_i32(Radix::Decimal)?;
        let name = String::from_utf8_lossy(&line[open + 1..close]).into_owned();

        let ticks = ticks_per_second.max(1) as f64;
        let mut fields = SpanReader::new(&line[close + 1..]);
        fields.skip_white_spaces()?;
        let state = ProcessState::from_code(fields.read_word()?.first().copied().unwrap_or(b'?'));
        let parent_pid = fields.read_i32(Radix::Decimal)?;
        let group_id = fields.read_i32(Radix::Decimal)?;
        let session_id = fields.read_i32(Radix::Decimal)?;
        // tty_nr, tpgid, flags
        fields.skip_words(3)?;
        let minor_faults = fields.read_u64(Radix::Decimal)?;
        fields.skip_word()?;
        let major_faults = fields.read_u64(Radix::Decimal)?;
        fields.skip_word()?;
        let user_time = fields.read_u64(Radix::Decimal)? as f64 / ticks;
        let kernel_time = fields.read_u64(Radix::Decimal)? as f64 / ticks;
        // cutime, cstime
        fields.skip_words(2)?;
        let priority = fields.read_i16(Radix::Decimal)?;
        let nice = fields.read_i16(Radix::Decimal)?;
        let thread_count = fields.read_i32(Radix::Decimal)?;
        // itrealvalue
        fields.skip_word()?;
        let start_time_ticks = fields.read_u64(Radix::Decimal)?;
        let virtual_memory_size = fields.read_u64(Radix::Decimal)?;
        let resident_set_size = fields.read_u64(Radix::Decimal)? * page_size;

        Ok(Self {
            pid,
            name,
            state,
            parent_pid,
            group_id,
            session_id,
            minor_faults,
            major_faults,
            user_time,
            kernel_time,
            priority,
            nice,
            thread_count,
            start_time_ticks,
            virtual_memory_size,
            resident_set_size,
        })
    }

    /// Wall-clock start time; `None` if it cannot be represented.
    pub fn start_time(&self, boot_time: DateTime<Utc>, ticks_per_second: u64) -> Option<DateTime<Utc>> {
        let millis = self.start_time_ticks.checked_mul(1000)? / ticks_per_second.max(1);
        boot_time.checked_add_signed(TimeDelta::try_milliseconds(i64::try_from(millis).ok()?)?)
    }
}

/// Counters for one direction of process I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoDirection {
    /// Bytes passed to read/write syscalls, including page cache hits.
    pub characters: u64,
    pub sys_calls: u64,
    /// Bytes that reached the storage layer.
    pub bytes: u64,
}

/// `/proc/[pid]/io`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIo {
    pub read: IoDirection,
    pub write: IoDirection,
}

impl ProcessIo {
    pub fn read(root: &ProcRoot, pid: u32) -> Result<Self> {
        let mut reader = FileReader::open(root.pid_path(pid, "io"), IO_BUFFER_SIZE)?;
        Self::from_reader(&mut reader)
    }

    /// Fixed key order: rchar, wchar, syscr, syscw, read_bytes, write_bytes.
    pub fn from_reader<R: AsciiReader>(reader: &mut R) -> Result<Self> {
        let value = |reader: &mut R| -> Result<u64> {
            reader.skip_word()?;
            reader.read_u64(Radix::Decimal)
        };
        let mut io = Self::default();
        io.read.characters = value(reader)?;
        io.write.characters = value(reader)?;
        io.read.sys_calls = value(reader)?;
        io.write.sys_calls = value(reader)?;
        io.read.bytes = value(reader)?;
        io.write.bytes = value(reader)?;
        Ok(io)
    }
}

/// Command line with NUL separators turned into spaces.
///
/// Empty for kernel threads.
pub fn command_line(root: &ProcRoot, pid: u32) -> Result<String> {
    let mut reader = FileReader::open(root.pid_path(pid, "cmdline"), CMDLINE_BUFFER_SIZE)?;
    Ok(decode_command_line(reader.read_to_end()?))
}

fn decode_command_line(raw: &[u8]) -> String {
    let text: Vec<u8> = raw.iter().map(|&b| if b == 0 { b' ' } else { b }).collect();
    String::from_utf8_lossy(&text).trim().to_string()
}
