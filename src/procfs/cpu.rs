//! Per-CPU time accounting from `/proc/stat`.

use serde::{Deserialize, Serialize};

use crate::ascii::{AsciiReader, AsciiReaderExt, FileReader, Radix, SpanReader, parser};
use crate::config::ProcRoot;
use crate::error::Result;
use crate::procfs::Records;
use crate::sys;

const STAT_BUFFER_SIZE: usize = 4096;
const CPU_PREFIX: &[u8] = b"cpu";

/// Time spent by one CPU (or all of them) in each mode since boot.
///
/// All times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuStatistics {
    /// Core number; `None` for the aggregate `cpu` line.
    pub cpu_number: Option<u16>,
    pub user_time: f64,
    pub nice_time: f64,
    pub kernel_time: f64,
    pub idle_time: f64,
    pub iowait_time: f64,
    pub irq_time: f64,
    pub soft_irq_time: f64,
}

impl CpuStatistics {
    /// Reads the aggregate line followed by one record per core.
    pub fn all(root: &ProcRoot) -> Result<impl Iterator<Item = Result<CpuStatistics>>> {
        let ticks_per_second = sys::ticks_per_second()?;
        let reader = FileReader::open(root.path_for("stat"), STAT_BUFFER_SIZE)?;
        Ok(Self::from_reader(reader, ticks_per_second))
    }

    /// Decodes `cpu` lines until the first line of another kind.
    pub fn from_reader<R: AsciiReader>(
        reader: R,
        ticks_per_second: u64,
    ) -> impl Iterator<Item = Result<CpuStatistics>> {
        Records::new(reader, move |reader: &mut R| {
            if reader.end_of_stream() {
                return Ok(None);
            }
            Self::parse_line(reader.read_line()?, ticks_per_second)
        })
    }

    fn parse_line(line: &[u8], ticks_per_second: u64) -> Result<Option<Self>> {
        let mut fields = SpanReader::new(line);
        let cpu_number = {
            let name = fields.read_word()?;
            let Some(suffix) = name.strip_prefix(CPU_PREFIX) else {
                return Ok(None);
            };
            if suffix.is_empty() {
                None
            } else {
                parser::try_parse::<u16>(suffix, Radix::Decimal)
            }
        };

        let ticks = ticks_per_second.max(1) as f64;
        let mut seconds = || -> Result<f64> { Ok(fields.read_u64(Radix::Decimal)? as f64 / ticks) };

        Ok(Some(Self {
            cpu_number,
            user_time: seconds()?,
            nice_time: seconds()?,
            kernel_time: seconds()?,
            idle_time: seconds()?,
            iowait_time: seconds()?,
            irq_time: seconds()?,
            soft_irq_time: seconds()?,
        }))
    }
}
