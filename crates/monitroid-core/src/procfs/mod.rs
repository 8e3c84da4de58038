//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions over file contents so they can be tested with
//! string fixtures.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub buffers: u64,
    pub cached: u64,
    pub inactive_anon: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Fails when `MemTotal` is missing or zero, since every usage ratio divides by it.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        match key.trim() {
            "MemTotal" => info.mem_total = value,
            "MemFree" => info.mem_free = value,
            "Buffers" => info.buffers = value,
            "Cached" => info.cached = value,
            "Inactive(anon)" => info.inactive_anon = value,
            _ => {}
        }
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("MemTotal missing or zero in meminfo"));
    }

    Ok(info)
}

/// Aggregate CPU time counters from the `cpu` line of `/proc/stat`, in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Ticks spent waiting: idle plus iowait.
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// All ticks accounted for by the counters above.
    pub fn total(&self) -> u64 {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(self.user, u64::saturating_add)
    }
}

/// Parses the aggregate `cpu` line from `/proc/stat` content.
///
/// Per-core `cpuN` lines are ignored. Kernels older than 2.6.11 omit `steal`;
/// missing trailing columns read as zero.
pub fn parse_cpu_total(content: &str) -> Result<CpuStat, ParseError> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line in stat"))?;

    let parts: Vec<&str> = line.split_whitespace().skip(1).collect();
    if parts.len() < 4 {
        return Err(ParseError::new(format!(
            "not enough fields in cpu line: expected 4+, got {}",
            parts.len()
        )));
    }

    let get_val = |idx: usize, name: &str| -> Result<u64, ParseError> {
        match parts.get(idx) {
            Some(s) => s
                .parse()
                .map_err(|_| ParseError::new(format!("invalid {}", name))),
            None => Ok(0),
        }
    };

    Ok(CpuStat {
        user: get_val(0, "user")?,
        nice: get_val(1, "nice")?,
        system: get_val(2, "system")?,
        idle: get_val(3, "idle")?,
        iowait: get_val(4, "iowait")?,
        irq: get_val(5, "irq")?,
        softirq: get_val(6, "softirq")?,
        steal: get_val(7, "steal")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12288000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:        10000 kB
Active:          4096000 kB
Inactive:        2048000 kB
Active(anon):    1000000 kB
Inactive(anon):   256000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, 8192000);
        assert_eq!(info.buffers, 512000);
        assert_eq!(info.cached, 2048000);
        assert_eq!(info.inactive_anon, 256000);
    }

    #[test]
    fn test_parse_meminfo_without_total() {
        let err = parse_meminfo("MemFree: 100 kB\n").unwrap_err();
        assert!(err.message.contains("MemTotal"));
    }

    #[test]
    fn test_parse_cpu_total() {
        let content = "\
cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
intr 1462898 0 0 0
ctxt 2255534
btime 1700000000
";
        let stat = parse_cpu_total(content).unwrap();

        assert_eq!(stat.user, 10132153);
        assert_eq!(stat.nice, 290696);
        assert_eq!(stat.system, 3084719);
        assert_eq!(stat.idle, 46828483);
        assert_eq!(stat.iowait, 16683);
        assert_eq!(stat.softirq, 25195);
        assert_eq!(stat.idle_total(), 46828483 + 16683);
        assert_eq!(
            stat.total(),
            10132153 + 290696 + 3084719 + 46828483 + 16683 + 25195
        );
    }

    #[test]
    fn test_parse_cpu_total_short_line() {
        let stat = parse_cpu_total("cpu 1 2 3 4\n").unwrap();
        assert_eq!(stat.idle, 4);
        assert_eq!(stat.iowait, 0);
        assert_eq!(stat.steal, 0);
    }

    #[test]
    fn test_cpu_totals_saturate() {
        let line = format!("cpu {0} {0} {0} {0} {0} {0} {0} {0}\n", u64::MAX);
        let stat = parse_cpu_total(&line).unwrap();
        assert_eq!(stat.idle_total(), u64::MAX);
        assert_eq!(stat.total(), u64::MAX);
    }

    #[test]
    fn test_parse_cpu_total_errors() {
        assert!(parse_cpu_total("cpu0 1 2 3 4\n").is_err());
        assert!(parse_cpu_total("cpu 1 2\n").is_err());
        assert!(parse_cpu_total("cpu 1 x 3 4\n").is_err());
    }
}
