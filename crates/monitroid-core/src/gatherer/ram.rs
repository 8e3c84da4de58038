//! Memory usage gatherer backed by `/proc/meminfo`.

use std::path::PathBuf;

use serde::Serialize;

use super::{GatherError, Gatherer};
use crate::fs::{FileSystem, RealFs};
use crate::procfs::{MemInfo, parse_meminfo};

/// Payload reported by [`Ram`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RamStats {
    /// Used fraction of physical memory, in `0.0..=1.0`.
    pub usage: f64,
    pub total_kb: u64,
    pub used_kb: u64,
}

impl From<&MemInfo> for RamStats {
    fn from(info: &MemInfo) -> Self {
        // Buffers, page cache and inactive anonymous pages count as reclaimable.
        let reclaimable = [info.buffers, info.cached, info.inactive_anon]
            .into_iter()
            .fold(info.mem_free, u64::saturating_add);
        let used_kb = info.mem_total.saturating_sub(reclaimable);
        Self {
            usage: used_kb as f64 / info.mem_total as f64,
            total_kb: info.mem_total,
            used_kb,
        }
    }
}

/// Samples physical memory utilisation.
pub struct Ram<F: FileSystem = RealFs> {
    fs: F,
    meminfo_path: PathBuf,
}

impl Ram<RealFs> {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self::with_fs(RealFs::new(), proc_path)
    }
}

impl<F: FileSystem> Ram<F> {
    pub fn with_fs(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            meminfo_path: proc_path.into().join("meminfo"),
        }
    }
}

impl<F: FileSystem + 'static> Gatherer for Ram<F> {
    type Output = RamStats;

    fn gather(&self) -> Result<RamStats, GatherError> {
        let content = self
            .fs
            .read_to_string(&self.meminfo_path)
            .map_err(|e| GatherError::io(&self.meminfo_path, e))?;
        let info = parse_meminfo(&content)?;
        Ok(RamStats::from(&info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFs;

    #[test]
    fn test_ram_usage() {
        let fs = MockFs::new();
        fs.add_file(
            "/proc/meminfo",
            "MemTotal: 1000 kB\nMemFree: 200 kB\nBuffers: 50 kB\nCached: 100 kB\nInactive(anon): 50 kB\n",
        );

        let stats = Ram::with_fs(fs, "/proc").gather().unwrap();
        assert_eq!(stats.total_kb, 1000);
        assert_eq!(stats.used_kb, 600);
        assert!((stats.usage - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_ram_huge_counters_do_not_overflow() {
        let info = MemInfo {
            mem_total: 1000,
            mem_free: u64::MAX,
            buffers: u64::MAX,
            cached: 1,
            inactive_anon: 1,
        };

        let stats = RamStats::from(&info);
        assert_eq!(stats.used_kb, 0);
        assert_eq!(stats.usage, 0.0);
    }

    #[test]
    fn test_ram_bad_meminfo() {
        let fs = MockFs::new();
        fs.add_file("/proc/meminfo", "garbage\n");

        let err = Ram::with_fs(fs, "/proc").gather().unwrap_err();
        assert!(matches!(err, GatherError::Parse(_)));
    }
}
