//! CPU usage gatherer backed by `/proc/stat`.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::{GatherError, Gatherer};
use crate::fs::{FileSystem, RealFs};
use crate::procfs::{CpuStat, parse_cpu_total};

/// Payload reported by [`Cpu`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuStats {
    /// Busy fraction of all CPU time since the previous sample, in `0.0..=1.0`.
    pub usage: f64,
}

/// Samples aggregate CPU utilisation.
///
/// Usage is computed from the delta against the previous sample, so the first
/// sample reports the average since boot.
pub struct Cpu<F: FileSystem = RealFs> {
    fs: F,
    stat_path: PathBuf,
    prev: Mutex<CpuStat>,
}

impl Cpu<RealFs> {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self::with_fs(RealFs::new(), proc_path)
    }
}

impl<F: FileSystem> Cpu<F> {
    pub fn with_fs(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            stat_path: proc_path.into().join("stat"),
            prev: Mutex::new(CpuStat::default()),
        }
    }
}

impl<F: FileSystem + 'static> Gatherer for Cpu<F> {
    type Output = CpuStats;

    fn gather(&self) -> Result<CpuStats, GatherError> {
        let content = self
            .fs
            .read_to_string(&self.stat_path)
            .map_err(|e| GatherError::io(&self.stat_path, e))?;
        let current = parse_cpu_total(&content)?;

        let prev = {
            let mut prev = self.prev.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *prev, current)
        };

        Ok(CpuStats {
            usage: usage_between(&prev, &current),
        })
    }
}

fn usage_between(prev: &CpuStat, current: &CpuStat) -> f64 {
    let total = current.total().saturating_sub(prev.total());
    if total == 0 {
        return 0.0;
    }
    let idle = current.idle_total().saturating_sub(prev.idle_total());
    total.saturating_sub(idle) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFs;
    use std::sync::Arc;

    fn stat_line(user: u64, system: u64, idle: u64, iowait: u64) -> String {
        format!(
            "cpu  {} 0 {} {} {} 0 0 0 0 0\ncpu0 0 0 0 0 0 0 0 0 0 0\n",
            user, system, idle, iowait
        )
    }

    #[test]
    fn test_first_sample_is_since_boot() {
        let fs = Arc::new(MockFs::new());
        fs.add_file("/proc/stat", stat_line(300, 100, 500, 100));

        let cpu = Cpu::with_fs(fs, "/proc");
        let stats = cpu.gather().unwrap();
        assert!((stats.usage - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_usage_uses_delta() {
        let fs = Arc::new(MockFs::new());
        fs.add_file("/proc/stat", stat_line(100, 100, 800, 0));
        let cpu = Cpu::with_fs(fs.clone(), "/proc");
        cpu.gather().unwrap();

        // +150 busy, +50 idle
        fs.add_file("/proc/stat", stat_line(200, 150, 850, 0));
        let stats = cpu.gather().unwrap();
        assert!((stats.usage - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_progress_reports_zero() {
        let fs = Arc::new(MockFs::new());
        fs.add_file("/proc/stat", stat_line(1, 1, 1, 1));
        let cpu = Cpu::with_fs(fs, "/proc");
        cpu.gather().unwrap();
        assert_eq!(cpu.gather().unwrap().usage, 0.0);
    }

    #[test]
    fn test_missing_stat_is_io_error() {
        let cpu = Cpu::with_fs(MockFs::new(), "/proc");
        match cpu.gather() {
            Err(GatherError::Io { path, .. }) => assert_eq!(path, PathBuf::from("/proc/stat")),
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
