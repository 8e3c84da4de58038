//! Disk usage gatherer backed by `statvfs(3)`.

use std::path::PathBuf;

use serde::Serialize;

use super::{GatherError, Gatherer};

/// Payload reported by [`Disk`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskStats {
    /// Used fraction of the filesystem, in `0.0..=1.0`.
    pub usage: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl DiskStats {
    fn from_blocks(fragment_size: u64, blocks: u64, free_blocks: u64) -> Self {
        let total_bytes = blocks.saturating_mul(fragment_size);
        let used_bytes = blocks
            .saturating_sub(free_blocks)
            .saturating_mul(fragment_size);
        let usage = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64
        };
        Self {
            usage,
            total_bytes,
            used_bytes,
        }
    }
}

/// Samples utilisation of the filesystem mounted at `path`.
pub struct Disk {
    path: PathBuf,
}

impl Disk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Gatherer for Disk {
    type Output = DiskStats;

    #[cfg(unix)]
    fn gather(&self) -> Result<DiskStats, GatherError> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(self.path.as_os_str().as_bytes()).map_err(|_| {
            GatherError::other(format!(
                "gatherers: path contains a nul byte: {}",
                self.path.display()
            ))
        })?;

        // SAFETY: c_path is a valid nul-terminated string and stat is a
        // properly sized, writable statvfs struct.
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(GatherError::io(&self.path, std::io::Error::last_os_error()));
        }

        // Field widths differ between platforms.
        #[allow(clippy::unnecessary_cast)]
        let (fragment_size, blocks, free_blocks) = (
            stat.f_frsize as u64,
            stat.f_blocks as u64,
            stat.f_bfree as u64,
        );
        Ok(DiskStats::from_blocks(fragment_size, blocks, free_blocks))
    }

    #[cfg(not(unix))]
    fn gather(&self) -> Result<DiskStats, GatherError> {
        Err(GatherError::other(format!(
            "gatherers: disk usage is not supported on this platform ({})",
            self.path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks() {
        let stats = DiskStats::from_blocks(4096, 1000, 250);
        assert_eq!(stats.total_bytes, 4096 * 1000);
        assert_eq!(stats.used_bytes, 4096 * 750);
        assert!((stats.usage - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_from_blocks_empty_filesystem() {
        let stats = DiskStats::from_blocks(4096, 0, 0);
        assert_eq!(stats.usage, 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_gather_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let stats = Disk::new(dir.path()).gather().unwrap();
        assert!(stats.total_bytes > 0);
        assert!((0.0..=1.0).contains(&stats.usage));
    }

    #[cfg(unix)]
    #[test]
    fn test_gather_missing_path() {
        let err = Disk::new("/nonexistent/monitroid/path").gather().unwrap_err();
        assert!(matches!(err, GatherError::Io { .. }));
    }
}
