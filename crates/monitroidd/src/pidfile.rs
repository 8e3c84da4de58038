//! Single-instance enforcement through a PID file.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug)]
pub enum PidFileError {
    /// Another live process owns the PID file.
    AlreadyRunning(i32),
    Read { path: PathBuf, source: io::Error },
    Write { path: PathBuf, source: io::Error },
    Remove { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for PidFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning(pid) => write!(f, "pid is already running: {}", pid),
            Self::Read { path, source } => {
                write!(f, "failed to read PID file {}: {}", path.display(), source)
            }
            Self::Write { path, source } => {
                write!(f, "failed to write PID file {}: {}", path.display(), source)
            }
            Self::Remove { path, source } => {
                write!(f, "failed to remove PID file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PidFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyRunning(_) => None,
            Self::Read { source, .. } | Self::Write { source, .. } | Self::Remove { source, .. } => {
                Some(source)
            }
        }
    }
}

/// PID file owned by this process until [`PidFile::release`] is called.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Claims `path` for the current process.
    ///
    /// Fails if the file names a process that is still alive. A file with
    /// unparsable contents or a dead PID is overwritten.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, PidFileError> {
        let path = path.into();

        match fs::read_to_string(&path) {
            Ok(content) => match content.trim().parse::<i32>() {
                Ok(pid) if is_process_running(pid) => {
                    return Err(PidFileError::AlreadyRunning(pid));
                }
                Ok(pid) => debug!(pid, "removing stale PID file"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to parse PID file"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(PidFileError::Read { path, source }),
        }

        let pid = std::process::id();
        if let Err(source) = fs::write(&path, pid.to_string()) {
            return Err(PidFileError::Write { path, source });
        }
        debug!(pid, path = %path.display(), "PID file acquired");

        Ok(Self { path })
    }

    pub fn release(self) -> Result<(), PidFileError> {
        fs::remove_file(&self.path).map_err(|source| PidFileError::Remove {
            path: self.path.clone(),
            source,
        })
    }
}

fn is_process_running(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    // EPERM means the process exists but belongs to someone else.
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}
