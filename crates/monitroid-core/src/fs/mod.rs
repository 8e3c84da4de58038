//! Abstractions for filesystem access so gatherers can be tested without `/proc`.
//!
//! Gatherers that read kernel counters are generic over [`FileSystem`]. In
//! production they use [`RealFs`]; tests feed them fixtures through [`MockFs`].

mod mock;

use std::io;
use std::path::Path;
use std::sync::Arc;

pub use mock::MockFs;

/// Read-only filesystem operations needed by the gatherers.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}
