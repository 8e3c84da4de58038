//! monitroid-core — shared library for the monitroid daemon and client.
//!
//! Provides:
//! - `supervisor` — periodic gatherer scheduling, versioned result store,
//!   observers and JSON snapshots
//! - `gatherer` — the `Gatherer` capability and built-in CPU/RAM/disk gatherers
//! - `fs` — filesystem abstraction (real and in-memory)
//! - `procfs` — parsers for `/proc` files used by the gatherers
//! - `util` — helper utilities

pub mod fs;
pub mod gatherer;
pub mod procfs;
pub mod supervisor;
pub mod util;

/// Crate version, shared by the daemon and the client.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default location of the daemon's Unix socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/monitroid.sock";

/// Default location of the daemon's PID file.
pub const DEFAULT_PID_FILE: &str = "/run/monitroid.pid";
