//! Unix socket listener streaming one JSON snapshot per connection.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use monitroid_core::supervisor::{Supervisor, SupervisorError};

#[derive(Debug)]
pub enum ServerError {
    RemoveStale { path: PathBuf, source: io::Error },
    Bind { path: PathBuf, source: io::Error },
    Dump(SupervisorError),
    Write(io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoveStale { path, source } => {
                write!(f, "failed to remove unix socket {}: {}", path.display(), source)
            }
            Self::Bind { path, source } => {
                write!(f, "failed to listen on {}: {}", path.display(), source)
            }
            Self::Dump(e) => write!(f, "failed to dump json: {}", e),
            Self::Write(e) => write!(f, "failed to write to the connection: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RemoveStale { source, .. } | Self::Bind { source, .. } => Some(source),
            Self::Dump(e) => Some(e),
            Self::Write(e) => Some(e),
        }
    }
}

/// Binds `path`, replacing a socket left behind by a previous run.
pub fn bind(path: &Path) -> Result<UnixListener, ServerError> {
    remove_socket(path)?;
    UnixListener::bind(path).map_err(|source| ServerError::Bind {
        path: path.to_path_buf(),
        source,
    })
}

/// Removes the socket file; a missing file is not an error.
pub fn remove_socket(path: &Path) -> Result<(), ServerError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ServerError::RemoveStale {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Accepts connections until `shutdown` flips to true.
///
/// Each connection is served on its own task so a slow peer never delays others.
pub async fn serve(
    listener: UnixListener,
    supervisor: Arc<Supervisor>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("accepting connections");

    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let supervisor = supervisor.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle(stream, &supervisor).await {
                            warn!(error = %e, "failed to serve the connection");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "failed to accept the connection"),
            }
        }
    }

    debug!("listener closed");
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn handle(mut stream: UnixStream, supervisor: &Supervisor) -> Result<(), ServerError> {
    let body = supervisor.dump().to_json().map_err(ServerError::Dump)?;
    stream.write_all(&body).await.map_err(ServerError::Write)?;
    stream.shutdown().await.map_err(ServerError::Write)?;
    debug!(bytes = body.len(), "snapshot sent");
    Ok(())
}
