//! monitroidctl - prints the current monitroidd snapshot.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde_json::Value;

use monitroid_core::DEFAULT_SOCKET_PATH;

/// Query a running monitroidd.
#[derive(Parser)]
#[command(
    name = "monitroidctl",
    about = "Print the latest monitroidd snapshot",
    version = monitroid_core::VERSION
)]
struct Cli {
    /// Unix socket of the daemon.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH, env = "MONITROID_SOCKET")]
    socket: PathBuf,

    /// Pretty-print the JSON document.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("monitroidctl: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let body = fetch(&cli.socket)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_document(&body, cli.pretty, &mut out)
}

fn fetch(socket: &Path) -> Result<Vec<u8>, String> {
    let mut stream = UnixStream::connect(socket).map_err(|e| {
        format!(
            "failed to connect to the unix socket {}: {}",
            socket.display(),
            e
        )
    })?;

    let mut body = Vec::new();
    stream
        .read_to_end(&mut body)
        .map_err(|e| format!("failed to read a response: {}", e))?;
    Ok(body)
}

fn write_document<W: Write>(body: &[u8], pretty: bool, out: &mut W) -> Result<(), String> {
    if pretty {
        let doc: Value =
            serde_json::from_slice(body).map_err(|e| format!("invalid response: {}", e))?;
        serde_json::to_writer_pretty(&mut *out, &doc)
            .map_err(|e| format!("failed to write output: {}", e))?;
        out.write_all(b"\n")
            .map_err(|e| format!("failed to write output: {}", e))?;
    } else {
        out.write_all(body)
            .map_err(|e| format!("failed to write output: {}", e))?;
    }
    out.flush()
        .map_err(|e| format!("failed to write output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    const DOC: &str = "{\"gatherers\":{\"cpu\":{\"generation\":1,\"ready\":true,\"success\":{\"usage\":0.5},\"error\":null}}}\n";

    #[test]
    fn test_raw_output_is_verbatim() {
        let mut out = Vec::new();
        write_document(DOC.as_bytes(), false, &mut out).unwrap();
        assert_eq!(out, DOC.as_bytes());
    }

    #[test]
    fn test_pretty_output_keeps_field_order() {
        let mut out = Vec::new();
        write_document(DOC.as_bytes(), true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n    \"cpu\": {"));
        assert!(text.find("\"generation\"").unwrap() < text.find("\"error\"").unwrap());
    }

    #[test]
    fn test_pretty_rejects_garbage() {
        let mut out = Vec::new();
        assert!(write_document(b"not json", true, &mut out).is_err());
    }

    #[test]
    fn test_fetch_reads_until_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitroid.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(DOC.as_bytes()).unwrap();
        });

        let body = fetch(&path).unwrap();
        server.join().unwrap();
        assert_eq!(body, DOC.as_bytes());
    }

    #[test]
    fn test_fetch_missing_socket() {
        let err = fetch(Path::new("/nonexistent/monitroid.sock")).unwrap_err();
        assert!(err.contains("failed to connect"));
    }
}
