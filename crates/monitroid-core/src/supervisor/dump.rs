//! Point-in-time JSON document of every registered gatherer.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::SupervisorError;
use super::result::GatherResult;

/// Snapshot of the result store, shaped as
/// `{"gatherers": {<name>: {"generation", "ready", "success", "error"}}}`.
///
/// Names are emitted in sorted order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dump {
    pub gatherers: BTreeMap<String, GatherResult>,
}

impl Dump {
    /// Writes the document as one line of JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), SupervisorError> {
        serde_json::to_writer(&mut writer, self).map_err(|e| {
            if e.is_io() {
                SupervisorError::Io(e.into())
            } else {
                SupervisorError::Encode(e)
            }
        })?;
        writer.write_all(b"\n").map_err(SupervisorError::Io)?;
        writer.flush().map_err(SupervisorError::Io)
    }

    /// Encodes the document into a buffer, newline included.
    pub fn to_json(&self) -> Result<Vec<u8>, SupervisorError> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        Ok(buf)
    }
}
