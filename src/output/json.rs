//! Streaming JSON array writer
//!
//! Each batch is serialized and appended as array elements: the first write
//! emits `[` plus the elements, later writes emit `,` plus the elements, and
//! `finalize` emits the closing `]` only if anything was written. A scan
//! with no matches leaves a zero-byte file rather than `[]`. This keeps
//! memory flat no matter how large the scan is; the trade-off is that a file
//! from a run killed before finalize is an unterminated fragment.

use crate::error::Result;
use crate::output::OutputSink;
use crate::scanner::Record;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct JsonSink {
    file: File,
    wrote_any: bool,
}

impl JsonSink {
    /// Creates (or truncates) the file immediately, so even an empty scan
    /// leaves a zero-byte file behind.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            file: File::create(path)?,
            wrote_any: false,
        })
    }
}

impl OutputSink for JsonSink {
    fn write(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let serialized = serde_json::to_string(records)?;
        // strip the wrapping array brackets; we manage them across batches
        let elements = serialized
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(&serialized);

        if self.wrote_any {
            write!(self.file, ",{elements}")?;
        } else {
            write!(self.file, "[{elements}")?;
            self.wrote_any = true;
        }
        Ok(())
    }

    fn finalize(&mut self, _total_found: u64) -> Result<()> {
        if self.wrote_any {
            write!(self.file, "]")?;
        }
        self.file.flush()?;
        Ok(())
    }
}
