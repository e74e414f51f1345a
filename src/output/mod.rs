//! Output sinks
//!
//! Incremental writers with append semantics: the scanner hands each chunk's
//! records to `write` as they arrive, and calls `finalize` once at scan end.
//! A sink is chosen before the scan starts and fixed for its lifetime.

mod csv;
mod json;

pub use csv::CsvSink;
pub use json::JsonSink;

use crate::error::{ConfigError, Result};
use crate::scanner::Record;
use std::path::{Path, PathBuf};

/// Where scan results go.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Console,
    JsonFile(PathBuf),
    CsvFile(PathBuf),
}

impl Destination {
    /// Map an `--output` argument to a destination; `None` means console.
    pub fn from_output_arg(output: Option<&Path>) -> Result<Self> {
        let Some(path) = output else {
            return Ok(Destination::Console);
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Destination::JsonFile(path.to_path_buf())),
            Some("csv") => Ok(Destination::CsvFile(path.to_path_buf())),
            _ => Err(ConfigError::UnsupportedOutput(path.display().to_string()).into()),
        }
    }

    /// Output file path, if any, for the end-of-scan summary.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Console => None,
            Destination::JsonFile(p) | Destination::CsvFile(p) => Some(p),
        }
    }
}

/// Incremental record writer.
pub trait OutputSink {
    /// Append a batch of records. Batches arrive in block-ascending order.
    fn write(&mut self, records: &[Record]) -> Result<()>;

    /// Close any open container syntax. Called exactly once, after the last
    /// write (including after a mid-scan failure).
    fn finalize(&mut self, total_found: u64) -> Result<()>;
}

/// Create the sink for a destination.
pub fn create_sink(destination: &Destination) -> Result<Box<dyn OutputSink>> {
    match destination {
        Destination::Console => Ok(Box::new(ConsoleSink)),
        Destination::JsonFile(path) => Ok(Box::new(JsonSink::create(path)?)),
        Destination::CsvFile(path) => Ok(Box::new(CsvSink::create(path)?)),
    }
}

/// Prints each record to stdout as it arrives; nothing to finalize.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        Ok(())
    }

    fn finalize(&mut self, _total_found: u64) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn output_arg_selects_destination() {
        assert_eq!(
            Destination::from_output_arg(None).unwrap(),
            Destination::Console
        );
        assert!(matches!(
            Destination::from_output_arg(Some(Path::new("out.json"))).unwrap(),
            Destination::JsonFile(_)
        ));
        assert!(matches!(
            Destination::from_output_arg(Some(Path::new("out.csv"))).unwrap(),
            Destination::CsvFile(_)
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Destination::from_output_arg(Some(Path::new("out.txt"))).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnsupportedOutput(_))
        ));
    }
}
