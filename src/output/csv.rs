//! CSV output writer

use crate::error::Result;
use crate::output::OutputSink;
use crate::scanner::Record;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

pub struct CsvSink {
    writer: csv::Writer<File>,
    /// Column names, fixed by the first batch's first record
    columns: Vec<String>,
    header_written: bool,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_writer(File::create(path)?),
            columns: Vec::new(),
            header_written: false,
        })
    }

    fn write_row(&mut self, record: &Record) -> Result<()> {
        let row: Vec<String> = self
            .columns
            .iter()
            .map(|col| record.get(col).map(value_to_string).unwrap_or_default())
            .collect();
        self.writer.write_record(&row)?;
        Ok(())
    }
}

/// Render a JSON value as a bare CSV field (no quoting; the csv writer
/// handles escaping).
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl OutputSink for CsvSink {
    fn write(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if !self.header_written {
            self.columns = records[0].keys().cloned().collect();
            self.writer.write_record(&self.columns)?;
            self.header_written = true;
        }

        for record in records {
            self.write_row(record)?;
        }
        Ok(())
    }

    fn finalize(&mut self, _total_found: u64) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
