//! The `dates` subcommand
//!
//! Takes a CSV produced by a scan, looks up the timestamp of each distinct
//! block, and writes the same CSV with an ISO8601 `date` column inserted
//! after the `block` column.

use crate::cli::Cli;
use crate::config::NetworkConfig;
use crate::error::{ConfigError, QueryError, Result};
use crate::rpc::{LogSource, RpcSource};
use chrono::{DateTime, SecondsFormat};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub async fn run(cli: &Cli, file: &Path, output: Option<&Path>) -> Result<()> {
    let network = NetworkConfig::load(&cli.networks_dir, &cli.network)?;
    let source = RpcSource::connect(&network.rpc)?;
    annotate(file, output, &source).await
}

async fn annotate<S: LogSource + ?Sized>(
    file: &Path,
    output: Option<&Path>,
    source: &S,
) -> Result<()> {
    let mut reader = csv::Reader::from_path(file)?;
    let headers = reader.headers()?.clone();
    let block_idx = headers
        .iter()
        .position(|h| h == "block")
        .ok_or_else(|| ConfigError::MissingColumn("block".to_string()))?;

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    // one timestamp lookup per distinct block
    let mut dates: BTreeMap<u64, String> = BTreeMap::new();
    for row in &rows {
        let number = parse_block(row.get(block_idx).unwrap_or(""), file)?;
        if dates.contains_key(&number) {
            continue;
        }
        let ts = source
            .block_timestamp(number)
            .await?
            .ok_or_else(|| QueryError::new(format!("block {number} has no header")))?;
        dates.insert(number, iso_date(ts));
    }

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let mut header_row: Vec<String> = headers.iter().map(str::to_string).collect();
    header_row.insert(block_idx + 1, "date".to_string());
    writer.write_record(&header_row)?;

    for row in &rows {
        let number = parse_block(row.get(block_idx).unwrap_or(""), file)?;
        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        fields.insert(
            block_idx + 1,
            dates.get(&number).cloned().unwrap_or_default(),
        );
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_block(raw: &str, file: &Path) -> Result<u64> {
    raw.parse().map_err(|_| {
        ConfigError::ParseError(format!("bad block number {raw:?} in {}", file.display())).into()
    })
}

fn iso_date(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloy::rpc::types::{Filter, Log};
    use async_trait::async_trait;

    struct FixedChain;

    #[async_trait]
    impl LogSource for FixedChain {
        async fn query_filter(
            &self,
            _filter: &Filter,
            _from: u64,
            _to: u64,
        ) -> std::result::Result<Vec<Log>, QueryError> {
            Ok(vec![])
        }

        async fn block_number(&self) -> std::result::Result<u64, QueryError> {
            Ok(u64::MAX)
        }

        async fn block_timestamp(
            &self,
            number: u64,
        ) -> std::result::Result<Option<u64>, QueryError> {
            // block n at n * 100 seconds after 2020-01-01T00:00:00Z
            Ok(Some(1_577_836_800 + number * 100))
        }
    }

    #[tokio::test]
    async fn inserts_date_column_after_block() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(
            &input,
            "block,transaction,sponsor\n0,0xaa,0x01\n36,0xbb,0x02\n",
        )
        .unwrap();

        annotate(&input, Some(&output), &FixedChain).await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "block,date,transaction,sponsor");
        assert_eq!(lines[1], "0,2020-01-01T00:00:00Z,0xaa,0x01");
        assert_eq!(lines[2], "36,2020-01-01T01:00:00Z,0xbb,0x02");
    }

    #[tokio::test]
    async fn repeated_blocks_share_one_date() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "block\n7\n7\n").unwrap();

        annotate(&input, Some(&output), &FixedChain).await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[1], lines[2]);
    }

    #[tokio::test]
    async fn missing_block_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "number,transaction\n1,0xaa\n").unwrap();

        let err = annotate(&input, None, &FixedChain).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingColumn(_))));
    }

    #[tokio::test]
    async fn non_numeric_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "block\nabc\n").unwrap();

        let err = annotate(&input, None, &FixedChain).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }
}
