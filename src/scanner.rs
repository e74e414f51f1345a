//! Chunked block-range scanning engine
//!
//! Walks a resolved `[from, to]` range in `by`-sized chunks, queries each
//! chunk through the [`LogSource`] capability, projects raw logs into flat
//! records, and streams them to an [`OutputSink`]. Chunks are disjoint,
//! contiguous, and cover the range exactly; queries run strictly
//! sequentially so sink writes stay block-ascending.

use crate::classify::classify;
use crate::error::{Error, QueryError, Result};
use crate::output::OutputSink;
use crate::range::ResolvedRange;
use crate::rpc::LogSource;
use alloy::rpc::types::{Filter, Log};
use serde_json::Value;
use std::time::Duration;

/// Flat output record; key order is preserved through to the sinks.
pub type Record = serde_json::Map<String, Value>;

/// Running totals for a single scan invocation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanResult {
    pub total_found: u64,
    pub chunks_issued: u64,
    pub last_chunk: Option<(u64, u64)>,
}

/// Per-chunk progress information.
#[derive(Debug, Clone)]
pub struct ChunkProgress {
    pub chunk: u64,
    pub total_chunks: u64,
    pub from: u64,
    pub to: u64,
    pub found: usize,
}

pub type ProgressCallback = Box<dyn Fn(ChunkProgress) + Send + Sync>;

/// Split `[from, to]` into chunks of at most `by` blocks.
///
/// The chunks partition the range: no gaps, no overlaps, and
/// `chunks.len() == ceil((to - from + 1) / by)`. A `by` of zero yields no
/// chunks.
pub fn chunk_ranges(from: u64, to: u64, by: u64) -> Vec<(u64, u64)> {
    let mut chunks = Vec::new();
    if by == 0 {
        return chunks;
    }
    let mut current = from;

    while current <= to {
        let chunk_end = current.saturating_add(by - 1).min(to);
        chunks.push((current, chunk_end));
        if chunk_end == to {
            break;
        }
        current = chunk_end + 1;
    }

    chunks
}

/// The scanning engine. Holds the query capability, the optional
/// inter-chunk delay, and an optional progress callback for the CLI.
pub struct ChunkedScanner<'a, S: LogSource + ?Sized> {
    source: &'a S,
    wait: Option<Duration>,
    progress: Option<ProgressCallback>,
}

impl<'a, S: LogSource + ?Sized> ChunkedScanner<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            wait: None,
            progress: None,
        }
    }

    /// Cooperative delay before each chunk after the first; throttles the
    /// RPC request rate to respect provider limits.
    pub fn with_wait(mut self, wait: Option<Duration>) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ChunkProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Run the scan. On a query, projection, or write failure the remaining
    /// chunks are abandoned (no retry), already-written output is left
    /// intact, and the sink is still finalized so a JSON file closes over
    /// the flushed records.
    pub async fn scan(
        &self,
        filter: &Filter,
        range: &ResolvedRange,
        project: fn(&Log) -> Result<Record>,
        sink: &mut dyn OutputSink,
    ) -> Result<ScanResult> {
        let chunks = chunk_ranges(range.from, range.to, range.by);
        let total_chunks = chunks.len() as u64;

        let mut result = ScanResult::default();
        let mut failure: Option<Error> = None;

        for (i, (query_from, query_to)) in chunks.into_iter().enumerate() {
            if i > 0 {
                if let Some(wait) = self.wait {
                    tokio::time::sleep(wait).await;
                }
            }

            tracing::debug!("querying blocks {} to {}", query_from, query_to);
            result.chunks_issued += 1;

            let events = match self.source.query_filter(filter, query_from, query_to).await {
                Ok(events) => events,
                Err(err) => {
                    let message = classify(&err);
                    tracing::error!("{message}");
                    failure = Some(QueryError::new(message).into());
                    break;
                }
            };

            result.last_chunk = Some((query_from, query_to));
            result.total_found += events.len() as u64;
            tracing::debug!("found {} events", events.len());

            if let Some(callback) = &self.progress {
                callback(ChunkProgress {
                    chunk: i as u64 + 1,
                    total_chunks,
                    from: query_from,
                    to: query_to,
                    found: events.len(),
                });
            }

            if !events.is_empty() {
                if let Err(err) = write_chunk(&events, project, sink) {
                    tracing::error!("{err}");
                    failure = Some(err);
                    break;
                }
            }
        }

        sink.finalize(result.total_found)?;

        match failure {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }
}

fn write_chunk(
    events: &[Log],
    project: fn(&Log) -> Result<Record>,
    sink: &mut dyn OutputSink,
) -> Result<()> {
    let mut records = Vec::with_capacity(events.len());
    for log in events {
        records.push(augment(log, project(log)?));
    }
    sink.write(&records)
}

/// Prepend the origin block number and transaction hash to a projected
/// record, keeping them as the first two columns of any output.
fn augment(log: &Log, projected: Record) -> Record {
    let mut record = Record::new();
    record.insert(
        "block".to_string(),
        Value::from(log.block_number.unwrap_or_default()),
    );
    record.insert(
        "transaction".to_string(),
        Value::String(
            log.transaction_hash
                .map(|h| format!("{h:#x}"))
                .unwrap_or_default(),
        ),
    );
    record.extend(projected);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloy::primitives::{Address, B256, Log as PrimitiveLog, LogData};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn raw_log(block: u64) -> Log {
        Log {
            inner: PrimitiveLog {
                address: Address::ZERO,
                data: LogData::new_unchecked(vec![], Default::default()),
            },
            block_hash: None,
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(0x11)),
            transaction_index: None,
            log_index: None,
            removed: false,
        }
    }

    /// Log source returning one event per queried block, with an optional
    /// failure injected at a given chunk index.
    struct MockSource {
        queried: Mutex<Vec<(u64, u64)>>,
        fail_at_chunk: Option<usize>,
    }

    impl MockSource {
        fn new(fail_at_chunk: Option<usize>) -> Self {
            Self {
                queried: Mutex::new(Vec::new()),
                fail_at_chunk,
            }
        }
    }

    #[async_trait]
    impl LogSource for MockSource {
        async fn query_filter(
            &self,
            _filter: &Filter,
            from: u64,
            to: u64,
        ) -> std::result::Result<Vec<Log>, QueryError> {
            let mut queried = self.queried.lock().unwrap();
            let chunk_index = queried.len();
            queried.push((from, to));
            if self.fail_at_chunk == Some(chunk_index) {
                return Err(QueryError::new("rpc unavailable"));
            }
            Ok((from..=to).map(raw_log).collect())
        }

        async fn block_number(&self) -> std::result::Result<u64, QueryError> {
            Ok(0)
        }

        async fn block_timestamp(
            &self,
            _number: u64,
        ) -> std::result::Result<Option<u64>, QueryError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MockSink {
        batches: Vec<Vec<Record>>,
        finalized_with: Option<u64>,
        fail_writes_after: Option<usize>,
    }

    impl OutputSink for MockSink {
        fn write(&mut self, records: &[Record]) -> Result<()> {
            if self.fail_writes_after == Some(self.batches.len()) {
                return Err(QueryError::new("disk full").into());
            }
            self.batches.push(records.to_vec());
            Ok(())
        }

        fn finalize(&mut self, total_found: u64) -> Result<()> {
            self.finalized_with = Some(total_found);
            Ok(())
        }
    }

    fn project_empty(_: &Log) -> Result<Record> {
        Ok(Record::new())
    }

    fn range(from: u64, to: u64, by: u64) -> ResolvedRange {
        ResolvedRange {
            from,
            to,
            by,
            wait: None,
        }
    }

    #[test]
    fn chunks_partition_the_range() {
        assert_eq!(
            chunk_ranges(0, 100, 30),
            vec![(0, 29), (30, 59), (60, 89), (90, 100)]
        );
        assert!(chunk_ranges(0, 100, 0).is_empty());
        assert_eq!(chunk_ranges(0, 10, 100), vec![(0, 10)]);
        assert_eq!(chunk_ranges(50, 50, 10), vec![(50, 50)]);

        // coverage and count for a spread of shapes
        for (from, to, by) in [(0u64, 99u64, 7u64), (5, 5, 1), (10, 1000, 13), (0, 0, 1)] {
            let chunks = chunk_ranges(from, to, by);
            let span = to - from + 1;
            assert_eq!(chunks.len() as u64, span.div_ceil(by));
            let mut expect = from;
            for (f, t) in &chunks {
                assert_eq!(*f, expect);
                assert!(*t >= *f && *t - *f + 1 <= by);
                expect = t + 1;
            }
            assert_eq!(expect, to + 1);
        }
    }

    #[tokio::test]
    async fn scans_every_block_exactly_once() {
        let source = MockSource::new(None);
        let mut sink = MockSink::default();
        let scanner = ChunkedScanner::new(&source);

        let result = scanner
            .scan(&Filter::new(), &range(0, 99, 25), project_empty, &mut sink)
            .await
            .unwrap();

        assert_eq!(result.total_found, 100);
        assert_eq!(result.chunks_issued, 4);
        assert_eq!(result.last_chunk, Some((75, 99)));
        assert_eq!(
            *source.queried.lock().unwrap(),
            vec![(0, 24), (25, 49), (50, 74), (75, 99)]
        );
        assert_eq!(sink.finalized_with, Some(100));
    }

    #[tokio::test]
    async fn single_block_range_issues_one_chunk() {
        let source = MockSource::new(None);
        let mut sink = MockSink::default();
        let scanner = ChunkedScanner::new(&source);

        let result = scanner
            .scan(&Filter::new(), &range(100, 100, 1), project_empty, &mut sink)
            .await
            .unwrap();

        assert_eq!(*source.queried.lock().unwrap(), vec![(100, 100)]);
        assert_eq!(result.total_found, 1);
    }

    #[tokio::test]
    async fn failure_halts_remaining_chunks_but_keeps_prior_output() {
        // fail on chunk 3 of 5
        let source = MockSource::new(Some(2));
        let mut sink = MockSink::default();
        let scanner = ChunkedScanner::new(&source);

        let err = scanner
            .scan(&Filter::new(), &range(0, 49, 10), project_empty, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Query(_)));
        // chunks 4 and 5 never execute
        assert_eq!(
            *source.queried.lock().unwrap(),
            vec![(0, 9), (10, 19), (20, 29)]
        );
        // output holds exactly chunks 1-2, and the sink was still finalized
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.batches[0].len(), 10);
        assert_eq!(sink.batches[1].len(), 10);
        assert_eq!(sink.finalized_with, Some(20));
    }

    #[tokio::test]
    async fn projection_failure_still_finalizes_the_sink() {
        let source = MockSource::new(None);
        let mut sink = MockSink::default();
        let scanner = ChunkedScanner::new(&source);

        // fails in the second chunk
        fn project_some(log: &Log) -> Result<Record> {
            if log.block_number == Some(15) {
                return Err(QueryError::new("undecodable log").into());
            }
            Ok(Record::new())
        }

        let err = scanner
            .scan(&Filter::new(), &range(0, 19, 10), project_some, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Query(_)));
        // chunk 1's output survives and the sink was still closed
        assert_eq!(sink.batches.len(), 1);
        assert!(sink.finalized_with.is_some());
    }

    #[tokio::test]
    async fn write_failure_still_finalizes_the_sink() {
        let source = MockSource::new(None);
        let mut sink = MockSink {
            fail_writes_after: Some(1),
            ..Default::default()
        };
        let scanner = ChunkedScanner::new(&source);

        let err = scanner
            .scan(&Filter::new(), &range(0, 29, 10), project_empty, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Query(_)));
        assert_eq!(sink.batches.len(), 1);
        assert!(sink.finalized_with.is_some());
    }

    #[tokio::test]
    async fn records_carry_block_and_transaction_first() {
        let source = MockSource::new(None);
        let mut sink = MockSink::default();
        let scanner = ChunkedScanner::new(&source);

        scanner
            .scan(&Filter::new(), &range(7, 7, 1), project_empty, &mut sink)
            .await
            .unwrap();

        let record = &sink.batches[0][0];
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, ["block", "transaction"]);
        assert_eq!(record["block"], Value::from(7));
    }

    #[tokio::test]
    async fn progress_callback_sees_every_chunk() {
        let source = MockSource::new(None);
        let mut sink = MockSink::default();
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let scanner = ChunkedScanner::new(&source).with_progress(move |p: ChunkProgress| {
            seen_clone.lock().unwrap().push((p.chunk, p.total_chunks, p.found));
        });

        scanner
            .scan(&Filter::new(), &range(0, 19, 10), project_empty, &mut sink)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 2, 10), (2, 2, 10)]);
    }
}
