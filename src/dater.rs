//! Date-to-block lookup
//!
//! Binary search over block timestamps through the [`LogSource`]. Block
//! timestamps are monotonically non-decreasing, so the first block at or
//! after a target time is well defined. Costs O(log tip) RPC calls.

use crate::error::{QueryError, Result};
use crate::range::DateResolver;
use crate::rpc::LogSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct BlockDater<'a, S: LogSource + ?Sized> {
    source: &'a S,
    tip: u64,
}

impl<'a, S: LogSource + ?Sized> BlockDater<'a, S> {
    pub fn new(source: &'a S, tip: u64) -> Self {
        Self { source, tip }
    }

    async fn timestamp(&self, number: u64) -> Result<i64> {
        match self.source.block_timestamp(number).await? {
            Some(ts) => Ok(ts as i64),
            None => Err(QueryError::new(format!("block {number} has no header")).into()),
        }
    }
}

#[async_trait]
impl<S: LogSource + ?Sized> DateResolver for BlockDater<'_, S> {
    /// With `prefer_earliest` the first block at or after the date is
    /// returned (for `--from`); otherwise the last block at or before it
    /// (for `--to`). `None` when the date falls outside the chain's span on
    /// that side.
    async fn block_for_date(
        &self,
        when: DateTime<Utc>,
        prefer_earliest: bool,
    ) -> Result<Option<u64>> {
        let target = when.timestamp();

        if self.timestamp(self.tip).await? < target {
            // every block predates the target
            return Ok(if prefer_earliest { None } else { Some(self.tip) });
        }

        // lowest block with timestamp >= target
        let mut lo = 0u64;
        let mut hi = self.tip;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.timestamp(mid).await? < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        if prefer_earliest {
            return Ok(Some(lo));
        }

        if self.timestamp(lo).await? == target {
            Ok(Some(lo))
        } else if lo == 0 {
            // chain starts after the target
            Ok(None)
        } else {
            Ok(Some(lo - 1))
        }
    }
}
