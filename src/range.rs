//! Block-range resolution
//!
//! Turns the user's `--from`/`--to`/`--by`/`--wait` inputs into a concrete,
//! validated `[from, to]` block range and chunk size. Bounds may be given as
//! absolute block numbers, negative offsets, ISO8601 dates, or `latest`.

use crate::error::{NotFoundError, RangeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::str::FromStr;
use std::time::Duration;

/// One bound of a block range, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockRef {
    /// Absolute block number, or a negative offset when below zero
    Number(i64),
    /// The chain tip at resolution time
    Latest,
    /// An ISO8601 date/time, resolved through a [`DateResolver`]
    Date(DateTime<Utc>),
}

impl FromStr for BlockRef {
    type Err = RangeError;

    /// Numeric strings always parse as block numbers or offsets before any
    /// date interpretation is attempted; this keeps negative offsets like
    /// `-5000` out of the date parser.
    fn from_str(s: &str) -> std::result::Result<Self, RangeError> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(BlockRef::Latest);
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(BlockRef::Number(n));
        }
        parse_iso8601(s)
            .map(BlockRef::Date)
            .ok_or_else(|| RangeError::InvalidBound(s.to_string()))
    }
}

fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// The raw range request, as parsed from the CLI.
#[derive(Debug, Clone)]
pub struct RangeSpec {
    pub from: BlockRef,
    pub to: BlockRef,
    /// Blocks per query; defaults to the whole range (one chunk)
    pub by: Option<i64>,
    /// Seconds to wait between queries
    pub wait: Option<f64>,
}

/// A fully resolved, validated scan range.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    pub from: u64,
    pub to: u64,
    pub by: u64,
    pub wait: Option<Duration>,
}

/// Date-to-block lookup capability.
///
/// Returns `None` when no block satisfies the date constraint.
#[async_trait]
pub trait DateResolver {
    async fn block_for_date(
        &self,
        when: DateTime<Utc>,
        prefer_earliest: bool,
    ) -> Result<Option<u64>>;
}

/// Resolve a [`RangeSpec`] against the current chain tip.
///
/// `to` resolves first so that a negative `from` can offset from the end of
/// the range. Date bounds use `prefer_earliest = true` for `from` and
/// `false` for `to`.
pub async fn resolve<D: DateResolver + ?Sized>(
    spec: &RangeSpec,
    current_block: u64,
    dates: &D,
) -> Result<ResolvedRange> {
    let tip = i64::try_from(current_block)
        .map_err(|_| RangeError::InvalidBound(current_block.to_string()))?;

    let mut to = match &spec.to {
        BlockRef::Latest => tip,
        BlockRef::Number(n) => *n,
        BlockRef::Date(d) => lookup(dates, *d, false).await?,
    };
    if to < 0 {
        if -to > tip {
            return Err(RangeError::OffsetBeyondTip {
                offset: to,
                tip: current_block,
            }
            .into());
        }
        to += tip;
    }

    let mut from = match &spec.from {
        BlockRef::Latest => tip,
        BlockRef::Number(n) => *n,
        BlockRef::Date(d) => lookup(dates, *d, true).await?,
    };
    if from < 0 {
        if -from > to {
            return Err(RangeError::OffsetBeyondEnd {
                offset: from,
                end: to as u64,
            }
            .into());
        }
        from += to;
    }

    if from < 0 || to < from {
        return Err(RangeError::EmptyRange { from, to }.into());
    }

    let by = spec.by.unwrap_or(to - from + 1);
    if by <= 0 {
        return Err(RangeError::NonPositiveChunk(by).into());
    }

    let wait = match spec.wait {
        Some(w) if w <= 0.0 => return Err(RangeError::NonPositiveWait(w).into()),
        // rejects NaN and values beyond what a Duration can hold
        Some(w) => Some(Duration::try_from_secs_f64(w).map_err(|_| RangeError::InvalidWait(w))?),
        None => None,
    };

    Ok(ResolvedRange {
        from: from as u64,
        to: to as u64,
        by: by as u64,
        wait,
    })
}

async fn lookup<D: DateResolver + ?Sized>(
    dates: &D,
    when: DateTime<Utc>,
    prefer_earliest: bool,
) -> Result<i64> {
    match dates.block_for_date(when, prefer_earliest).await? {
        Some(block) => {
            tracing::info!(
                "using block {} for date/time {}",
                block,
                when.to_rfc3339()
            );
            i64::try_from(block).map_err(|_| RangeError::InvalidBound(block.to_string()).into())
        }
        None => Err(NotFoundError::BlockForDate(when.to_rfc3339()).into()),
    }
}
