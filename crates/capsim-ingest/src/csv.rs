//! CloudWatch CSV export parsing.
//!
//! The export starts with [`HEADER_LINES`] lines of metadata and headers,
//! followed by one row per minute:
//!
//! ```text
//! datetime, provisionedReadAvg, consumedRead, provisionedWriteAvg,
//! consumedWrite, readThrottles, writeThrottles
//! ```
//!
//! Datetimes are UTC. Empty cells read as zero and every value is
//! rounded to a whole unit.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use capsim_core::TableMetricsRecord;

use crate::error::{IngestError, IngestResult};

/// Lines of metadata and headers preceding the data.
pub const HEADER_LINES: usize = 5;

const COLUMNS: usize = 7;

const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

pub fn read_csv(path: &Path) -> IngestResult<Vec<TableMetricsRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_csv(&content)?;
    debug!(path = %path.display(), rows = records.len(), "csv export loaded");
    Ok(records)
}

pub fn parse_csv(content: &str) -> IngestResult<Vec<TableMetricsRecord>> {
    content
        .lines()
        .enumerate()
        .skip(HEADER_LINES)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index + 1, line))
        .collect()
}

fn parse_row(line: usize, row: &str) -> IngestResult<TableMetricsRecord> {
    let cells: Vec<&str> = row.split(',').map(unquote).collect();
    if cells.len() < COLUMNS {
        return Err(IngestError::MalformedRow {
            line,
            reason: format!("expected {COLUMNS} columns, found {}", cells.len()),
        });
    }

    let timestamp = parse_timestamp(cells[0]).ok_or_else(|| IngestError::InvalidTimestamp {
        line,
        value: cells[0].to_string(),
    })?;
    let value = |column: usize| {
        parse_units(cells[column]).map_err(|reason| IngestError::MalformedRow { line, reason })
    };

    Ok(TableMetricsRecord {
        timestamp,
        provisioned_read: value(1)?,
        consumed_read: value(2)?,
        provisioned_write: value(3)?,
        consumed_write: value(4)?,
        throttled_reads: value(5)?,
        throttled_writes: value(6)?,
    })
}

fn unquote(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_units(cell: &str) -> Result<f64, String> {
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>()
        .map(f64::round)
        .map_err(|_| format!("invalid number {cell:?}"))
}
