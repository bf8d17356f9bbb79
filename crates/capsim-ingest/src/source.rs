//! Metric sources.
//!
//! [`MetricsSource`] is the seam for anything that can produce per-minute
//! table metrics for a time range (a cloud metrics API, a cache of earlier
//! fetches). Credentials and pagination stay inside the implementation.
//! [`JsonDumpSource`] reads the JSON dumps written by [`write_dump`].

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tracing::{debug, warn};

use capsim_core::TableMetricsRecord;

use crate::error::{IngestError, IngestResult};

/// What to fetch: one table's metrics over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRequest {
    pub region: String,
    pub table_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub trait MetricsSource {
    /// Fetch per-minute records for the request, in chronological order.
    fn fetch_metrics(
        &self,
        request: &MetricsRequest,
    ) -> impl Future<Output = IngestResult<Vec<TableMetricsRecord>>> + Send;
}

/// Reads `<region>_<label>_<table>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct JsonDumpSource {
    dir: PathBuf,
    label: String,
}

impl JsonDumpSource {
    /// `label` distinguishes dumps taken from different accounts or
    /// profiles for the same region.
    pub fn new(dir: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            label: label.into(),
        }
    }

    pub fn dump_path(&self, region: &str, table_name: &str) -> PathBuf {
        self.dir
            .join(format!("{region}_{}_{table_name}.json", self.label))
    }
}

impl MetricsSource for JsonDumpSource {
    async fn fetch_metrics(
        &self,
        request: &MetricsRequest,
    ) -> IngestResult<Vec<TableMetricsRecord>> {
        let path = self.dump_path(&request.region, &request.table_name);
        let content = tokio::fs::read_to_string(&path).await?;
        let mut records: Vec<TableMetricsRecord> = serde_json::from_str(&content)
            .map_err(|e| IngestError::MalformedResponse(format!("{}: {e}", path.display())))?;

        records.retain(|r| r.timestamp >= request.start && r.timestamp < request.end);
        records.sort_by_key(|r| r.timestamp);

        debug!(
            path = %path.display(),
            table = %request.table_name,
            records = records.len(),
            "metrics dump loaded"
        );
        Ok(records)
    }
}

/// Write records as a JSON dump readable by [`JsonDumpSource`].
pub async fn write_dump(path: &Path, records: &[TableMetricsRecord]) -> IngestResult<()> {
    let json = serde_json::to_string(records)
        .map_err(|e| IngestError::MalformedResponse(e.to_string()))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn truncate_to_minute(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

/// One record per minute over `[start, end)`, zero-filling minutes the
/// input has no record for. Records outside the range are dropped; when
/// two records fall in the same minute the later one wins.
pub fn fill_minute_gaps(
    records: &[TableMetricsRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<TableMetricsRecord> {
    let start = truncate_to_minute(start);
    let by_minute: BTreeMap<DateTime<Utc>, &TableMetricsRecord> = records
        .iter()
        .map(|r| (truncate_to_minute(r.timestamp), r))
        .collect();

    let mut filled = Vec::new();
    let mut missing = 0usize;
    let mut t = start;
    while t < end {
        match by_minute.get(&t) {
            Some(record) => filled.push(TableMetricsRecord {
                timestamp: t,
                ..(*record).clone()
            }),
            None => {
                missing += 1;
                filled.push(TableMetricsRecord::zeroed(t));
            }
        }
        t += TimeDelta::minutes(1);
    }

    if missing > 0 {
        warn!(missing, total = filled.len(), "zero-filled minutes without metrics");
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, hour, minute, 0).unwrap()
    }

    fn record(timestamp: DateTime<Utc>, consumed_read: f64) -> TableMetricsRecord {
        TableMetricsRecord {
            consumed_read,
            ..TableMetricsRecord::zeroed(timestamp)
        }
    }

    #[test]
    fn fills_missing_minutes_with_zero() {
        let records = vec![record(at(0, 0), 60.0), record(at(0, 3), 120.0)];
        let filled = fill_minute_gaps(&records, at(0, 0), at(0, 5));
        assert_eq!(filled.len(), 5);
        assert_eq!(
            filled.iter().map(|r| r.consumed_read).collect::<Vec<_>>(),
            vec![60.0, 0.0, 0.0, 120.0, 0.0]
        );
        assert_eq!(filled[4].timestamp, at(0, 4));
    }

    #[test]
    fn aligns_records_to_minute() {
        let records = vec![record(at(0, 1) + TimeDelta::seconds(30), 60.0)];
        let filled = fill_minute_gaps(&records, at(0, 0), at(0, 2));
        assert_eq!(filled[1].timestamp, at(0, 1));
        assert_eq!(filled[1].consumed_read, 60.0);
    }

    #[test]
    fn empty_range_is_empty() {
        assert!(fill_minute_gaps(&[], at(1, 0), at(1, 0)).is_empty());
    }

    fn request() -> MetricsRequest {
        MetricsRequest {
            region: "eu-central-1".to_string(),
            table_name: "orders".to_string(),
            start: at(0, 1),
            end: at(0, 3),
        }
    }

    #[tokio::test]
    async fn dump_source_round_trip_filters_range() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDumpSource::new(dir.path(), "prod");
        let path = source.dump_path("eu-central-1", "orders");
        assert!(path.ends_with("eu-central-1_prod_orders.json"));

        let records: Vec<_> = (0..5).rev().map(|m| record(at(0, m), m as f64)).collect();
        write_dump(&path, &records).await.unwrap();

        let fetched = source.fetch_metrics(&request()).await.unwrap();
        assert_eq!(
            fetched.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![at(0, 1), at(0, 2)]
        );
    }

    #[tokio::test]
    async fn dump_missing_fields_is_malformed_response() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDumpSource::new(dir.path(), "prod");
        let path = source.dump_path("eu-central-1", "orders");
        tokio::fs::write(&path, r#"[{"timestamp": "2023-01-02T00:01:00Z"}]"#)
            .await
            .unwrap();

        let err = source.fetch_metrics(&request()).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_dump_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDumpSource::new(dir.path(), "prod");
        let err = source.fetch_metrics(&request()).await.unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
