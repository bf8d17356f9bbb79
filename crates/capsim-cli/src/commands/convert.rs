use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use capsim_ingest::write_dump;

use super::{InputArgs, load_config, load_records};

/// Re-export input metrics as a JSON dump, e.g. to cache a CSV export
/// for later `--dump-dir` runs.
pub async fn convert(input: &InputArgs, out: &Path) -> Result<()> {
    let config = load_config(None)?;
    let records = load_records(input, &config).await?;
    write_dump(out, &records)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;

    info!(records = records.len(), path = %out.display(), "dump written");
    println!("✓ Wrote {} records to {}", records.len(), out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsim_ingest::{JsonDumpSource, MetricsRequest, MetricsSource};
    use chrono::{TimeDelta, TimeZone, Utc};

    #[tokio::test]
    async fn csv_converts_to_readable_dump() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("export.csv");
        std::fs::write(
            &csv,
            format!(
                "{}2023/01/02 00:00:00,10,600,5,60,0,0\n2023/01/02 00:01:00,10,660,5,60,1,0\n",
                "header\n".repeat(5)
            ),
        )
        .unwrap();

        let source = JsonDumpSource::new(dir.path(), "prod");
        let out = source.dump_path("eu-central-1", "orders");
        let input = InputArgs {
            csv: Some(csv),
            ..Default::default()
        };
        convert(&input, &out).await.unwrap();

        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let fetched = source
            .fetch_metrics(&MetricsRequest {
                region: "eu-central-1".to_string(),
                table_name: "orders".to_string(),
                start,
                end: start + TimeDelta::hours(1),
            })
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[1].consumed_read, 660.0);
        assert_eq!(fetched[1].throttled_reads, 1.0);
    }
}
