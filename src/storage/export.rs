use crate::models::ListingRecord;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<folder>/scraped_<YYYY_MM_DD>.csv`
pub fn export_path(folder: &Path, date: NaiveDate) -> PathBuf {
    folder.join(format!("scraped_{}.csv", date.format("%Y_%m_%d")))
}

/// Write `records` as CSV with a header row, replacing any existing file.
pub fn write_csv(path: &Path, records: &[ListingRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    info!("💾 Exported {} listings to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_export_path_is_dated() {
        assert_eq!(
            export_path(Path::new("data"), date()),
            PathBuf::from("data").join("scraped_2024_03_09.csv")
        );
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = export_path(dir.path(), date());
        let records = vec![
            ListingRecord {
                url: "https://example.com/item/5".to_string(),
                title: "Flat, sunny".to_string(),
                price: "100".to_string(),
                ..ListingRecord::new("example", date())
            },
            ListingRecord::new("other", date()),
        ];

        write_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "source,url,title,price,details,scraped_date");
        assert_eq!(
            lines[1],
            "example,https://example.com/item/5,\"Flat, sunny\",100,,2024-03-09"
        );
        assert_eq!(lines[2], "other,,,,,2024-03-09");
        assert_eq!(lines.len(), 3);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read_back: Vec<ListingRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(read_back, records);
    }
}
