//! CSV and JSON output files
//!
//! CSVs are UTF-8 with a byte-order mark so spreadsheet software detects the
//! encoding. Every file is written to `<name>.tmp` first and renamed into
//! place, so readers never see a half-written file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CrawlerError, Result};
use crate::models::CrawlRecord;

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header and rows of a CSV read without a fixed schema
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    /// Index of a column by exact header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn output_error(path: &Path, reason: impl ToString) -> CrawlerError {
    CrawlerError::Output {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Write through a temp file, then rename over `path`
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| output_error(path, e))?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| output_error(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| output_error(path, e))?;
    Ok(())
}

/// Write records as a BOM-prefixed CSV with the record type's header
///
/// The header is written even when `records` is empty.
pub fn write_records<R: CrawlRecord>(path: &Path, records: &[R]) -> Result<usize> {
    write_csv(path, R::COLUMNS, records)?;
    Ok(records.len())
}

/// Write serializable rows under an explicit header
pub fn write_csv<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<()> {
    write_atomic(path, |out| {
        out.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Write a schema-less table
pub fn write_table(path: &Path, table: &CsvTable) -> Result<()> {
    write_atomic(path, |out| {
        out.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(out);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!(path = %path.display(), rows = table.rows.len(), "CSV written");
    Ok(())
}

fn read_without_bom(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = fs::read(path)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    Ok(bytes)
}

/// Read typed records from a CSV, with or without a BOM
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = read_without_bom(path)?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(records)
}

/// Read any CSV as header plus string rows
pub fn read_table(path: &Path) -> Result<CsvTable> {
    let bytes = read_without_bom(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers = reader.headers()?.clone();
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(CsvTable { headers, rows })
}

/// Write a pretty-printed JSON array; non-ASCII text is kept as is
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    write_atomic(path, |out| {
        serde_json::to_writer_pretty(&mut *out, records)?;
        out.write_all(b"\n")?;
        Ok(())
    })?;

    debug!(path = %path.display(), rows = records.len(), "JSON written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChargingResult, ListingRecord, ReviewRecord, StatusType};
    use tempfile::TempDir;

    #[test]
    fn test_csv_has_bom_and_header_when_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reviews.csv");

        write_records::<ReviewRecord>(&path, &[]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(
            text.trim_end(),
            "充電器名,充電器住所,口コミ内容,投稿日時,投稿者,充電結果"
        );
        assert!(!dir.path().join("reviews.csv.tmp").exists());
    }

    #[test]
    fn test_review_round_trip_with_awkward_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/reviews.csv");
        let records = vec![
            ReviewRecord {
                charger_name: "道の駅, 南".into(),
                charger_address: "北海道札幌市".into(),
                content: "1行目\n\"引用\"あり".into(),
                posted_at: "2026年1月2日".into(),
                author: "taro".into(),
                charging_result: Some(ChargingResult::Other),
            },
            ReviewRecord {
                charger_name: "B".into(),
                ..Default::default()
            },
        ];

        write_records(&path, &records).unwrap();
        let restored: Vec<ReviewRecord> = read_records(&path).unwrap();
        assert_eq!(restored, records);
    }

    #[test]
    fn test_listing_round_trip_keeps_status_and_coordinates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ev_status_list.csv");

        let mut fault = ListingRecord::new(
            "イオンモール 幕張".into(),
            "https://ev.gogo.gs/detail/10".into(),
            StatusType::Fault,
        );
        fault.update_date = "2026/02/01".into();
        fault.prefecture = "千葉県".into();
        fault.address = "千葉県千葉市美浜区豊砂1-1".into();
        fault.detail_content = "急速充電器1台が故障中".into();
        fault.charge_type = "CHAdeMO、急速充電".into();
        fault.output = "50.0kW".into();
        fault.charger_count = "2".into();
        fault.maker = "日産".into();
        fault.set_coordinates(35.6486, 140.0342);

        let maintenance = ListingRecord::new(
            "道の駅 たまかわ".into(),
            "https://ev.gogo.gs/detail/11".into(),
            StatusType::Maintenance,
        );

        let records = vec![fault, maintenance];
        write_records(&path, &records).unwrap();

        let table = read_table(&path).unwrap();
        let kind = table.column("種別").unwrap();
        let lat = table.column("緯度").unwrap();
        assert_eq!(&table.rows[0][kind], "故障");
        assert_eq!(&table.rows[1][kind], "メンテナンス");
        assert_eq!(&table.rows[1][lat], "");

        let restored: Vec<ListingRecord> = read_records(&path).unwrap();
        assert_eq!(restored, records);
        assert_eq!(restored[0].latitude, Some(35.6486));
        assert_eq!(restored[1].longitude, None);
    }

    #[test]
    fn test_listing_json_has_null_coordinates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let mut with_coords =
            ListingRecord::new("A".into(), "https://ev.gogo.gs/detail/1".into(), StatusType::Fault);
        with_coords.set_coordinates(35.5, 139.25);
        let without =
            ListingRecord::new("B".into(), "https://ev.gogo.gs/detail/2".into(), StatusType::Maintenance);

        write_json(&path, &[with_coords, without]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["緯度"], 35.5);
        assert_eq!(value[0]["種別"], "故障");
        assert!(value[1]["経度"].is_null());
        assert!(fs::read_to_string(&path).unwrap().contains("メンテナンス"));
    }

    #[test]
    fn test_table_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        let table = CsvTable {
            headers: csv::StringRecord::from(vec!["口コミ内容", "充電結果"]),
            rows: vec![csv::StringRecord::from(vec!["充電できました", "充電できた"])],
        };

        write_table(&path, &table).unwrap();
        let restored = read_table(&path).unwrap();

        assert_eq!(restored.column("充電結果"), Some(1));
        assert_eq!(restored.rows.len(), 1);
        assert_eq!(&restored.rows[0][0], "充電できました");
    }

    #[test]
    fn test_read_without_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.csv");
        fs::write(&path, "口コミ内容\nテスト\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.column("口コミ内容"), Some(0));
    }
}
