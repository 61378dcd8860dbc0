// Core data structures for the EV charger scraper

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::char_prefix;

/// Fault or maintenance notice for one charging facility
///
/// Column names are the Japanese headers of `ev_status_list.csv` and the
/// dashboard `data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "更新日")]
    pub update_date: String,
    #[serde(rename = "施設名")]
    pub facility_name: String,
    #[serde(rename = "都道府県")]
    pub prefecture: String,
    #[serde(rename = "住所")]
    pub address: String,
    #[serde(rename = "種別")]
    pub status_type: StatusType,
    #[serde(rename = "詳細内容")]
    pub detail_content: String,
    #[serde(rename = "充電タイプ", default)]
    pub charge_type: String,
    #[serde(rename = "出力", default)]
    pub output: String,
    #[serde(rename = "充電器数", default)]
    pub charger_count: String,
    #[serde(rename = "メーカー", default)]
    pub maker: String,
    #[serde(rename = "詳細URL")]
    pub detail_url: String,
    #[serde(rename = "緯度", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "経度", default)]
    pub longitude: Option<f64>,
}

impl ListingRecord {
    /// Create a listing with the card fields; detail fields start empty
    pub fn new(facility_name: String, detail_url: String, status_type: StatusType) -> Self {
        Self {
            update_date: String::new(),
            facility_name,
            prefecture: String::new(),
            address: String::new(),
            status_type,
            detail_content: String::new(),
            charge_type: String::new(),
            output: String::new(),
            charger_count: String::new(),
            maker: String::new(),
            detail_url,
            latitude: None,
            longitude: None,
        }
    }

    /// Text handed to the geocoder: address, else prefecture, else facility name
    pub fn geocode_query(&self) -> Option<&str> {
        [&self.address, &self.prefecture, &self.facility_name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .filter(|s| s.chars().count() > 3)
    }

    /// Store coordinates from a successful lookup
    pub fn set_coordinates(&mut self, latitude: f64, longitude: f64) {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
    }
}

/// Kind of listing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    #[serde(rename = "故障")]
    Fault,
    #[serde(rename = "メンテナンス")]
    Maintenance,
}

impl StatusType {
    /// Label written to the `種別` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fault => "故障",
            Self::Maintenance => "メンテナンス",
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user review of a charger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "充電器名")]
    pub charger_name: String,
    #[serde(rename = "充電器住所")]
    pub charger_address: String,
    #[serde(rename = "口コミ内容")]
    pub content: String,
    #[serde(rename = "投稿日時")]
    pub posted_at: String,
    #[serde(rename = "投稿者")]
    pub author: String,
    #[serde(rename = "充電結果", default)]
    pub charging_result: Option<ChargingResult>,
}

/// One usage report copied from a charger's detail table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "充電器名")]
    pub charger_name: String,
    #[serde(rename = "充電器の住所")]
    pub charger_address: String,
    #[serde(rename = "利用日時")]
    pub used_at: String,
    #[serde(rename = "充電タイプ")]
    pub charge_type: String,
    #[serde(rename = "充電結果")]
    pub charging_result: String,
    #[serde(rename = "混雑状況")]
    pub congestion: String,
    #[serde(rename = "車種")]
    pub vehicle: String,
    #[serde(rename = "認証")]
    pub authentication: String,
    #[serde(rename = "充電量")]
    pub energy: String,
    #[serde(rename = "充電時間")]
    pub duration: String,
}

impl UsageRecord {
    /// Table values in column order, used as the body of the dedup key
    pub fn table_values(&self) -> String {
        [
            &self.used_at,
            &self.charge_type,
            &self.charging_result,
            &self.congestion,
            &self.vehicle,
            &self.authentication,
            &self.energy,
            &self.duration,
        ]
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("|")
    }
}

/// Outcome of a charging attempt as derived from free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargingResult {
    #[serde(rename = "充電できた")]
    Success,
    #[serde(rename = "他の車が使用中のため断念")]
    GaveUpInUse,
    #[serde(rename = "その他（確認のみ等）")]
    Other,
    #[serde(rename = "充電できなかった")]
    Failed,
}

impl ChargingResult {
    /// All labels in report order
    pub const ALL: [ChargingResult; 4] = [
        Self::Success,
        Self::GaveUpInUse,
        Self::Other,
        Self::Failed,
    ];

    /// Japanese label written to the `充電結果` column
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "充電できた",
            Self::GaveUpInUse => "他の車が使用中のため断念",
            Self::Other => "その他（確認のみ等）",
            Self::Failed => "充電できなかった",
        }
    }

    /// Parse a label; the half-width parenthesis variant is accepted too
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "充電できた" => Some(Self::Success),
            "他の車が使用中のため断念" => Some(Self::GaveUpInUse),
            "その他（確認のみ等）" | "その他（確認のみ等)" | "その他(確認のみ等)" => {
                Some(Self::Other)
            }
            "充電できなかった" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Parse the snake_case name used in rule tables
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "success" => Some(Self::Success),
            "gave_up_in_use" => Some(Self::GaveUpInUse),
            "other" => Some(Self::Other),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ChargingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite identity of a record: (name, address, body prefix)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub name: String,
    pub address: String,
    pub body_prefix: String,
}

/// Common behaviour of scraped records
pub trait CrawlRecord: Clone + Send + Sync + Serialize + 'static {
    /// CSV header, written even when there are no rows
    const COLUMNS: &'static [&'static str];

    /// Deduplication key with the body cut to `prefix_chars` characters
    fn dedup_key(&self, prefix_chars: usize) -> DedupKey;

    /// Whether the record carries enough data to be emitted
    fn is_meaningful(&self) -> bool;
}

fn key(name: &str, address: &str, body: &str, prefix_chars: usize) -> DedupKey {
    DedupKey {
        name: name.to_string(),
        address: address.to_string(),
        body_prefix: char_prefix(body, prefix_chars).to_string(),
    }
}

impl CrawlRecord for ListingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "更新日",
        "施設名",
        "都道府県",
        "住所",
        "種別",
        "詳細内容",
        "充電タイプ",
        "出力",
        "充電器数",
        "メーカー",
        "詳細URL",
        "緯度",
        "経度",
    ];

    fn dedup_key(&self, prefix_chars: usize) -> DedupKey {
        key(
            &self.facility_name,
            &self.address,
            &self.detail_content,
            prefix_chars,
        )
    }

    fn is_meaningful(&self) -> bool {
        !self.facility_name.is_empty() && !self.detail_url.is_empty()
    }
}

impl CrawlRecord for ReviewRecord {
    const COLUMNS: &'static [&'static str] =
        &["充電器名", "充電器住所", "口コミ内容", "投稿日時", "投稿者", "充電結果"];

    fn dedup_key(&self, prefix_chars: usize) -> DedupKey {
        key(
            &self.charger_name,
            &self.charger_address,
            &self.content,
            prefix_chars,
        )
    }

    fn is_meaningful(&self) -> bool {
        !self.charger_name.is_empty()
            || !self.charger_address.is_empty()
            || !self.content.is_empty()
    }
}

impl CrawlRecord for UsageRecord {
    const COLUMNS: &'static [&'static str] = &[
        "充電器名",
        "充電器の住所",
        "利用日時",
        "充電タイプ",
        "充電結果",
        "混雑状況",
        "車種",
        "認証",
        "充電量",
        "充電時間",
    ];

    fn dedup_key(&self, prefix_chars: usize) -> DedupKey {
        key(
            &self.charger_name,
            &self.charger_address,
            &self.table_values(),
            prefix_chars,
        )
    }

    fn is_meaningful(&self) -> bool {
        !self.charger_name.is_empty() || !self.charger_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charging_result_labels() {
        for result in ChargingResult::ALL {
            assert_eq!(ChargingResult::from_label(result.label()), Some(result));
        }
        assert_eq!(
            ChargingResult::from_label("その他（確認のみ等)"),
            Some(ChargingResult::Other)
        );
        assert_eq!(ChargingResult::from_label("unknown"), None);
    }

    #[test]
    fn test_charging_result_serde_label() {
        let json = serde_json::to_string(&ChargingResult::GaveUpInUse).unwrap();
        assert_eq!(json, "\"他の車が使用中のため断念\"");
    }

    #[test]
    fn test_status_type_serde() {
        assert_eq!(
            serde_json::to_string(&StatusType::Maintenance).unwrap(),
            "\"メンテナンス\""
        );
        assert_eq!(StatusType::Fault.to_string(), "故障");
    }

    #[test]
    fn test_geocode_query_preference() {
        let mut record = ListingRecord::new(
            "イオンモール幕張新都心".into(),
            "https://ev.gogo.gs/detail/1".into(),
            StatusType::Fault,
        );
        assert_eq!(record.geocode_query(), Some("イオンモール幕張新都心"));

        record.prefecture = "千葉県".into();
        assert_eq!(record.geocode_query(), None);

        record.address = "千葉県千葉市美浜区豊砂1-1".into();
        assert_eq!(record.geocode_query(), Some("千葉県千葉市美浜区豊砂1-1"));
    }

    #[test]
    fn test_review_meaningful() {
        let mut review = ReviewRecord::default();
        assert!(!review.is_meaningful());
        review.content = "充電できました".into();
        assert!(review.is_meaningful());
    }

    #[test]
    fn test_usage_key_uses_table_values() {
        let a = UsageRecord {
            charger_name: "日産 東雲店".into(),
            used_at: "2026/01/10 10:00".into(),
            ..Default::default()
        };
        let mut b = a.clone();
        b.used_at = "2026/01/11 10:00".into();
        assert_ne!(a.dedup_key(80), b.dedup_key(80));
    }

    #[test]
    fn test_dedup_key_prefix_is_char_based() {
        let review = ReviewRecord {
            charger_name: "A".into(),
            content: "充電できました。とても快適でした".into(),
            ..Default::default()
        };
        assert_eq!(review.dedup_key(7).body_prefix, "充電できました");
    }
}
