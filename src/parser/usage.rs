//! Usage record listing pages (`/using/{prefecture}`)

use scraper::ElementRef;

use super::fields::FieldTable;
use super::selectors::{CARD, DETAIL_LINK, SMALL_TEXT};
use super::text::{compact_text, has_digit, has_region_marker};
use super::{Extractor, Page, TwoStageExtractor};
use crate::models::{CrawlRecord, UsageRecord};

/// Table labels of a usage report, in column order
pub const USAGE_LABELS: [&str; 8] = [
    "利用日時",
    "充電タイプ",
    "充電結果",
    "混雑状況",
    "車種",
    "認証",
    "充電量",
    "充電時間",
];

const SEPARATOR: &str = "---";

/// Usage extractor with the text fallback when no card yields a record
pub fn usage_extractor(
    window: usize,
) -> TwoStageExtractor<UsageCardExtractor, UsageTextExtractor> {
    TwoStageExtractor::new(UsageCardExtractor, UsageTextExtractor::new(window), 1)
}

fn record_from_table(
    charger_name: String,
    charger_address: String,
    table: &FieldTable,
) -> UsageRecord {
    UsageRecord {
        charger_name,
        charger_address,
        used_at: table.get_or_empty("利用日時"),
        charge_type: table.get_or_empty("充電タイプ"),
        charging_result: table.get_or_empty("充電結果"),
        congestion: table.get_or_empty("混雑状況"),
        vehicle: table.get_or_empty("車種"),
        authentication: table.get_or_empty("認証"),
        energy: table.get_or_empty("充電量"),
        duration: table.get_or_empty("充電時間"),
    }
}

/// Reads usage cards from the DOM
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageCardExtractor;

impl UsageCardExtractor {
    /// Extract one card; `None` when it has neither name nor address
    pub fn extract_card(&self, card: ElementRef<'_>) -> Option<UsageRecord> {
        let link = card.select(&DETAIL_LINK).next();
        let charger_name = link.map(compact_text).unwrap_or_default();

        let mut charger_address = card
            .select(&SMALL_TEXT)
            .map(compact_text)
            .find(|t| has_region_marker(t) && has_digit(t))
            .unwrap_or_default();

        if charger_address.is_empty() {
            if let Some(next) = link.and_then(|l| l.next_siblings().find_map(ElementRef::wrap)) {
                charger_address = compact_text(next);
            }
        }

        let table = FieldTable::collect_first_table(card);
        let record = record_from_table(charger_name, charger_address, &table);

        record.is_meaningful().then_some(record)
    }
}

impl Extractor for UsageCardExtractor {
    type Record = UsageRecord;

    fn name(&self) -> &'static str {
        "usage-cards"
    }

    fn extract(&self, page: &Page) -> Vec<UsageRecord> {
        page.document()
            .select(&CARD)
            .filter_map(|card| self.extract_card(card))
            .collect()
    }
}

/// Re-derives usage records from the flattened page text
///
/// A `name / operator` line opens a record, the next line is its address when
/// it looks like one, and labelled lines after a `---` separator fill the
/// table fields.
#[derive(Debug, Clone)]
pub struct UsageTextExtractor {
    window: usize,
}

impl UsageTextExtractor {
    /// Create a text extractor with a lookahead of `window` lines
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Scan the lines of a page
    pub fn extract_lines(&self, lines: &[String]) -> Vec<UsageRecord> {
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].as_str();
            if !(line.contains('/') && line.chars().count() > 5 && !line.starts_with("http")) {
                i += 1;
                continue;
            }

            let charger_address = lines
                .get(i + 1)
                .filter(|next| has_region_marker(next) && has_digit(next))
                .cloned()
                .unwrap_or_default();

            let end = lines.len().min(i + self.window);
            let (table, resume) = self.read_table(lines, i + 1, end);
            records.push(record_from_table(line.to_string(), charger_address, &table));

            i = resume.max(i + 1);
        }

        records
    }

    /// Find the separator in `start..end` and read the labelled lines after it
    fn read_table(&self, lines: &[String], start: usize, end: usize) -> (FieldTable, usize) {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut k = start;

        while k < end {
            if lines[k] != SEPARATOR {
                k += 1;
                continue;
            }

            k += 1;
            while k < end {
                if let Some(pair) = labelled_value(lines, k) {
                    pairs.push(pair);
                }
                k += 1;
            }
            break;
        }

        (FieldTable::from_pairs(pairs), k)
    }
}

/// Label/value pair of line `k`: `label | value`, `label value`, or a label
/// whose value sits on the next line
fn labelled_value(lines: &[String], k: usize) -> Option<(String, String)> {
    let line = lines[k].as_str();

    if line.contains('|') {
        let mut parts = line.split('|').map(str::trim);
        let label = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        return (!label.is_empty() && !value.is_empty())
            .then(|| (label.to_string(), value.to_string()));
    }

    let label = USAGE_LABELS.iter().find(|label| line.contains(*label))?;
    let idx = line.rfind(label)?;
    let inline = line[idx + label.len()..].trim();
    let value = if inline.is_empty() {
        lines.get(k + 1).cloned().unwrap_or_default()
    } else {
        inline.to_string()
    };

    Some((label.to_string(), value))
}

impl Extractor for UsageTextExtractor {
    type Record = UsageRecord;

    fn name(&self) -> &'static str {
        "usage-text"
    }

    fn extract(&self, page: &Page) -> Vec<UsageRecord> {
        self.extract_lines(page.lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_card_extraction() {
        let page = Page::parse(
            r#"<div class="bg-white border p-3">
                 <a href="/detail/555">日産 東雲店 / 日産自動車</a>
                 <p class="text-sm">東京都江東区東雲1-9-41</p>
                 <table>
                   <tr><th>利用日時</th><td>2026/02/01 10:00</td></tr>
                   <tr><td>充電タイプ</td><td>急速</td></tr>
                   <tr><th>充電結果</th><td>充電できた</td></tr>
                   <tr><th>混雑状況</th><td>空いていた</td></tr>
                   <tr><th>車種</th><td>リーフ</td></tr>
                   <tr><th>認証方法</th><td>カード</td></tr>
                   <tr><th>充電量</th><td>20kWh</td></tr>
                   <tr><th>充電時間</th><td>30分</td></tr>
                 </table>
               </div>"#,
        );

        let records = UsageCardExtractor.extract(&page);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.charger_name, "日産 東雲店 / 日産自動車");
        assert_eq!(r.charger_address, "東京都江東区東雲1-9-41");
        assert_eq!(r.used_at, "2026/02/01 10:00");
        assert_eq!(r.charge_type, "急速");
        assert_eq!(r.charging_result, "充電できた");
        assert_eq!(r.congestion, "空いていた");
        assert_eq!(r.vehicle, "リーフ");
        assert_eq!(r.authentication, "カード");
        assert_eq!(r.energy, "20kWh");
        assert_eq!(r.duration, "30分");
    }

    #[test]
    fn test_card_full_width_address() {
        let page = Page::parse(
            r#"<div class="bg-white border">
                 <a href="/detail/9">ローソン 品川店 / e-Mobility</a>
                 <p class="text-sm">絞り込み</p>
                 <p class="text-sm">東京都品川区大井１－１－１</p>
               </div>"#,
        );
        let card = page.document().select(&CARD).next().unwrap();
        let record = UsageCardExtractor.extract_card(card).unwrap();
        assert_eq!(record.charger_address, "東京都品川区大井１－１－１");
    }

    #[test]
    fn test_card_address_falls_back_to_link_sibling() {
        let page = Page::parse(
            r#"<div class="bg-white border">
                 <a href="/detail/7">道の駅 たまかわ / 福島</a>
                 <span>福島県石川郡玉川村</span>
               </div>"#,
        );
        let records = UsageCardExtractor.extract(&page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].charger_address, "福島県石川郡玉川村");
        assert_eq!(records[0].used_at, "");
    }

    #[test]
    fn test_card_without_name_or_address_is_discarded() {
        let page = Page::parse(r#"<div class="bg-white border"><p>お知らせ</p></div>"#);
        assert!(UsageCardExtractor.extract(&page).is_empty());
    }

    #[test]
    fn test_text_fallback() {
        let lines = lines(
            "
            ファミマ 中野店 / 東京電力
            東京都中野区中野5-1-1
            ---
            利用日時 | 2026/01/05 08:00
            充電タイプ急速
            充電結果
            充電できなかった
            車種 | サクラ
            ローソン 品川店 / e-Mobility
            神奈川県
            ",
        );

        let records = UsageTextExtractor::new(25).extract_lines(&lines);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.charger_name, "ファミマ 中野店 / 東京電力");
        assert_eq!(r.charger_address, "東京都中野区中野5-1-1");
        assert_eq!(r.used_at, "2026/01/05 08:00");
        assert_eq!(r.charge_type, "急速");
        assert_eq!(r.charging_result, "充電できなかった");
        assert_eq!(r.vehicle, "サクラ");
    }

    #[test]
    fn test_text_fallback_without_separator() {
        let lines = lines(
            "
            ファミマ 中野店 / 東京電力
            住所未登録
            ローソン 品川店 / e-Mobility
            東京都品川区大井1-1-1
            ",
        );

        let records = UsageTextExtractor::new(2).extract_lines(&lines);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].charger_address, "");
        assert_eq!(records[1].charger_name, "ローソン 品川店 / e-Mobility");
        assert_eq!(records[1].charger_address, "東京都品川区大井1-1-1");
    }
}
