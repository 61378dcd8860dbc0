//! Facility detail pages
//!
//! A detail page is read in two passes. Labelled rows of tables and
//! definition lists come first; whatever is still empty afterwards is guessed
//! from keywords and number patterns in the whole page text.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::fields::FieldTable;
use super::selectors::{DIV, SMALL_TEXT};
use super::text::{ascii_digits, compact_text};
use super::{flatten_lines, Page};
use crate::models::ListingRecord;

lazy_static! {
    static ref OUTPUT_RE: Regex =
        Regex::new(r"(?i)(\d+(?:[.．]\d+)?)\s*[kｋ][wＷ]").expect("Invalid regex pattern");
    static ref PORT_COUNT_RE: Regex = Regex::new(r"(\d+)\s*[口台]").expect("Invalid regex pattern");
}

const ADDRESS_LABELS: [&str; 2] = ["住所", "所在地"];

/// Connector keywords: (any of these in the page text, label)
const CONNECTOR_KEYWORDS: &[(&[&str], &str)] = &[
    (&["CHAdeMO", "チャデモ"], "CHAdeMO"),
    (&["テスラ", "Tesla"], "テスラ"),
    (&["普通充電", "200V"], "普通充電"),
    (&["急速充電"], "急速充電"),
    (&["CCS", "ccs"], "CCS"),
    (&["NACS", "nacs"], "NACS"),
];

/// Manufacturer keywords in priority order
const MAKER_KEYWORDS: &[&str] = &[
    "日産",
    "三菱",
    "パナソニック",
    "東芝",
    "ABB",
    "シーメンス",
    "テスラ",
    "Tesla",
];

/// Attributes read from a facility detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub address: String,
    pub charge_type: String,
    pub output: String,
    pub charger_count: String,
    pub maker: String,
}

impl DetailInfo {
    /// Copy the detail fields onto a listing; a detail address replaces the
    /// card address
    pub fn apply_to(&self, record: &mut ListingRecord) {
        if !self.address.is_empty() {
            record.address = self.address.clone();
        }
        record.charge_type = self.charge_type.clone();
        record.output = self.output.clone();
        record.charger_count = self.charger_count.clone();
        record.maker = self.maker.clone();
    }

    fn slot(&mut self, label: &str) -> Option<&mut String> {
        if (label.contains("住所") || label.contains("所在地")) && self.address.is_empty() {
            Some(&mut self.address)
        } else if (label.contains("出力") || label.contains("kW")) && self.output.is_empty() {
            Some(&mut self.output)
        } else if label.contains("充電器")
            && (label.contains('数') || label.contains('口'))
            && self.charger_count.is_empty()
        {
            Some(&mut self.charger_count)
        } else if (label.contains("メーカー") || label.contains("製造")) && self.maker.is_empty() {
            Some(&mut self.maker)
        } else if label.contains("充電") && label.contains("タイプ") && self.charge_type.is_empty()
        {
            Some(&mut self.charge_type)
        } else {
            None
        }
    }
}

/// Read the detail attributes of a facility page
pub fn extract_detail(page: &Page) -> DetailInfo {
    let document = page.document();
    let mut info = DetailInfo::default();

    if let Some(p) = document.select(&SMALL_TEXT).next() {
        let text = compact_text(p);
        if is_usable_address(&text) {
            info.address = text;
        }
    }
    if info.address.is_empty() {
        info.address = labelled_address(document).unwrap_or_default();
    }

    let table = FieldTable::collect(document.root_element());
    for (label, value) in table.iter() {
        if let Some(slot) = info.slot(label) {
            *slot = value.to_string();
        }
    }

    let page_text = flatten_lines(document.root_element()).join("\n");

    if info.charge_type.is_empty() {
        info.charge_type = connector_types(&page_text);
    }
    if info.output.is_empty() {
        info.output = max_output(&page_text).unwrap_or_default();
    }
    if info.charger_count.is_empty() {
        info.charger_count = max_port_count(&page_text).unwrap_or_default();
    }
    if info.maker.is_empty() {
        info.maker = MAKER_KEYWORDS
            .iter()
            .find(|keyword| page_text.contains(*keyword))
            .map(|keyword| keyword.to_string())
            .unwrap_or_default();
    }

    info
}

fn is_usable_address(text: &str) -> bool {
    text.chars().count() > 5
}

/// Address from a text-only `div` labelled `住所` / `所在地`
///
/// The value follows the label inside the div (`住所：…`) or sits in the
/// next element sibling.
fn labelled_address(document: &Html) -> Option<String> {
    document
        .select(&DIV)
        .filter(|div| div.children().all(|child| child.value().is_text()))
        .filter_map(|div| {
            let text = compact_text(div);
            let label = ADDRESS_LABELS.iter().find(|label| text.contains(*label))?;
            let idx = text.find(label)?;
            let inline = text[idx + label.len()..]
                .trim_start_matches([':', '：', ' ', '　'])
                .to_string();

            if is_usable_address(&inline) {
                return Some(inline);
            }
            div.next_siblings()
                .find_map(ElementRef::wrap)
                .map(compact_text)
                .filter(|sibling| is_usable_address(sibling))
        })
        .next()
}

/// Connector labels mentioned in the text, joined with `、`
fn connector_types(text: &str) -> String {
    CONNECTOR_KEYWORDS
        .iter()
        .filter(|(needles, _)| needles.iter().any(|n| text.contains(n)))
        .map(|(_, label)| *label)
        .collect::<Vec<_>>()
        .join("、")
}

/// Largest `N kW` value, formatted with at least one decimal (`50.0kW`)
fn max_output(text: &str) -> Option<String> {
    let max = OUTPUT_RE
        .captures_iter(text)
        .filter_map(|c| ascii_digits(c.get(1)?.as_str()).parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))?;

    Some(format!("{}kW", format_decimal(max)))
}

/// Largest `N口` / `N台` value
fn max_port_count(text: &str) -> Option<String> {
    PORT_COUNT_RE
        .captures_iter(text)
        .filter_map(|c| ascii_digits(c.get(1)?.as_str()).parse::<u64>().ok())
        .max()
        .map(|n| n.to_string())
}

fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
