//! Text helpers shared by the card and text extractors

use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

/// Administrative-region markers of a Japanese address
const REGION_MARKERS: [char; 4] = ['都', '道', '府', '県'];

/// Sub-region markers (ward, city, town, county, village)
const SUBREGION_MARKERS: [char; 5] = ['区', '市', '町', '郡', '村'];

/// Element text with every text node trimmed and concatenated
pub fn compact_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

/// Element text with one trimmed, non-empty text node per line
pub fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the text contains a prefecture marker (都/道/府/県)
pub fn has_region_marker(text: &str) -> bool {
    text.contains(REGION_MARKERS)
}

/// Whether the text contains a municipality marker (区/市/町/郡/村)
pub fn has_subregion_marker(text: &str) -> bool {
    text.contains(SUBREGION_MARKERS)
}

/// Whether the text contains a digit, full-width (`１`) included
pub fn has_digit(text: &str) -> bool {
    text.chars().any(char::is_numeric)
}

/// Full-width digits and decimal point rewritten as ASCII
///
/// `５０．５` → `50.5`; everything else is kept as is.
pub fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '．' => '.',
            other => other,
        })
        .collect()
}

/// Whether the line looks like a street address
pub fn looks_like_address(line: &str) -> bool {
    has_region_marker(line) && has_digit(line) && has_subregion_marker(line)
}

/// Leading run of an address up to the first prefecture marker
///
/// `東京都江東区有明2-1-8` → `東京都`; an address without a marker yields an
/// empty string.
pub fn prefecture_of(address: &str) -> String {
    static PREFECTURE_RE: OnceLock<Regex> = OnceLock::new();

    let re = PREFECTURE_RE
        .get_or_init(|| Regex::new(r"^([^都道府県]*[都道府県])").expect("Invalid regex pattern"));

    re.captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Whether the line is only a number (pagination artifact)
pub fn is_numeric_line(line: &str) -> bool {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

    let re = NUMERIC_RE.get_or_init(|| Regex::new(r"^\d+\s*$").expect("Invalid regex pattern"));

    re.is_match(line)
}

/// Text before the first `/`, trimmed
pub fn before_slash(text: &str) -> &str {
    text.split('/').next().unwrap_or(text).trim()
}
