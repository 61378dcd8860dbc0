//! Fault and maintenance listing cards

use scraper::ElementRef;
use tracing::warn;
use url::Url;

use super::selectors::{
    BOLD_LINK, GRID, INFO_SECTION, LISTING_ADDRESS, LISTING_CARD, PARAGRAPH, STATUS_HEADING,
};
use super::text::{compact_text, prefecture_of};
use super::{Extractor, Page};
use crate::models::{ListingRecord, StatusType};
use crate::utils::error::ParseError;

/// Card extractor for `/accident` and `/maintenance`
///
/// Listings have no text fallback: a record needs the detail link, which the
/// flattened text cannot provide.
pub struct ListingExtractor {
    base: Url,
    status_type: StatusType,
}

impl ListingExtractor {
    /// Create an extractor resolving detail links against `base_url`
    pub fn new(base_url: &str, status_type: StatusType) -> Result<Self, ParseError> {
        let base = Url::parse(base_url)
            .map_err(|e| ParseError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self { base, status_type })
    }

    /// Extract one card
    ///
    /// Cards without a bold facility link or without its `href` are not
    /// listings and yield `Ok(None)`.
    pub fn extract_card(&self, card: ElementRef<'_>) -> Result<Option<ListingRecord>, ParseError> {
        let Some(link) = card.select(&BOLD_LINK).next() else {
            return Ok(None);
        };

        let facility_name = compact_text(link);
        let href = link.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() {
            return Ok(None);
        }

        let detail_url = self
            .base
            .join(href)
            .map_err(|e| ParseError::InvalidUrl(format!("{href}: {e}")))?;

        let mut record = ListingRecord::new(facility_name, detail_url.to_string(), self.status_type);

        if let Some(address) = card.select(&LISTING_ADDRESS).next() {
            record.address = compact_text(address);
            record.prefecture = prefecture_of(&record.address);
        }

        if let Some(heading) = card.select(&STATUS_HEADING).next() {
            let next_paragraph = heading
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "p");
            if let Some(p) = next_paragraph {
                record.detail_content = compact_text(p);
            }
        }

        record.update_date = update_date(card).unwrap_or_default();

        Ok(Some(record))
    }
}

/// First paragraph of the second column in the info grid
fn update_date(card: ElementRef<'_>) -> Option<String> {
    let info = card.select(&INFO_SECTION).next()?;
    let grid = info.select(&GRID).next()?;
    let right_column = grid
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .nth(1)?;
    let paragraph = right_column.select(&PARAGRAPH).next()?;
    Some(compact_text(paragraph))
}

impl Extractor for ListingExtractor {
    type Record = ListingRecord;

    fn name(&self) -> &'static str {
        "listing-cards"
    }

    fn extract(&self, page: &Page) -> Vec<ListingRecord> {
        page.document()
            .select(&LISTING_CARD)
            .filter_map(|card| match self.extract_card(card) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, status = %self.status_type, "Skipping listing card");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <div class="bg-white p-2 md:p-3 border mt-3">
          <a class="font-bold text-lg" href="/detail/12345">イオンモール幕張新都心</a>
          <p class="text-sm mt-1 text-gray-600">千葉県千葉市美浜区豊砂1-1</p>
          <h5 class="font-bold">故障内容</h5>
          <span>|</span>
          <p>急速充電器1基が停止中です</p>
          <div class="bg-base_color border rounded">
            <div class="grid grid-cols-2">
              <div><p>報告者</p></div>
              <div><p>2026/02/07 18:00</p><p>確認</p></div>
            </div>
          </div>
        </div>
    "#;

    fn extractor() -> ListingExtractor {
        ListingExtractor::new("https://ev.gogo.gs", StatusType::Fault).unwrap()
    }

    #[test]
    fn test_extract_full_card() {
        let page = Page::parse(&format!("<html><body>{CARD}</body></html>"));
        let records = extractor().extract(&page);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.facility_name, "イオンモール幕張新都心");
        assert_eq!(record.detail_url, "https://ev.gogo.gs/detail/12345");
        assert_eq!(record.address, "千葉県千葉市美浜区豊砂1-1");
        assert_eq!(record.prefecture, "千葉県");
        assert_eq!(record.detail_content, "急速充電器1基が停止中です");
        assert_eq!(record.update_date, "2026/02/07 18:00");
        assert_eq!(record.status_type, StatusType::Fault);
        assert!(record.latitude.is_none());
    }

    #[test]
    fn test_card_without_link_is_dropped() {
        let page = Page::parse(
            r#"<div class="bg-white border mt-3"><p class="text-sm mt-1">東京都港区1-1</p></div>
               <div class="bg-white border mt-3"><a class="font-bold">名前のみ</a></div>"#,
        );
        assert!(extractor().extract(&page).is_empty());
    }

    #[test]
    fn test_missing_optional_fields_stay_empty() {
        let page = Page::parse(
            r#"<div class="bg-white border mt-3"><a class="font-bold" href="https://ev.gogo.gs/detail/9">スタンド</a></div>"#,
        );
        let records = extractor().extract(&page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, "");
        assert_eq!(records[0].prefecture, "");
        assert_eq!(records[0].update_date, "");
    }
}
