//! CSS selectors for the card layouts of ev.gogo.gs
//!
//! Class matching uses attribute substring selectors (`[class*=...]`) because
//! the site's utility classes come in responsive variants (`md:p-3`,
//! `border-gray-200`) and a card is recognised by the combination of markers,
//! not by one exact class.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Card containers
    pub static ref CARD: Selector = parse_selector!("div[class*='bg-white'][class*='border']");
    pub static ref LISTING_CARD: Selector =
        parse_selector!("div[class*='bg-white'][class*='border'][class*='mt-3']");

    // Listing card fields
    pub static ref BOLD_LINK: Selector = parse_selector!("a.font-bold");
    pub static ref LISTING_ADDRESS: Selector = parse_selector!("p[class*='text-sm'][class*='mt-1']");
    pub static ref STATUS_HEADING: Selector = parse_selector!("h5.font-bold");
    pub static ref INFO_SECTION: Selector =
        parse_selector!("div[class*='bg-base_color'][class*='border']");
    pub static ref GRID: Selector = parse_selector!("div[class*='grid']");
    pub static ref PARAGRAPH: Selector = parse_selector!("p");

    // Review card fields
    pub static ref HEADING: Selector = parse_selector!("h2, h3, h4, h5");
    pub static ref BOLD_LINK_LOOSE: Selector = parse_selector!("a[class*='font-bold']");
    pub static ref SMALL_TEXT: Selector = parse_selector!("p[class*='text-sm']");
    pub static ref RULE: Selector = parse_selector!("hr");
    pub static ref SPAN: Selector = parse_selector!("span");
    pub static ref AUTHOR_LINK: Selector = parse_selector!("a[class*='u-id']");

    // Usage card fields
    pub static ref DETAIL_LINK: Selector = parse_selector!("a[href*='/detail/']");

    // Key/value tables
    pub static ref TABLE: Selector = parse_selector!("table");
    pub static ref TABLE_ROW: Selector = parse_selector!("tr");
    pub static ref TABLE_HEADER: Selector = parse_selector!("th");
    pub static ref TABLE_DATA: Selector = parse_selector!("td");
    pub static ref TABLE_CELL: Selector = parse_selector!("th, td");
    pub static ref DEFINITION_LIST: Selector = parse_selector!("dl");
    pub static ref TERM: Selector = parse_selector!("dt");
    pub static ref DESCRIPTION: Selector = parse_selector!("dd");

    // Page structure
    pub static ref MAIN: Selector = parse_selector!("main");
    pub static ref DIV: Selector = parse_selector!("div");
    pub static ref BUTTON: Selector = parse_selector!("button[aria-label]");
    pub static ref PAGINATION_BUTTON: Selector =
        parse_selector!("nav[aria-label='Pagination Navigation'] button");
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        lazy_static::initialize(&CARD);
        lazy_static::initialize(&LISTING_CARD);
        lazy_static::initialize(&PAGINATION_BUTTON);
        lazy_static::initialize(&DETAIL_LINK);
    }

    #[test]
    fn test_card_matches_class_combination() {
        let html = Html::parse_fragment(
            r#"
            <div class="bg-white p-2 md:p-3 border mt-3">listing</div>
            <div class="bg-white border-b">review</div>
            <div class="bg-white">plain</div>
            "#,
        );

        assert_eq!(html.select(&CARD).count(), 2);
        assert_eq!(html.select(&LISTING_CARD).count(), 1);
    }
}
