//! Pagination control detection

use lazy_static::lazy_static;
use regex::Regex;

use super::selectors::{BUTTON, PAGINATION_BUTTON};
use super::text::compact_text;
use super::Page;

lazy_static! {
    static ref NEXT_LABEL: Regex =
        Regex::new(r"(?i)go to page|next|次の").expect("Invalid regex pattern");
}

/// Whether the page advertises another page
///
/// True when a button labelled "Go to page N", "Next" or "次の..." exists, or
/// when a button of the pagination nav shows a page number greater than 1.
/// The crawl loop still stops on a page without records.
pub fn has_next_page(page: &Page) -> bool {
    let document = page.document();

    let labelled = document.select(&BUTTON).any(|button| {
        button
            .value()
            .attr("aria-label")
            .is_some_and(|label| NEXT_LABEL.is_match(label))
    });
    if labelled {
        return true;
    }

    document.select(&PAGINATION_BUTTON).any(|button| {
        let text = compact_text(button);
        !text.is_empty()
            && text.chars().all(|c| c.is_ascii_digit())
            && text.parse::<u32>().is_ok_and(|n| n > 1)
    })
}
