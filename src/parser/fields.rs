//! Key/value tables found in cards and detail pages
//!
//! The site renders attribute lists either as `<table>` rows with a header and
//! a data cell, or as `<dl>` term/description pairs. Both shapes collapse into
//! one ordered [`FieldTable`]. Labels drift between pages, so lookups match
//! by containment in either direction: `利用日時` finds `利用日時（開始）`
//! and `認証方法` finds `認証`.

use scraper::ElementRef;

use super::selectors::{
    DEFINITION_LIST, DESCRIPTION, TABLE, TABLE_CELL, TABLE_DATA, TABLE_HEADER, TABLE_ROW, TERM,
};
use super::text::compact_text;

/// Ordered label/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTable {
    entries: Vec<(String, String)>,
}

impl FieldTable {
    /// Build a table from raw pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Collect `th`/`td` rows of every table, then `dt`/`dd` pairs of every
    /// definition list below `root`
    pub fn collect(root: ElementRef<'_>) -> Self {
        let mut entries = Vec::new();

        for table in root.select(&TABLE) {
            for row in table.select(&TABLE_ROW) {
                let header = row.select(&TABLE_HEADER).next();
                let data = row.select(&TABLE_DATA).next();
                if let (Some(th), Some(td)) = (header, data) {
                    entries.push((compact_text(th), compact_text(td)));
                }
            }
        }

        for dl in root.select(&DEFINITION_LIST) {
            let terms = dl.select(&TERM);
            let descriptions = dl.select(&DESCRIPTION);
            for (dt, dd) in terms.zip(descriptions) {
                entries.push((compact_text(dt), compact_text(dd)));
            }
        }

        Self { entries }
    }

    /// Collect the first table below `root`, taking the first two cells of
    /// each row regardless of `th`/`td` kind
    pub fn collect_first_table(root: ElementRef<'_>) -> Self {
        let mut entries = Vec::new();

        if let Some(table) = root.select(&TABLE).next() {
            for row in table.select(&TABLE_ROW) {
                let mut cells = row.select(&TABLE_CELL);
                if let (Some(label), Some(value)) = (cells.next(), cells.next()) {
                    entries.push((compact_text(label), compact_text(value)));
                }
            }
        }

        Self { entries }
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pair was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value for `key`
    ///
    /// An exact label wins; otherwise the first label containing `key` or
    /// contained in it. Empty values are skipped so a later, filled row can
    /// still supply the field.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some((_, v)) = self
            .entries
            .iter()
            .find(|(label, value)| label == key && !value.is_empty())
        {
            return Some(v);
        }

        self.entries
            .iter()
            .filter(|(label, value)| !label.is_empty() && !value.is_empty())
            .find(|(label, _)| label.contains(key) || key.contains(label.as_str()))
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or an empty string
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}
