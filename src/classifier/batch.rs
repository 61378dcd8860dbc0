//! Classification of an already-collected review CSV

use std::collections::HashMap;

use crate::error::Result;
use crate::models::ChargingResult;
use crate::storage::CsvTable;
use crate::utils::error::ParseError;

use super::Classifier;

/// Review text column
pub const CONTENT_COLUMN: &str = "口コミ内容";

/// Classification result column
pub const RESULT_COLUMN: &str = "充電結果";

/// Per-label row counts of one classified table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCounts {
    counts: HashMap<ChargingResult, usize>,
    total: usize,
}

impl LabelCounts {
    fn add(&mut self, label: ChargingResult) {
        *self.counts.entry(label).or_default() += 1;
        self.total += 1;
    }

    pub fn get(&self, label: ChargingResult) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// `(label, count)` for every label in report order, zeros included
    pub fn iter(&self) -> impl Iterator<Item = (ChargingResult, usize)> + '_ {
        ChargingResult::ALL.iter().map(|&label| (label, self.get(label)))
    }
}

/// Add or overwrite the result column of every row
///
/// Rows shorter than the header are padded. Fails when the table has no
/// review text column.
pub fn classify_table(classifier: &Classifier, table: &mut CsvTable) -> Result<LabelCounts> {
    let content = table
        .column(CONTENT_COLUMN)
        .ok_or_else(|| ParseError::MissingColumn(CONTENT_COLUMN.to_string()))?;

    let result = match table.column(RESULT_COLUMN) {
        Some(idx) => idx,
        None => {
            table.headers.push_field(RESULT_COLUMN);
            table.headers.len() - 1
        }
    };
    let width = table.headers.len();

    let mut counts = LabelCounts::default();
    for row in &mut table.rows {
        let label = classifier.classify_opt(row.get(content));
        counts.add(label);

        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        if fields.len() < width {
            fields.resize(width, String::new());
        }
        fields[result] = label.label().to_string();
        *row = csv::StringRecord::from(fields);
    }

    Ok(counts)
}

/// Rows of a classified table carrying `label`
pub fn rows_with_label(table: &CsvTable, label: ChargingResult) -> CsvTable {
    let Some(result) = table.column(RESULT_COLUMN) else {
        return CsvTable {
            headers: table.headers.clone(),
            rows: Vec::new(),
        };
    };

    let rows = table
        .rows
        .iter()
        .filter(|row| row.get(result).and_then(ChargingResult::from_label) == Some(label))
        .cloned()
        .collect();

    CsvTable {
        headers: table.headers.clone(),
        rows,
    }
}
