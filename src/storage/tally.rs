//! Fill-rate and value counts of one CSV column

use crate::error::Result;
use crate::storage::CsvTable;
use crate::utils::error::ParseError;

/// Shown in place of a blank value
pub const EMPTY_VALUE_LABEL: &str = "（未記入）";

/// Counts for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTally {
    pub column: String,
    pub total: usize,
    pub filled: usize,

    /// Trimmed values, most frequent first; ties keep first-seen order
    pub values: Vec<(String, usize)>,
}

impl ColumnTally {
    pub fn empty(&self) -> usize {
        self.total - self.filled
    }
}

/// Tally `column` of `table`
///
/// A value is filled when it is non-blank after trimming; blank values are
/// counted under [`EMPTY_VALUE_LABEL`].
pub fn tally_column(table: &CsvTable, column: &str) -> Result<ColumnTally> {
    let idx = table
        .column(column)
        .ok_or_else(|| ParseError::MissingColumn(column.to_string()))?;

    let mut values: Vec<(String, usize)> = Vec::new();
    let mut filled = 0;

    for row in &table.rows {
        let value = row.get(idx).unwrap_or_default().trim();
        let key = if value.is_empty() {
            EMPTY_VALUE_LABEL
        } else {
            filled += 1;
            value
        };

        match values.iter_mut().find(|(v, _)| v == key) {
            Some((_, n)) => *n += 1,
            None => values.push((key.to_string(), 1)),
        }
    }

    // Stable sort keeps first-seen order among equal counts
    values.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(ColumnTally {
        column: column.to_string(),
        total: table.rows.len(),
        filled,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;

    #[test]
    fn test_tally_column() {
        let table = CsvTable {
            headers: StringRecord::from(vec!["充電器名", "充電結果"]),
            rows: vec![
                StringRecord::from(vec!["A", "充電できた"]),
                StringRecord::from(vec!["B", " "]),
                StringRecord::from(vec!["C", "充電できた"]),
                StringRecord::from(vec!["D", "充電できなかった"]),
                StringRecord::from(vec!["E"]),
            ],
        };

        let tally = tally_column(&table, "充電結果").unwrap();

        assert_eq!(tally.total, 5);
        assert_eq!(tally.filled, 3);
        assert_eq!(tally.empty(), 2);
        assert_eq!(
            tally.values,
            vec![
                ("充電できた".to_string(), 2),
                (EMPTY_VALUE_LABEL.to_string(), 2),
                ("充電できなかった".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_tally_missing_column() {
        let table = CsvTable::default();
        assert!(tally_column(&table, "充電結果").is_err());
    }
}
