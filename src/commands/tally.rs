use anyhow::{Context, Result};
use std::path::PathBuf;

use ev_scraper::storage::{read_table, tally_column};

pub fn tally(input: PathBuf, column: String) -> Result<()> {
    let table = read_table(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let tally = tally_column(&table, &column)?;

    println!("=== {column}の記入状況 ===");
    println!("総件数: {} 件", tally.total);
    println!("記入あり: {} 件", tally.filled);
    println!("未記入（空欄）: {} 件", tally.empty());
    println!();
    println!("=== 記述内容別 件数 ===");
    for (value, n) in &tally.values {
        println!("{value}: {n}件");
    }

    Ok(())
}
