use anyhow::{Context, Result};
use std::path::PathBuf;

use ev_scraper::classifier::{classify_table, rows_with_label, RESULT_COLUMN};
use ev_scraper::config::Config;
use ev_scraper::crawler::load_classifier;
use ev_scraper::models::ChargingResult;
use ev_scraper::storage::{read_table, with_stem_suffix, write_table};
use ev_scraper::utils::truncate_text;

/// Rows of the failed-only table echoed to the terminal
const FAILED_PREVIEW_ROWS: usize = 20;

pub fn classify(config: &Config, input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| with_stem_suffix(&input, "_with_charging_result"));

    println!("読み込み中: {}", input.display());
    let mut table =
        read_table(&input).with_context(|| format!("Failed to read {}", input.display()))?;

    let classifier = load_classifier(config)?;
    let counts = classify_table(&classifier, &mut table)?;

    write_table(&output, &table)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("保存しました: {}", output.display());

    println!();
    println!("=== {RESULT_COLUMN} 集計 ===");
    for (label, n) in counts.iter() {
        println!("  {label}: {n} 件");
    }
    println!("  合計: {} 件", counts.total());

    let failed = rows_with_label(&table, ChargingResult::Failed);
    let failed_path = with_stem_suffix(&output, "_failed");
    write_table(&failed_path, &failed)
        .with_context(|| format!("Failed to write {}", failed_path.display()))?;

    println!();
    println!("=== {} 抽出結果 ===", ChargingResult::Failed);
    println!("件数: {} 件", failed.rows.len());
    println!("保存先: {}", failed_path.display());

    let name = failed.column("充電器名");
    let content = failed.column("口コミ内容");
    for row in failed.rows.iter().take(FAILED_PREVIEW_ROWS) {
        let name = name.and_then(|i| row.get(i)).unwrap_or_default();
        let text = content
            .and_then(|i| row.get(i))
            .unwrap_or_default()
            .replace('\n', " ");
        println!("  [{name}] {}", truncate_text(&text, 120));
    }

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = counts.total(),
        failed = failed.rows.len(),
        "Classification complete"
    );
    Ok(())
}
