//! Load command: startup reconciliation batch passes

use crate::config::Config;
use crate::error::Result;
use crate::replay::{replay_corrections, replay_pages, CorrectionReplayStats, PageReplayStats};
use crate::store::PageStore;
use crate::taxonomy::Taxonomy;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Combined stats of both reconciliation passes
#[derive(Debug, Clone, Serialize)]
pub struct LoadStats {
    pub pages: Option<PageReplayStats>,
    pub corrections: Option<CorrectionReplayStats>,
    /// Collection size after the run
    pub total_pages: u64,
}

/// Run the two idempotent startup passes: replay pending page ingestions,
/// then replay the correction audit log. A missing input file skips its
/// pass; it is not an error.
pub async fn cmd_load(
    config: &Config,
    taxonomy: &Taxonomy,
    store: &PageStore,
    pages_path: Option<&Path>,
    corrections_path: Option<&Path>,
) -> Result<LoadStats> {
    let pages_file = pages_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.pages_file());
    let corrections_file = corrections_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.corrections_file());

    let pages = if pages_file.exists() {
        Some(replay_pages(store, taxonomy, &config.thresholds, &pages_file).await?)
    } else {
        warn!("Page input file not found, skipping: {:?}", pages_file);
        None
    };

    let corrections = if corrections_file.exists() {
        Some(replay_corrections(store, &corrections_file).await?)
    } else {
        warn!(
            "Correction log not found, skipping: {:?}",
            corrections_file
        );
        None
    };

    let total_pages = store.count().await?;
    info!("Number of pages: {}", total_pages);

    Ok(LoadStats {
        pages,
        corrections,
        total_pages,
    })
}

/// Print load stats to console
pub fn print_load_stats(stats: &LoadStats) {
    println!("\n✓ Load complete");

    if let Some(pages) = &stats.pages {
        println!("  Page lines read: {}", pages.lines);
        println!("  Pages inserted: {}", pages.inserted);
        println!("  Pages replaced: {}", pages.replaced);
        println!("  Stale pages skipped: {}", pages.skipped_stale);
        println!("  Pages dropped (missing titles): {}", pages.dropped);
        println!("  Malformed lines: {}", pages.malformed);
    } else {
        println!("  Page pass skipped (no input file)");
    }

    if let Some(corrections) = &stats.corrections {
        println!("  Corrections applied: {}", corrections.applied);
        println!("  Corrections for missing pages: {}", corrections.missing);
        println!("  Malformed correction lines: {}", corrections.malformed);
    } else {
        println!("  Correction pass skipped (no log file)");
    }

    println!("  Total pages stored: {}", stats.total_pages);
}
