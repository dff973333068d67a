//! Startup reconciliation
//!
//! Two idempotent batch passes over line-delimited JSON files: replay pending
//! page ingestions, then replay the moderator-correction audit log. Bad lines
//! are counted and skipped so one record never halts a pass; database
//! failures still abort the whole run.

use crate::config::Thresholds;
use crate::error::Result;
use crate::moderate::CorrectionRecord;
use crate::page::{normalize, Page, RawPage};
use crate::store::{PageStore, UpsertOutcome};
use crate::taxonomy::Taxonomy;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome counts of the page ingest pass
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PageReplayStats {
    pub lines: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped_stale: usize,
    /// Pages missing a required title (silent data-quality gate)
    pub dropped: usize,
    /// Unparseable lines
    pub malformed: usize,
}

/// Outcome counts of the correction replay pass
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CorrectionReplayStats {
    pub lines: usize,
    pub applied: usize,
    /// Corrections whose page is no longer stored
    pub missing: usize,
    pub malformed: usize,
}

/// What one ingest line turned into
enum PageLine {
    Page(Box<Page>),
    Dropped,
    Malformed,
}

fn classify_page_line(line: &str, taxonomy: &Taxonomy, thresholds: &Thresholds) -> PageLine {
    let raw: RawPage = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Skipping malformed page line: {}", err);
            return PageLine::Malformed;
        }
    };

    match normalize(&raw, taxonomy, thresholds) {
        Ok(Some(page)) => PageLine::Page(Box::new(page)),
        Ok(None) => {
            debug!("Dropping page without required titles: {}", raw.url);
            PageLine::Dropped
        }
        Err(err) => {
            warn!("Skipping page {}: {}", raw.url, err);
            PageLine::Malformed
        }
    }
}

fn parse_correction_line(line: &str) -> Option<CorrectionRecord> {
    match serde_json::from_str(line) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!("Skipping malformed correction line: {}", err);
            None
        }
    }
}

/// Replay pending page ingestions through the normal upsert path
pub async fn replay_pages(
    store: &PageStore,
    taxonomy: &Taxonomy,
    thresholds: &Thresholds,
    path: &Path,
) -> Result<PageReplayStats> {
    info!("Replaying pages from {:?}", path);
    let reader = BufReader::new(File::open(path)?);
    let mut stats = PageReplayStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        match classify_page_line(&line, taxonomy, thresholds) {
            PageLine::Page(page) => match store.upsert(*page).await? {
                UpsertOutcome::Inserted => stats.inserted += 1,
                UpsertOutcome::Replaced => stats.replaced += 1,
                UpsertOutcome::SkippedStale => stats.skipped_stale += 1,
            },
            PageLine::Dropped => stats.dropped += 1,
            PageLine::Malformed => stats.malformed += 1,
        }
    }

    info!(
        "Page replay done: {} lines, {} inserted, {} replaced, {} stale, {} dropped, {} malformed",
        stats.lines, stats.inserted, stats.replaced, stats.skipped_stale, stats.dropped,
        stats.malformed
    );
    Ok(stats)
}

/// Reapply logged corrections to pages that still exist.
///
/// Writes go through the store directly with upsert disabled so a replay
/// never recreates pages or re-appends to the audit log. The field list must
/// stay in sync with the live correction path in `moderate`.
pub async fn replay_corrections(store: &PageStore, path: &Path) -> Result<CorrectionReplayStats> {
    info!("Replaying corrections from {:?}", path);
    let reader = BufReader::new(File::open(path)?);
    let mut stats = CorrectionReplayStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let Some(record) = parse_correction_line(&line) else {
            stats.malformed += 1;
            continue;
        };

        if store.find_by_url(&record.url).await?.is_none() {
            debug!("Correction target no longer stored: {}", record.url);
            stats.missing += 1;
            continue;
        }

        store
            .apply_correction(&record.url, &record.as_update(), false)
            .await?;
        stats.applied += 1;
    }

    info!(
        "Correction replay done: {} lines, {} applied, {} missing, {} malformed",
        stats.lines, stats.applied, stats.missing, stats.malformed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::tests::sample_taxonomy;

    fn page_line(url: &str, title: &str) -> String {
        serde_json::json!({
            "url": url,
            "country": "jp",
            "orig": {"title": title, "timestamp": "2020-04-01T12:30:00"},
            "ja_translated": {"title": "タイトル", "timestamp": "2020-04-01T13:00:00"},
            "en_translated": {"title": "Title", "timestamp": "2020-04-01T13:00:00"},
            "classes": {"is_about_COVID-19": 1, "is_clear": 0},
            "classes_bert": {"outbreak_status": 0.9},
            "snippets": {},
            "snippets_en": {}
        })
        .to_string()
    }

    #[test]
    fn test_classify_page_line_isolates_bad_records() {
        let tax = sample_taxonomy();
        let thresholds = Thresholds::default();

        assert!(matches!(
            classify_page_line(&page_line("https://a", "Title"), &tax, &thresholds),
            PageLine::Page(_)
        ));
        assert!(matches!(
            classify_page_line(&page_line("https://a", ""), &tax, &thresholds),
            PageLine::Dropped
        ));
        assert!(matches!(
            classify_page_line("{not json", &tax, &thresholds),
            PageLine::Malformed
        ));
        // Parseable JSON missing required structure is malformed, not fatal
        assert!(matches!(
            classify_page_line(r#"{"url": "https://a"}"#, &tax, &thresholds),
            PageLine::Malformed
        ));
    }

    #[test]
    fn test_parse_correction_line() {
        let line = r#"{"url":"https://a","is_about_covid_19":1,"is_useful":1,"is_about_false_rumor":0,"new_country":"jp","new_topics":["prevention"],"notes":"n","time":"2020-05-01T00:00:00"}"#;
        let record = parse_correction_line(line).unwrap();
        assert_eq!(record.url, "https://a");
        assert_eq!(record.new_topics, ["prevention"]);

        assert!(parse_correction_line("oops").is_none());
    }
}
