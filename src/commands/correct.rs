//! Correct command: apply one moderator correction

use crate::config::Config;
use crate::error::Result;
use crate::moderate::{apply_correction, CorrectionRecord, CorrectionRequest};
use crate::store::PageStore;
use crate::taxonomy::Taxonomy;

/// Apply a moderator correction and append it to the audit log
pub async fn cmd_correct(
    config: &Config,
    taxonomy: &Taxonomy,
    store: &PageStore,
    request: &CorrectionRequest,
) -> Result<CorrectionRecord> {
    apply_correction(store, taxonomy, request, &config.corrections_file()).await
}

/// Print the applied correction to console
pub fn print_correction(record: &CorrectionRecord) {
    println!("✓ Correction applied to {}", record.url);
    println!("  Country: {}", record.new_country);
    println!("  Topics: {}", record.new_topics.join(", "));
    println!(
        "  Flags: covid={} useful={} rumor={} checked=1",
        record.is_about_covid_19, record.is_useful, record.is_about_false_rumor
    );
    if !record.notes.is_empty() {
        println!("  Notes: {}", record.notes);
    }
    println!("  Logged at {}", record.time);
}
