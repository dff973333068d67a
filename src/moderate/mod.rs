//! Moderator corrections and the append-only audit log
//!
//! A correction overwrites a page's flags, displayed country, and topic set
//! (each corrected topic at relevance 1.0), marks it checked, and appends one
//! NDJSON line to the audit log. The write upserts: correcting a url that is
//! no longer stored creates a stub, unlike the startup replay which skips it.

use crate::error::Result;
use crate::store::{CorrectionUpdate, PageStore};
use crate::taxonomy::Taxonomy;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One moderator action
#[derive(Debug, Clone)]
pub struct CorrectionRequest {
    pub url: String,
    pub is_about_covid_19: bool,
    pub is_useful: bool,
    pub is_about_false_rumor: bool,
    /// Corrected displayed country (internal code)
    pub country: String,
    /// Corrected topic list (external codes)
    pub topics: Vec<String>,
    /// Free-text moderator note
    pub notes: String,
}

/// One audit log line; append-only, never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub url: String,
    pub is_about_covid_19: i32,
    pub is_useful: i32,
    /// Absent in old log lines; defaults to 0 on replay
    #[serde(default)]
    pub is_about_false_rumor: i32,
    pub new_country: String,
    pub new_topics: Vec<String>,
    pub notes: String,
    /// Wall-clock ISO-8601 timestamp of the correction
    pub time: String,
}

impl CorrectionRecord {
    /// Correction fields as a store write
    pub fn as_update(&self) -> CorrectionUpdate {
        CorrectionUpdate {
            is_about_covid_19: self.is_about_covid_19,
            is_useful: self.is_useful,
            is_about_false_rumor: self.is_about_false_rumor,
            displayed_country: self.new_country.clone(),
            topics: unit_topics(&self.new_topics),
        }
    }
}

/// Apply a moderator correction and append it to the audit log.
/// Returns the applied change record.
pub async fn apply_correction(
    store: &PageStore,
    taxonomy: &Taxonomy,
    request: &CorrectionRequest,
    log_path: &Path,
) -> Result<CorrectionRecord> {
    let record = build_record(taxonomy, request, Local::now().to_rfc3339());

    store
        .apply_correction(&record.url, &record.as_update(), true)
        .await?;
    append_audit_line(log_path, &record)?;

    info!("Applied correction for {}", record.url);
    Ok(record)
}

/// Map the request into the record that is stored and logged. Each external
/// topic maps to its first internal topic at relevance 1.0; unknown external
/// topics contribute nothing, duplicates collapse.
pub fn build_record(
    taxonomy: &Taxonomy,
    request: &CorrectionRequest,
    time: String,
) -> CorrectionRecord {
    let mut new_topics = Vec::new();
    for etopic in &request.topics {
        if let Some(itopic) = taxonomy.itopics_for(etopic).first() {
            if !new_topics.contains(itopic) {
                new_topics.push(itopic.clone());
            }
        }
    }

    CorrectionRecord {
        url: request.url.clone(),
        is_about_covid_19: request.is_about_covid_19 as i32,
        is_useful: request.is_useful as i32,
        is_about_false_rumor: request.is_about_false_rumor as i32,
        new_country: request.country.clone(),
        new_topics,
        notes: request.notes.clone(),
        time,
    }
}

/// Internal topics with relevance forced to 1.0
pub fn unit_topics(itopics: &[String]) -> BTreeMap<String, f64> {
    itopics.iter().map(|t| (t.clone(), 1.0)).collect()
}

/// Append one NDJSON line; the file handle lives only for this call, so the
/// line is flushed and closed before returning
fn append_audit_line(path: &Path, record: &CorrectionRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, record)?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::tests::sample_taxonomy;
    use tempfile::TempDir;

    fn sample_request() -> CorrectionRequest {
        CorrectionRequest {
            url: "https://example.com/a".to_string(),
            is_about_covid_19: true,
            is_useful: false,
            is_about_false_rumor: true,
            country: "jp".to_string(),
            topics: vec!["prevention".to_string(), "outbreak".to_string()],
            notes: "recategorized".to_string(),
        }
    }

    #[test]
    fn test_build_record_maps_topics() {
        let tax = sample_taxonomy();
        let record = build_record(&tax, &sample_request(), "2020-05-01T00:00:00".to_string());

        assert_eq!(record.is_about_covid_19, 1);
        assert_eq!(record.is_useful, 0);
        assert_eq!(record.is_about_false_rumor, 1);
        assert_eq!(record.new_country, "jp");
        assert_eq!(record.new_topics, ["prevention", "outbreak_status"]);
    }

    #[test]
    fn test_build_record_drops_unknown_and_duplicate_topics() {
        let tax = sample_taxonomy();
        let mut request = sample_request();
        request.topics = vec![
            "prevention".to_string(),
            "weather".to_string(),
            "prevention".to_string(),
        ];

        let record = build_record(&tax, &request, "2020-05-01T00:00:00".to_string());
        assert_eq!(record.new_topics, ["prevention"]);
    }

    #[test]
    fn test_update_forces_unit_relevance() {
        let tax = sample_taxonomy();
        let record = build_record(&tax, &sample_request(), "2020-05-01T00:00:00".to_string());
        let update = record.as_update();

        assert_eq!(update.topics.len(), 2);
        assert!(update.topics.values().all(|&score| score == 1.0));
        assert_eq!(update.displayed_country, "jp");
    }

    #[test]
    fn test_append_audit_line_appends_exactly_one_line() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("corrections.ndjson");
        let tax = sample_taxonomy();
        let record = build_record(&tax, &sample_request(), "2020-05-01T00:00:00".to_string());

        append_audit_line(&log_path, &record).unwrap();
        append_audit_line(&log_path, &record).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: CorrectionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.url, record.url);
        assert_eq!(parsed.new_topics, record.new_topics);
    }

    #[test]
    fn test_record_missing_rumor_flag_defaults_to_zero() {
        let line = r#"{"url":"https://example.com/a","is_about_covid_19":1,"is_useful":1,"new_country":"jp","new_topics":["prevention"],"notes":"","time":"2020-05-01T00:00:00"}"#;
        let record: CorrectionRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.is_about_false_rumor, 0);
    }
}
