//! Page records and ingest normalization
//!
//! A `RawPage` is one NDJSON line from the classifier/translator pipeline.
//! `normalize` shapes it into the stored `Page` record: it trims titles,
//! derives the topic set and per-language snippets, and thresholds the
//! classifier scores into flags. Pages missing any of the three titles are
//! silently dropped (data-quality gate, not an error).

pub mod view;

use crate::config::Thresholds;
use crate::error::{Error, Result};
use crate::taxonomy::Taxonomy;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Raw title/timestamp pair as emitted by the pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct RawText {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Rule-based classifier output
#[derive(Debug, Clone, Deserialize)]
pub struct RawClasses {
    #[serde(rename = "is_about_COVID-19", default)]
    pub is_about_covid_19: i32,
    #[serde(default)]
    pub is_clear: i32,
}

/// One classified/translated page as read from the ingest file
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub url: String,
    #[serde(default)]
    pub country: String,
    pub orig: RawText,
    pub ja_translated: RawText,
    pub en_translated: RawText,
    pub classes: RawClasses,
    /// BERT classifier scores: topic codes plus is_useful / is_about_false_rumor
    #[serde(default)]
    pub classes_bert: HashMap<String, f64>,
    /// Japanese snippets, topic -> candidate texts
    #[serde(default)]
    pub snippets: HashMap<String, Vec<String>>,
    /// English snippets, topic -> candidate texts
    #[serde(default)]
    pub snippets_en: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub domain_label: String,
    #[serde(default)]
    pub domain_label_en: String,
}

/// Source-language title with full and date-only timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrigText {
    pub title: String,
    pub timestamp: String,
    pub simple_timestamp: String,
}

/// Translated title for one display language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub title: String,
    pub timestamp: String,
}

/// Stored page record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub country: String,
    /// Moderator-overridable country shown to the front end
    pub displayed_country: String,
    pub orig: OrigText,
    pub ja_translated: TranslatedText,
    pub en_translated: TranslatedText,
    /// Sparse internal topic -> relevance score
    pub topics: BTreeMap<String, f64>,
    pub ja_snippets: BTreeMap<String, String>,
    pub en_snippets: BTreeMap<String, String>,
    pub is_checked: i32,
    pub is_about_covid_19: i32,
    pub is_useful: i32,
    pub is_clear: i32,
    pub is_about_false_rumor: i32,
    pub domain: String,
    pub ja_domain_label: String,
    pub en_domain_label: String,
}

/// Normalize a raw pipeline record into a stored page.
///
/// Returns `Ok(None)` when any of the three titles is empty; an unparseable
/// original timestamp is an error so the replay loop can count and skip it.
pub fn normalize(raw: &RawPage, taxonomy: &Taxonomy, thresholds: &Thresholds) -> Result<Option<Page>> {
    if raw.orig.title.trim().is_empty()
        || raw.ja_translated.title.trim().is_empty()
        || raw.en_translated.title.trim().is_empty()
    {
        return Ok(None);
    }

    let orig = OrigText {
        title: raw.orig.title.trim().to_string(),
        timestamp: raw.orig.timestamp.clone(),
        simple_timestamp: simple_timestamp(&raw.orig.timestamp)?,
    };
    let ja_translated = TranslatedText {
        title: raw.ja_translated.title.trim().to_string(),
        timestamp: raw.ja_translated.timestamp.clone(),
    };
    let en_translated = TranslatedText {
        title: raw.en_translated.title.trim().to_string(),
        timestamp: raw.en_translated.timestamp.clone(),
    };

    let topics = select_topics(&raw.classes_bert, &taxonomy.itopics, thresholds.topic_score);

    let is_useful = threshold_flag(&raw.classes_bert, "is_useful", thresholds.useful);
    let is_about_false_rumor =
        threshold_flag(&raw.classes_bert, "is_about_false_rumor", thresholds.rumor);

    Ok(Some(Page {
        url: raw.url.clone(),
        country: raw.country.clone(),
        displayed_country: raw.country.clone(),
        orig,
        ja_translated,
        en_translated,
        topics,
        ja_snippets: reshape_snippets(&raw.snippets, &taxonomy.itopics),
        en_snippets: reshape_snippets(&raw.snippets_en, &taxonomy.itopics),
        is_checked: 0,
        is_about_covid_19: raw.classes.is_about_covid_19,
        is_useful,
        is_clear: raw.classes.is_clear,
        is_about_false_rumor,
        domain: raw.domain.clone(),
        ja_domain_label: raw.domain_label.clone(),
        en_domain_label: raw.domain_label_en.clone(),
    }))
}

/// Date part of an ISO-8601 timestamp, with or without offset
fn simple_timestamp(timestamp: &str) -> Result<String> {
    let date: NaiveDate = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.date_naive())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(timestamp, "%Y-%m-%d"))
        .map_err(|_| Error::InvalidTimestamp(timestamp.to_string()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Keep scores > 0.5 for known topics, then prune to scores above the
/// secondary threshold; the highest-scoring topic always survives.
fn select_topics(
    scores: &HashMap<String, f64>,
    itopics: &[String],
    threshold: f64,
) -> BTreeMap<String, f64> {
    let mut candidates: Vec<(&str, f64)> = itopics
        .iter()
        .filter_map(|t| scores.get(t).map(|&s| (t.as_str(), s)))
        .filter(|(_, s)| *s > 0.5)
        .collect();
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut kept = BTreeMap::new();
    for (idx, (topic, score)) in candidates.into_iter().enumerate() {
        if idx == 0 || score > threshold {
            kept.insert(topic.to_string(), score);
        } else {
            break;
        }
    }
    kept
}

fn threshold_flag(scores: &HashMap<String, f64>, key: &str, threshold: f64) -> i32 {
    if scores.get(key).copied().unwrap_or(0.0) > threshold {
        1
    } else {
        0
    }
}

/// Flatten per-topic snippet candidates to one snippet per internal topic.
///
/// Each topic prefers its own first snippet; topics without one fall back to
/// the first snippet found scanning topics in priority order, else empty.
fn reshape_snippets(
    snippets: &HashMap<String, Vec<String>>,
    itopics: &[String],
) -> BTreeMap<String, String> {
    let general = itopics
        .iter()
        .find_map(|t| snippets.get(t))
        .map(|texts| texts.first().cloned().unwrap_or_default())
        .unwrap_or_default();

    let mut reshaped = BTreeMap::new();
    for itopic in itopics {
        let own = snippets
            .get(itopic)
            .and_then(|texts| texts.first())
            .map(|s| s.trim())
            .unwrap_or_default();
        let snippet = if !own.is_empty() {
            own.to_string()
        } else {
            general.clone()
        };
        reshaped.insert(itopic.clone(), snippet);
    }
    reshaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::taxonomy::tests::sample_taxonomy;

    pub(crate) fn sample_raw(url: &str) -> RawPage {
        serde_json::from_value(serde_json::json!({
            "url": url,
            "country": "jp",
            "orig": {"title": " Outbreak grows ", "timestamp": "2020-04-01T12:30:00+09:00"},
            "ja_translated": {"title": "流行拡大", "timestamp": "2020-04-01T13:00:00"},
            "en_translated": {"title": "Outbreak grows", "timestamp": "2020-04-01T13:00:00"},
            "classes": {"is_about_COVID-19": 1, "is_clear": 1},
            "classes_bert": {
                "outbreak_status": 0.9,
                "prevention": 0.6,
                "is_useful": 0.8,
                "is_about_false_rumor": 0.1
            },
            "snippets": {"outbreak_status": [" 感染者が増加 "]},
            "snippets_en": {"outbreak_status": ["Cases are rising"]},
            "domain": "example.com",
            "domain_label": "例",
            "domain_label_en": "Example"
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_trims_and_derives() {
        let tax = sample_taxonomy();
        let thresholds = Thresholds::default();
        let page = normalize(&sample_raw("https://example.com/a"), &tax, &thresholds)
            .unwrap()
            .unwrap();

        assert_eq!(page.orig.title, "Outbreak grows");
        assert_eq!(page.orig.simple_timestamp, "2020-04-01");
        assert_eq!(page.displayed_country, "jp");
        assert_eq!(page.is_checked, 0);
        assert_eq!(page.is_useful, 1);
        assert_eq!(page.is_about_false_rumor, 0);
    }

    #[test]
    fn test_normalize_rejects_missing_titles() {
        let tax = sample_taxonomy();
        let thresholds = Thresholds::default();

        let mut raw = sample_raw("https://example.com/a");
        raw.en_translated.title = "  ".to_string();
        assert!(normalize(&raw, &tax, &thresholds).unwrap().is_none());

        let mut raw = sample_raw("https://example.com/a");
        raw.orig.title = String::new();
        assert!(normalize(&raw, &tax, &thresholds).unwrap().is_none());
    }

    #[test]
    fn test_normalize_bad_timestamp_is_error() {
        let tax = sample_taxonomy();
        let thresholds = Thresholds::default();
        let mut raw = sample_raw("https://example.com/a");
        raw.orig.timestamp = "yesterday".to_string();
        assert!(matches!(
            normalize(&raw, &tax, &thresholds),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_select_topics_threshold_behavior() {
        let itopics = vec![
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
        ];
        let scores: HashMap<String, f64> = [
            ("x".to_string(), 0.9),
            ("y".to_string(), 0.6),
            ("z".to_string(), 0.3),
        ]
        .into();

        // 0.6 clears a 0.5 secondary threshold
        let kept = select_topics(&scores, &itopics, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept["x"], 0.9);
        assert_eq!(kept["y"], 0.6);

        // 0.6 fails a 0.75 secondary threshold; only the top topic stays
        let kept = select_topics(&scores, &itopics, 0.75);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("x"));
    }

    #[test]
    fn test_select_topics_keeps_best_even_below_threshold() {
        let itopics = vec!["x".to_string()];
        let scores: HashMap<String, f64> = [("x".to_string(), 0.55)].into();
        let kept = select_topics(&scores, &itopics, 0.9);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept["x"], 0.55);

        // Nothing above the 0.5 primary cut means no topics at all
        let scores: HashMap<String, f64> = [("x".to_string(), 0.4)].into();
        assert!(select_topics(&scores, &itopics, 0.9).is_empty());
    }

    #[test]
    fn test_select_topics_ignores_unknown_keys() {
        let itopics = vec!["x".to_string()];
        let scores: HashMap<String, f64> = [
            ("x".to_string(), 0.7),
            ("is_useful".to_string(), 0.99),
        ]
        .into();
        let kept = select_topics(&scores, &itopics, 0.5);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("x"));
    }

    #[test]
    fn test_reshape_snippets_prefers_own_then_general() {
        let itopics = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let snippets: HashMap<String, Vec<String>> = [
            ("b".to_string(), vec![" own snippet ".to_string()]),
        ]
        .into();

        let reshaped = reshape_snippets(&snippets, &itopics);
        // b keeps its own (trimmed); a and c fall back to the general snippet,
        // which is the first one found in priority order (b's, untrimmed)
        assert_eq!(reshaped["b"], "own snippet");
        assert_eq!(reshaped["a"], " own snippet ");
        assert_eq!(reshaped["c"], " own snippet ");
    }

    #[test]
    fn test_reshape_snippets_empty_when_nothing_found() {
        let itopics = vec!["a".to_string(), "b".to_string()];
        let reshaped = reshape_snippets(&HashMap::new(), &itopics);
        assert_eq!(reshaped["a"], "");
        assert_eq!(reshaped["b"], "");
    }
}
