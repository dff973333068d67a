//! Caller-facing page view
//!
//! Collapses the bilingual stored record into the shape served to the front
//! end for one display language: an ordered topic list with display names
//! and snippets, the selected translation, and the selected domain label.

use crate::error::Result;
use crate::page::{OrigText, Page, TranslatedText};
use crate::taxonomy::{Lang, Taxonomy};
use serde::Serialize;
use std::cmp::Ordering;

/// One topic entry in the output view
#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    /// Display name for the requested language
    pub name: String,
    /// Snippet for the requested language
    pub snippet: String,
    /// Relevance score from the classifier (1.0 after a correction)
    pub relatedness: f64,
}

/// Page as served to the front end
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub url: String,
    pub country: String,
    pub displayed_country: String,
    pub orig: OrigText,
    /// Title/timestamp for the requested language
    pub translated: TranslatedText,
    pub topics: Vec<TopicView>,
    pub is_checked: i32,
    pub is_about_covid_19: i32,
    pub is_useful: i32,
    pub is_clear: i32,
    pub is_about_false_rumor: i32,
    pub domain: String,
    /// Domain label for the requested language
    pub domain_label: String,
}

/// Reshape a stored page for one display language.
///
/// Topics are ordered by relevance descending, ties broken by the taxonomy
/// priority order. A topic display-name miss is a fatal taxonomy/data desync.
pub fn reshape_page(
    page: &Page,
    lang: Lang,
    taxonomy: &Taxonomy,
    fact_check_domain: &str,
) -> Result<PageView> {
    let (snippets, translated, domain_label) = match lang {
        Lang::Ja => (&page.ja_snippets, &page.ja_translated, &page.ja_domain_label),
        Lang::En => (&page.en_snippets, &page.en_translated, &page.en_domain_label),
    };

    let mut entries: Vec<(&String, f64)> =
        page.topics.iter().map(|(t, &s)| (t, s)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| taxonomy.itopic_rank(a.0).cmp(&taxonomy.itopic_rank(b.0)))
    });

    let mut topics = Vec::with_capacity(entries.len());
    for (itopic, relatedness) in entries {
        topics.push(TopicView {
            name: taxonomy.topic_display(itopic, lang)?.to_string(),
            // Corrected topics may have no snippet for this language
            snippet: snippets.get(itopic).cloned().unwrap_or_default(),
            relatedness,
        });
    }

    let is_about_false_rumor = if page.domain == fact_check_domain {
        1
    } else {
        page.is_about_false_rumor
    };

    Ok(PageView {
        url: page.url.clone(),
        country: page.country.clone(),
        displayed_country: page.displayed_country.clone(),
        orig: page.orig.clone(),
        translated: translated.clone(),
        topics,
        is_checked: page.is_checked,
        is_about_covid_19: page.is_about_covid_19,
        is_useful: page.is_useful,
        is_clear: page.is_clear,
        is_about_false_rumor,
        domain: page.domain.clone(),
        domain_label: domain_label.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::page::{normalize, tests::sample_raw};
    use crate::taxonomy::tests::sample_taxonomy;

    fn sample_page() -> Page {
        let tax = sample_taxonomy();
        normalize(&sample_raw("https://example.com/a"), &tax, &Thresholds::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_reshape_selects_language_fields() {
        let tax = sample_taxonomy();
        let page = sample_page();

        let en = reshape_page(&page, Lang::En, &tax, "fij.info").unwrap();
        assert_eq!(en.translated.title, "Outbreak grows");
        assert_eq!(en.domain_label, "Example");

        let ja = reshape_page(&page, Lang::Ja, &tax, "fij.info").unwrap();
        assert_eq!(ja.translated.title, "流行拡大");
        assert_eq!(ja.domain_label, "例");

        // The serialized view carries no other-language fields
        let json = serde_json::to_value(&en).unwrap();
        assert!(json.get("ja_translated").is_none());
        assert!(json.get("en_snippets").is_none());
        assert!(json.get("translated").is_some());
    }

    #[test]
    fn test_reshape_orders_topics_by_relevance() {
        let tax = sample_taxonomy();
        let page = sample_page();

        // Default secondary threshold (0.75) prunes prevention (0.6), so force
        // both topics in to observe ordering
        let mut page = page;
        page.topics.insert("prevention".to_string(), 0.6);
        page.topics.insert("outbreak_status".to_string(), 0.9);

        let view = reshape_page(&page, Lang::En, &tax, "fij.info").unwrap();
        let names: Vec<&str> = view.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Outbreak status", "Prevention"]);
        assert_eq!(view.topics[0].snippet, "Cases are rising");
        assert_eq!(view.topics[0].relatedness, 0.9);
    }

    #[test]
    fn test_reshape_unknown_topic_is_fatal() {
        let tax = sample_taxonomy();
        let mut page = sample_page();
        page.topics.insert("unmapped_topic".to_string(), 0.9);
        assert!(reshape_page(&page, Lang::En, &tax, "fij.info").is_err());
    }

    #[test]
    fn test_fact_check_domain_forces_rumor_flag() {
        let tax = sample_taxonomy();
        let mut page = sample_page();
        assert_eq!(page.is_about_false_rumor, 0);

        page.domain = "fij.info".to_string();
        let view = reshape_page(&page, Lang::En, &tax, "fij.info").unwrap();
        assert_eq!(view.is_about_false_rumor, 1);

        // Stored flag wins for every other domain
        page.domain = "example.com".to_string();
        page.is_about_false_rumor = 1;
        let view = reshape_page(&page, Lang::En, &tax, "fij.info").unwrap();
        assert_eq!(view.is_about_false_rumor, 1);
    }
}
