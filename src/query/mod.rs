//! Read operations: classes, countries, and full-text search
//!
//! All three serve the same reshaped page view, sliced by different axes.
//! Which branch runs depends on which selectors were supplied; that presence
//! check is the `Selector` enum so each branch's contract stays explicit.

use crate::config::ViewConfig;
use crate::error::Result;
use crate::page::view::{reshape_page, PageView};
use crate::search::SearchIndex;
use crate::store::PageStore;
use crate::taxonomy::{Lang, Taxonomy};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Sentinel topic selector that routes `classes` to full-text search
pub const SEARCH_TOPIC: &str = "search";

/// Parameters shared by the read operations
#[derive(Debug, Clone)]
pub struct PageQuery {
    /// External topic code (empty/absent means all topics)
    pub topic: Option<String>,
    /// External country code (empty/absent means all countries)
    pub country: Option<String>,
    /// Pagination offset, applied after sort
    pub start: u64,
    /// Page size
    pub limit: i64,
    pub lang: Lang,
    /// Free-text query, used when delegating to search
    pub query: Option<String>,
}

/// Which selectors were supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Both axes given: one filtered list
    Both,
    /// Primary axis only: one list per secondary key
    PrimaryOnly,
    /// Primary absent: nested primary -> secondary map
    /// (a secondary-only selection collapses here, matching the API contract)
    Neither,
}

impl Selector {
    pub fn from_parts(primary: bool, secondary: bool) -> Self {
        match (primary, secondary) {
            (true, true) => Selector::Both,
            (true, false) => Selector::PrimaryOnly,
            (false, _) => Selector::Neither,
        }
    }
}

/// Response of a read operation; serializes as a bare list, a keyed map, or
/// a nested map depending on the selectors
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Pages(Vec<PageView>),
    Grouped(BTreeMap<String, Vec<PageView>>),
    Nested(BTreeMap<String, BTreeMap<String, Vec<PageView>>>),
}

/// Non-empty selector value, treating `""` as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Pages sliced by topic, optionally narrowed to a country
pub async fn classes(
    taxonomy: &Taxonomy,
    store: &PageStore,
    index: &SearchIndex,
    view: &ViewConfig,
    query: &PageQuery,
) -> Result<QueryResponse> {
    if present(&query.topic) == Some(SEARCH_TOPIC) {
        return search(taxonomy, store, index, view, query).await;
    }

    let etopic = present(&query.topic).map(|t| taxonomy.canonical_topic(t));
    let ecountry = present(&query.country).map(|c| taxonomy.canonical_country(c));

    match Selector::from_parts(etopic.is_some(), ecountry.is_some()) {
        Selector::Both => {
            let itopics = taxonomy.itopics_for(etopic.as_deref().unwrap_or_default());
            let icountries = taxonomy.icountries_for(ecountry.as_deref().unwrap_or_default());
            let pages = get_pages(taxonomy, store, view, itopics, icountries, query).await?;
            Ok(QueryResponse::Pages(pages))
        }
        Selector::PrimaryOnly => {
            let itopics = taxonomy.itopics_for(etopic.as_deref().unwrap_or_default());
            let mut grouped = BTreeMap::new();
            for group in taxonomy.country_groups_iter() {
                let pages =
                    get_pages(taxonomy, store, view, itopics, &group.icountries, query).await?;
                grouped.insert(group.code.clone(), pages);
            }
            Ok(QueryResponse::Grouped(grouped))
        }
        Selector::Neither => {
            let mut nested = BTreeMap::new();
            for topic_group in taxonomy.topic_groups_iter() {
                let mut by_country = BTreeMap::new();
                for country_group in taxonomy.country_groups_iter() {
                    let pages = get_pages(
                        taxonomy,
                        store,
                        view,
                        &topic_group.itopics,
                        &country_group.icountries,
                        query,
                    )
                    .await?;
                    by_country.insert(country_group.code.clone(), pages);
                }
                nested.insert(topic_group.code.clone(), by_country);
            }
            Ok(QueryResponse::Nested(nested))
        }
    }
}

/// Pages sliced by country, optionally narrowed to a topic
pub async fn countries(
    taxonomy: &Taxonomy,
    store: &PageStore,
    view: &ViewConfig,
    query: &PageQuery,
) -> Result<QueryResponse> {
    let etopic = present(&query.topic).map(|t| taxonomy.canonical_topic(t));
    let ecountry = present(&query.country).map(|c| taxonomy.canonical_country(c));

    match Selector::from_parts(ecountry.is_some(), etopic.is_some()) {
        Selector::Both => {
            let itopics = taxonomy.itopics_for(etopic.as_deref().unwrap_or_default());
            let icountries = taxonomy.icountries_for(ecountry.as_deref().unwrap_or_default());
            let pages = get_pages(taxonomy, store, view, itopics, icountries, query).await?;
            Ok(QueryResponse::Pages(pages))
        }
        Selector::PrimaryOnly => {
            let icountries = taxonomy.icountries_for(ecountry.as_deref().unwrap_or_default());
            let mut grouped = BTreeMap::new();
            for group in taxonomy.topic_groups_iter() {
                let pages =
                    get_pages(taxonomy, store, view, &group.itopics, icountries, query).await?;
                grouped.insert(group.code.clone(), pages);
            }
            Ok(QueryResponse::Grouped(grouped))
        }
        Selector::Neither => {
            let mut nested = BTreeMap::new();
            for country_group in taxonomy.country_groups_iter() {
                let mut by_topic = BTreeMap::new();
                for topic_group in taxonomy.topic_groups_iter() {
                    let pages = get_pages(
                        taxonomy,
                        store,
                        view,
                        &topic_group.itopics,
                        &country_group.icountries,
                        query,
                    )
                    .await?;
                    by_topic.insert(topic_group.code.clone(), pages);
                }
                nested.insert(country_group.code.clone(), by_topic);
            }
            Ok(QueryResponse::Nested(nested))
        }
    }
}

/// Full-text search, scoped to one country or run once per country.
/// Each hit is re-fetched from the store; hits whose page is gone are dropped.
pub async fn search(
    taxonomy: &Taxonomy,
    store: &PageStore,
    index: &SearchIndex,
    view: &ViewConfig,
    query: &PageQuery,
) -> Result<QueryResponse> {
    let text = query.query.as_deref().unwrap_or_default();

    match present(&query.country).map(|c| taxonomy.canonical_country(c)) {
        Some(ecountry) => {
            let regions = taxonomy.icountries_for(&ecountry);
            let pages = search_pages(taxonomy, store, index, view, regions, text, query).await?;
            Ok(QueryResponse::Pages(pages))
        }
        None => {
            let mut grouped = BTreeMap::new();
            for group in taxonomy.country_groups_iter() {
                let pages =
                    search_pages(taxonomy, store, index, view, &group.icountries, text, query)
                        .await?;
                grouped.insert(group.code.clone(), pages);
            }
            Ok(QueryResponse::Grouped(grouped))
        }
    }
}

/// Filtered+sorted+paginated store read, reshaped for the requested language
async fn get_pages(
    taxonomy: &Taxonomy,
    store: &PageStore,
    view: &ViewConfig,
    itopics: &[String],
    icountries: &[String],
    query: &PageQuery,
) -> Result<Vec<PageView>> {
    let pages = store
        .find_pages(itopics, icountries, query.start, query.limit)
        .await?;
    debug!(
        "Fetched {} pages for {:?}/{:?}",
        pages.len(),
        itopics,
        icountries
    );
    pages
        .iter()
        .map(|page| reshape_page(page, query.lang, taxonomy, &view.fact_check_domain))
        .collect()
}

async fn search_pages(
    taxonomy: &Taxonomy,
    store: &PageStore,
    index: &SearchIndex,
    view: &ViewConfig,
    regions: &[String],
    text: &str,
    query: &PageQuery,
) -> Result<Vec<PageView>> {
    let urls = index
        .search_urls(query.lang, regions, text, query.start, query.limit)
        .await?;

    let mut pages = Vec::with_capacity(urls.len());
    for url in urls {
        if let Some(page) = store.find_by_url(&url).await? {
            pages.push(reshape_page(
                &page,
                query.lang,
                taxonomy,
                &view.fact_check_domain,
            )?);
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_dispatch() {
        assert_eq!(Selector::from_parts(true, true), Selector::Both);
        assert_eq!(Selector::from_parts(true, false), Selector::PrimaryOnly);
        assert_eq!(Selector::from_parts(false, false), Selector::Neither);
        // Secondary alone does not narrow the primary axis
        assert_eq!(Selector::from_parts(false, true), Selector::Neither);
    }

    #[test]
    fn test_present_treats_empty_as_absent() {
        assert_eq!(present(&Some("jp".to_string())), Some("jp"));
        assert_eq!(present(&Some(String::new())), None);
        assert_eq!(present(&None), None);
    }

    #[test]
    fn test_query_response_serialization_shapes() {
        let pages = QueryResponse::Pages(vec![]);
        assert_eq!(serde_json::to_value(&pages).unwrap(), serde_json::json!([]));

        let mut map = BTreeMap::new();
        map.insert("jp".to_string(), vec![]);
        let grouped = QueryResponse::Grouped(map);
        assert_eq!(
            serde_json::to_value(&grouped).unwrap(),
            serde_json::json!({ "jp": [] })
        );
    }
}
