//! Elasticsearch full-text search
//!
//! One index per display language (`<prefix>-<lang>`); documents carry
//! url/region/text/timestamp fields. The index only resolves urls — hits are
//! re-fetched from the page store by the caller to get the full record.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::taxonomy::Lang;
use elasticsearch::http::transport::Transport;
use elasticsearch::{Elasticsearch, SearchParts};
use serde_json::{json, Value};
use tracing::debug;

/// Handle to the per-language search indices
pub struct SearchIndex {
    client: Elasticsearch,
    index_prefix: String,
}

impl SearchIndex {
    /// Connect to Elasticsearch using config
    pub fn connect(config: &SearchConfig) -> Result<Self> {
        debug!("Connecting to Elasticsearch at {}", config.url);
        let transport = Transport::single_node(&config.url)?;
        Ok(Self {
            client: Elasticsearch::new(transport),
            index_prefix: config.index_prefix.clone(),
        })
    }

    /// Full-text search scoped to a set of internal regions, newest first.
    /// Returns the stored urls of the matching pages.
    pub async fn search_urls(
        &self,
        lang: Lang,
        regions: &[String],
        query: &str,
        start: u64,
        limit: i64,
    ) -> Result<Vec<String>> {
        let index = format!("{}-{}", self.index_prefix, lang);
        let body = search_body(regions, query, start, limit);
        debug!("Searching {} for '{}'", index, query);

        let response = self
            .client
            .search(SearchParts::Index(&[index.as_str()]))
            .body(body)
            .send()
            .await?;
        let json: Value = response.json().await?;

        Ok(extract_hit_urls(&json))
    }
}

/// Build the search request body: bool must of a region-OR and a text match,
/// sorted by the nested local timestamp descending, paginated by from/size
pub fn search_body(regions: &[String], query: &str, start: u64, limit: i64) -> Value {
    let region_terms: Vec<Value> = regions
        .iter()
        .map(|region| json!({ "term": { "region": region } }))
        .collect();

    json!({
        "query": {
            "bool": {
                "must": [
                    { "bool": { "should": region_terms } },
                    { "match": { "text": query } }
                ]
            }
        },
        "sort": [
            { "timestamp.local": { "order": "desc", "nested": { "path": "timestamp" } } }
        ],
        "from": start,
        "size": limit
    })
}

/// Pull `_source.url` out of each hit; hits without one are dropped
fn extract_hit_urls(response: &Value) -> Vec<String> {
    response["hits"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["_source"]["url"].as_str())
                .map(|url| url.to_string())
                .collect()
        })
        .unwrap_or_default()
}
