//! Query commands: classes, countries, and full-text search

use crate::config::Config;
use crate::error::Result;
use crate::query::{self, PageQuery, QueryResponse};
use crate::search::SearchIndex;
use crate::store::PageStore;
use crate::taxonomy::Taxonomy;

/// Pages sliced by topic
pub async fn cmd_classes(
    config: &Config,
    taxonomy: &Taxonomy,
    store: &PageStore,
    index: &SearchIndex,
    params: &PageQuery,
) -> Result<QueryResponse> {
    query::classes(taxonomy, store, index, &config.view, params).await
}

/// Pages sliced by country
pub async fn cmd_countries(
    config: &Config,
    taxonomy: &Taxonomy,
    store: &PageStore,
    params: &PageQuery,
) -> Result<QueryResponse> {
    query::countries(taxonomy, store, &config.view, params).await
}

/// Full-text search
pub async fn cmd_search(
    config: &Config,
    taxonomy: &Taxonomy,
    store: &PageStore,
    index: &SearchIndex,
    params: &PageQuery,
) -> Result<QueryResponse> {
    query::search(taxonomy, store, index, &config.view, params).await
}

/// Print a query response as pretty JSON
pub fn print_response(response: &QueryResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
