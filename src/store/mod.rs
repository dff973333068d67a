//! MongoDB page store
//!
//! One collection of `{ "page": { ... } }` documents keyed by `page.url`.
//! This module owns the filter/sort construction for the read path and the
//! timestamp-guarded upsert for the ingest path. Consistency is delegated to
//! MongoDB's per-document atomicity; there is no locking or retry here.

use crate::config::MongoConfig;
use crate::error::Result;
use crate::page::Page;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Stored document wrapper; every page lives under a `page` key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPage {
    pub page: Page,
}

/// What an upsert did with the incoming page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    /// Stored page has an equal or newer original timestamp; incoming dropped
    SkippedStale,
}

/// Fields written by a moderator correction (and its startup replay)
#[derive(Debug, Clone)]
pub struct CorrectionUpdate {
    pub is_about_covid_19: i32,
    pub is_useful: i32,
    pub is_about_false_rumor: i32,
    pub displayed_country: String,
    pub topics: BTreeMap<String, f64>,
}

/// Handle to the page collection
pub struct PageStore {
    collection: Collection<StoredPage>,
}

impl PageStore {
    /// Connect to MongoDB using config
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        debug!("Connecting to MongoDB at {}", config.uri);
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.db_name)
            .collection::<StoredPage>(&config.collection);
        Ok(Self { collection })
    }

    /// Fetch one page by url
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Page>> {
        let stored = self.collection.find_one(doc! { "page.url": url }).await?;
        Ok(stored.map(|s| s.page))
    }

    /// Insert a new page, or overwrite the stored one when the incoming
    /// original timestamp is newer. Older data is dropped without error.
    pub async fn upsert(&self, page: Page) -> Result<UpsertOutcome> {
        let existing = self.find_by_url(&page.url).await?;
        let outcome = upsert_decision(
            &page.orig.timestamp,
            existing.as_ref().map(|p| p.orig.timestamp.as_str()),
        );

        match outcome {
            UpsertOutcome::Inserted => {
                self.collection.insert_one(StoredPage { page }).await?;
            }
            UpsertOutcome::Replaced => {
                let url = page.url.clone();
                let update = doc! { "$set": { "page": bson::to_bson(&page)? } };
                self.collection
                    .update_one(doc! { "page.url": url }, update)
                    .upsert(true)
                    .await?;
            }
            UpsertOutcome::SkippedStale => {}
        }

        Ok(outcome)
    }

    /// Filtered, sorted, paginated page listing
    pub async fn find_pages(
        &self,
        itopics: &[String],
        icountries: &[String],
        start: u64,
        limit: i64,
    ) -> Result<Vec<Page>> {
        let filter = page_filter(itopics, icountries);
        let sort = page_sort(itopics);

        let cursor = self
            .collection
            .find(filter)
            .sort(sort)
            .skip(start)
            .limit(limit)
            .await?;
        let stored: Vec<StoredPage> = cursor.try_collect().await?;
        Ok(stored.into_iter().map(|s| s.page).collect())
    }

    /// Write correction fields for one url. `upsert` is true for a live
    /// moderator correction (creates a stub when missing) and false for the
    /// startup replay (missing pages are skipped by the caller).
    pub async fn apply_correction(
        &self,
        url: &str,
        update: &CorrectionUpdate,
        upsert: bool,
    ) -> Result<()> {
        let update_doc = correction_update_doc(update)?;
        self.collection
            .update_one(doc! { "page.url": url }, update_doc)
            .upsert(upsert)
            .await?;
        Ok(())
    }

    /// Number of stored pages
    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// Decide what to do with an incoming page given the stored timestamp.
/// Comparison is lexicographic on the ISO-8601 strings, as stored.
pub fn upsert_decision(new_timestamp: &str, existing_timestamp: Option<&str>) -> UpsertOutcome {
    match existing_timestamp {
        None => UpsertOutcome::Inserted,
        Some(existing) if new_timestamp > existing => UpsertOutcome::Replaced,
        Some(_) => UpsertOutcome::SkippedStale,
    }
}

/// Filter: always pandemic-related, optionally topic membership (OR over
/// `$exists` per topic) and displayed-country membership (`$in`)
pub fn page_filter(itopics: &[String], icountries: &[String]) -> Document {
    let mut clauses = vec![doc! { "page.is_about_covid_19": 1 }];

    if !itopics.is_empty() {
        let or: Vec<Document> = itopics
            .iter()
            .map(|itopic| {
                let mut clause = Document::new();
                clause.insert(format!("page.topics.{}", itopic), doc! { "$exists": true });
                clause
            })
            .collect();
        clauses.push(doc! { "$or": or });
    }

    if !icountries.is_empty() {
        clauses.push(doc! { "page.displayed_country": { "$in": icountries.to_vec() } });
    }

    doc! { "$and": clauses }
}

/// Sort: publication date descending, then one relevance key per requested
/// topic in the supplied order (most relevant topic breaks ties first)
pub fn page_sort(itopics: &[String]) -> Document {
    let mut sort = Document::new();
    sort.insert("page.orig.simple_timestamp", -1);
    for itopic in itopics {
        sort.insert(format!("page.topics.{}", itopic), -1);
    }
    sort
}

/// `$set` document for a correction write
pub fn correction_update_doc(update: &CorrectionUpdate) -> Result<Document> {
    Ok(doc! {
        "$set": {
            "page.is_about_covid_19": update.is_about_covid_19,
            "page.is_useful": update.is_useful,
            "page.is_about_false_rumor": update.is_about_false_rumor,
            "page.is_checked": 1,
            "page.displayed_country": &update.displayed_country,
            "page.topics": bson::to_bson(&update.topics)?,
        }
    })
}
