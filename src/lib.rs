//! newsdb: data-access layer for a multilingual COVID-19 news aggregation
//! service.
//!
//! Classified/translated news pages are normalized and upserted into a
//! MongoDB collection, indexed for full-text search in Elasticsearch, and
//! served as filtered/sorted views over a static topic/country taxonomy.
//! Moderator corrections overwrite stored pages and append to an audit log
//! that is replayed at startup.

pub mod commands;
pub mod config;
pub mod error;
pub mod moderate;
pub mod page;
pub mod query;
pub mod replay;
pub mod search;
pub mod store;
pub mod taxonomy;
