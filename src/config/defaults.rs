//! Default values for configuration

/// Default MongoDB connection URI for local development
pub fn default_mongo_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string())
}

/// Default MongoDB database name
pub fn default_mongo_db() -> String {
    "covid19".to_string()
}

/// Default MongoDB collection name
pub fn default_mongo_collection() -> String {
    "pages".to_string()
}

/// Default Elasticsearch URL for local development
pub fn default_search_url() -> String {
    std::env::var("ELASTICSEARCH_URL").unwrap_or_else(|_| "http://127.0.0.1:9200".to_string())
}

/// Default search index prefix (one index per display language)
pub fn default_index_prefix() -> String {
    "covid19-pages".to_string()
}

/// Default secondary topic-inclusion score threshold
pub fn default_topic_score_threshold() -> f64 {
    0.75
}

/// Default usefulness score threshold
pub fn default_useful_threshold() -> f64 {
    0.5
}

/// Default false-rumor score threshold
pub fn default_rumor_threshold() -> f64 {
    0.75
}

/// Default fact-checking domain whose pages are always flagged as rumor-related
pub fn default_fact_check_domain() -> String {
    "fij.info".to_string()
}
