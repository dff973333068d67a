//! Configuration management for newsdb
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document store connection settings
    #[serde(default)]
    pub mongo: MongoConfig,

    /// Search index connection settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Classifier score thresholds
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Input/audit file locations (relative defaults live under the base dir)
    #[serde(default)]
    pub files: FilesConfig,

    /// Output view settings
    #[serde(default)]
    pub view: ViewConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Document store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    #[serde(default = "default_mongo_uri")]
    pub uri: String,

    /// Database name
    #[serde(default = "default_mongo_db")]
    pub db_name: String,

    /// Collection holding page documents
    #[serde(default = "default_mongo_collection")]
    pub collection: String,
}

/// Search index connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Elasticsearch URL
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Index name prefix; the display language is appended per query
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
}

/// Classifier score thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Secondary topic-inclusion threshold (primary cut is fixed at 0.5)
    #[serde(default = "default_topic_score_threshold")]
    pub topic_score: f64,

    /// Usefulness flag threshold
    #[serde(default = "default_useful_threshold")]
    pub useful: f64,

    /// False-rumor flag threshold
    #[serde(default = "default_rumor_threshold")]
    pub rumor: f64,
}

/// Input/audit file locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesConfig {
    /// NDJSON file of classified/translated pages to ingest
    #[serde(default)]
    pub pages: Option<PathBuf>,

    /// NDJSON moderator-correction audit log (written and replayed)
    #[serde(default)]
    pub corrections: Option<PathBuf>,

    /// JSON topic/country taxonomy tables
    #[serde(default)]
    pub taxonomy: Option<PathBuf>,
}

/// Output view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Pages from this domain always report is_about_false_rumor in output
    #[serde(default = "default_fact_check_domain")]
    pub fact_check_domain: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for newsdb data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo: MongoConfig::default(),
            search: SearchConfig::default(),
            thresholds: Thresholds::default(),
            files: FilesConfig::default(),
            view: ViewConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            db_name: default_mongo_db(),
            collection: default_mongo_collection(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            index_prefix: default_index_prefix(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            topic_score: default_topic_score_threshold(),
            useful: default_useful_threshold(),
            rumor: default_rumor_threshold(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fact_check_domain: default_fact_check_domain(),
        }
    }
}

impl Config {
    /// Get the default base directory for newsdb (~/.newsdb)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".newsdb")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Resolved path of the page ingest file
    pub fn pages_file(&self) -> PathBuf {
        self.files
            .pages
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.join("pages.ndjson"))
    }

    /// Resolved path of the correction audit log
    pub fn corrections_file(&self) -> PathBuf {
        self.files
            .corrections
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.join("corrections.ndjson"))
    }

    /// Resolved path of the taxonomy tables
    pub fn taxonomy_file(&self) -> PathBuf {
        self.files
            .taxonomy
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.join("taxonomy.json"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("thresholds.topic_score", self.thresholds.topic_score),
            ("thresholds.useful", self.thresholds.useful),
            ("thresholds.rumor", self.thresholds.rumor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        if self.mongo.uri.is_empty() {
            return Err(Error::Config("mongo.uri must not be empty".to_string()));
        }

        if self.search.index_prefix.is_empty() {
            return Err(Error::Config(
                "search.index_prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mongo.db_name, "covid19");
        assert_eq!(config.search.index_prefix, "covid19-pages");
        assert_eq!(config.view.fact_check_domain, "fij.info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.mongo.collection = "test_pages".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.mongo.collection, "test_pages");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.thresholds.topic_score = 1.5;
        assert!(config.validate().is_err());

        config.thresholds.topic_score = 0.8;
        assert!(config.validate().is_ok());

        config.mongo.uri = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_paths_default_to_base_dir() {
        let mut config = Config::default();
        config.init_paths(Some(PathBuf::from("/data/newsdb")));

        assert_eq!(config.pages_file(), PathBuf::from("/data/newsdb/pages.ndjson"));

        config.files.corrections = Some(PathBuf::from("/var/log/corrections.ndjson"));
        assert_eq!(
            config.corrections_file(),
            PathBuf::from("/var/log/corrections.ndjson")
        );
    }
}
