//! Static topic/country taxonomy tables
//!
//! The taxonomy translates external display codes (what the front end sends
//! and shows) to internal classifier codes (what pages are tagged with), and
//! carries per-language display names. It is supplied as a JSON file and
//! loaded once at startup; nothing here is computed or mutated at runtime.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Sentinel external code excluded from per-key iteration
pub const ALL: &str = "all";

/// Display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ja,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Ja => "ja",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external topic and the internal topics it covers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicGroup {
    pub code: String,
    pub itopics: Vec<String>,
}

/// One external country and the internal region codes it covers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryGroup {
    pub code: String,
    pub icountries: Vec<String>,
}

/// Static taxonomy tables, loaded once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Internal topic codes, in snippet-fallback priority order
    pub itopics: Vec<String>,

    /// Internal topic -> external topic
    pub itopic_etopic: HashMap<String, String>,

    /// External topic -> internal topics, in presentation order
    /// (contains the `all` sentinel entry)
    pub topic_groups: Vec<TopicGroup>,

    /// External country -> internal regions, in presentation order
    /// (contains the `all` sentinel entry)
    pub country_groups: Vec<CountryGroup>,

    /// External topic -> language -> display name
    pub topic_names: HashMap<String, HashMap<String, String>>,

    /// External country -> language -> display name
    pub country_names: HashMap<String, HashMap<String, String>>,
}

impl Taxonomy {
    /// Load taxonomy tables from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading taxonomy from {:?}", path);

        if !path.exists() {
            return Err(Error::Taxonomy(format!(
                "Taxonomy file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let taxonomy: Taxonomy = serde_json::from_str(&content)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Check cross-table consistency; a miss here would surface later as a
    /// fatal lookup failure during reshaping
    pub fn validate(&self) -> Result<()> {
        for itopic in &self.itopics {
            let etopic = self.itopic_etopic.get(itopic).ok_or_else(|| {
                Error::Taxonomy(format!("itopic '{}' has no external topic", itopic))
            })?;
            if !self.topic_names.contains_key(etopic) {
                return Err(Error::Taxonomy(format!(
                    "external topic '{}' has no display names",
                    etopic
                )));
            }
        }

        for group in &self.country_groups {
            if group.code != ALL && !self.country_names.contains_key(&group.code) {
                return Err(Error::Taxonomy(format!(
                    "external country '{}' has no display names",
                    group.code
                )));
            }
        }

        Ok(())
    }

    /// Translate an external topic code in any supported language to its
    /// canonical code; unknown codes pass through unchanged
    pub fn canonical_topic(&self, etopic: &str) -> String {
        self.topic_names
            .get(etopic)
            .and_then(|names| names.get(Lang::Ja.as_str()))
            .cloned()
            .unwrap_or_else(|| etopic.to_string())
    }

    /// Translate an external country code in any supported language to its
    /// canonical code; unknown codes pass through unchanged
    pub fn canonical_country(&self, ecountry: &str) -> String {
        self.country_names
            .get(ecountry)
            .and_then(|names| names.get(Lang::Ja.as_str()))
            .cloned()
            .unwrap_or_else(|| ecountry.to_string())
    }

    /// Internal topics covered by an external topic (empty if unknown)
    pub fn itopics_for(&self, etopic: &str) -> &[String] {
        self.topic_groups
            .iter()
            .find(|g| g.code == etopic)
            .map(|g| g.itopics.as_slice())
            .unwrap_or(&[])
    }

    /// Internal regions covered by an external country (empty if unknown)
    pub fn icountries_for(&self, ecountry: &str) -> &[String] {
        self.country_groups
            .iter()
            .find(|g| g.code == ecountry)
            .map(|g| g.icountries.as_slice())
            .unwrap_or(&[])
    }

    /// External topics in presentation order, `all` sentinel excluded
    pub fn topic_groups_iter(&self) -> impl Iterator<Item = &TopicGroup> {
        self.topic_groups.iter().filter(|g| g.code != ALL)
    }

    /// External countries in presentation order, `all` sentinel excluded
    pub fn country_groups_iter(&self) -> impl Iterator<Item = &CountryGroup> {
        self.country_groups.iter().filter(|g| g.code != ALL)
    }

    /// Display name of a stored internal topic for a language.
    ///
    /// A miss means the taxonomy and the stored data are out of sync, which
    /// is a fatal configuration error, not a skippable record.
    pub fn topic_display(&self, itopic: &str, lang: Lang) -> Result<&str> {
        let etopic = self.itopic_etopic.get(itopic).ok_or_else(|| {
            Error::Taxonomy(format!("internal topic '{}' not in taxonomy", itopic))
        })?;
        self.topic_names
            .get(etopic)
            .and_then(|names| names.get(lang.as_str()))
            .map(|s| s.as_str())
            .ok_or_else(|| {
                Error::Taxonomy(format!(
                    "no {} display name for external topic '{}'",
                    lang, etopic
                ))
            })
    }

    /// Position of an internal topic in the priority order (unknown sorts last)
    pub fn itopic_rank(&self, itopic: &str) -> usize {
        self.itopics
            .iter()
            .position(|t| t == itopic)
            .unwrap_or(usize::MAX)
    }
}
