//! Init command: scaffold configuration and a taxonomy template

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Initialize newsdb: write the default config and, if absent, a taxonomy
/// template to fill in with the real category tables
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let config = Config::load_from(base_dir)?;

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Already initialized at {}",
            config.paths.config_file.display()
        )));
    }

    config.save()?;

    let taxonomy_file = config.taxonomy_file();
    if !taxonomy_file.exists() {
        std::fs::write(&taxonomy_file, taxonomy_template())?;
        info!("Wrote taxonomy template to {:?}", taxonomy_file);
    }

    Ok(())
}

fn taxonomy_template() -> String {
    let template = serde_json::json!({
        "itopics": ["outbreak_status"],
        "itopic_etopic": { "outbreak_status": "outbreak" },
        "topic_groups": [
            { "code": "all", "itopics": ["outbreak_status"] },
            { "code": "outbreak", "itopics": ["outbreak_status"] }
        ],
        "country_groups": [
            { "code": "all", "icountries": ["jp"] },
            { "code": "jp", "icountries": ["jp"] }
        ],
        "topic_names": {
            "outbreak": { "ja": "outbreak", "en": "Outbreak status" }
        },
        "country_names": {
            "jp": { "ja": "jp", "en": "Japan" }
        }
    });
    serde_json::to_string_pretty(&template).expect("static template serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_config_and_taxonomy() {
        let tmp = TempDir::new().unwrap();
        cmd_init(Some(tmp.path().to_path_buf()), false).await.unwrap();

        assert!(tmp.path().join("config.toml").exists());
        let taxonomy = Taxonomy::load(&tmp.path().join("taxonomy.json")).unwrap();
        assert_eq!(taxonomy.itopics, ["outbreak_status"]);

        // Second init without --force refuses
        assert!(cmd_init(Some(tmp.path().to_path_buf()), false).await.is_err());
        // With --force it overwrites
        assert!(cmd_init(Some(tmp.path().to_path_buf()), true).await.is_ok());
    }
}
