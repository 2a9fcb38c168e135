/*!
common/src/lib.rs

Shared configuration types and helpers for Albistari.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file with default/override merging
- The default Basque topic list used when no candidate labels are supplied
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Topic names presented to the user when no explicit candidate list is
/// supplied. Order matters: it is also the reminder rotation priority.
pub const DEFAULT_TOPICS: [&str; 10] = [
    "Azken berriak",
    "Berri irakurrienak",
    "Gizartea",
    "Politika",
    "Ekonomia",
    "Mundua",
    "Iritzia",
    "Kultura",
    "Kirola",
    "Bizigiro",
];

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
}

/// News site scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the news site (e.g. "https://www.berria.eus")
    pub base_url: String,
    pub fetch_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

impl ScraperConfig {
    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.fetch_timeout_seconds.unwrap_or(10)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("Albistari/0.1.0")
    }
}

/// Lemmatizer pipeline configuration (used if `lemmatizer.adapter = "remote"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LemmatizerConfig {
    pub adapter: Option<String>, // "remote", "casefold"
    /// Tokenizer endpoint: raw text in, NAF out
    pub tokenizer_url: Option<String>,
    /// POS-tagger/lemmatizer endpoint: NAF in, NAF with term lemmas out
    pub tagger_url: Option<String>,
    pub lang: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl LemmatizerConfig {
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or("eu")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}

/// Dialogue / reminder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Seconds of inactivity between reminder digests
    pub reminder_interval_seconds: Option<u64>,
    /// Override of the default topic list
    pub topics: Option<Vec<String>>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub scraper: ScraperConfig,
    pub lemmatizer: Option<LemmatizerConfig>,
    pub dialogue: Option<DialogueConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// The topic list: configured override, or the compiled-in defaults.
    pub fn topics(&self) -> Vec<String> {
        self.dialogue
            .as_ref()
            .and_then(|d| d.topics.clone())
            .unwrap_or_else(default_topics)
    }

    pub fn reminder_interval_seconds(&self) -> u64 {
        self.dialogue
            .as_ref()
            .and_then(|d| d.reminder_interval_seconds)
            .unwrap_or(15)
    }
}

/// The default topic list as owned strings.
pub fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_string() {
        let toml = r#"
            [scraper]
            base_url = "https://www.berria.eus"
            fetch_timeout_seconds = 5

            [lemmatizer]
            adapter = "casefold"

            [dialogue]
            reminder_interval_seconds = 15
            topics = ["Gizartea", "Politika"]
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.scraper.base_url, "https://www.berria.eus");
        assert_eq!(cfg.scraper.fetch_timeout_seconds(), 5);
        assert_eq!(cfg.reminder_interval_seconds(), 15);
        assert_eq!(cfg.topics(), vec!["Gizartea", "Politika"]);
    }

    #[test]
    fn topics_fall_back_to_defaults() {
        let toml = r#"
            [scraper]
            base_url = "https://www.berria.eus"
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.topics().len(), 10);
        assert_eq!(cfg.topics()[0], "Azken berriak");
        assert_eq!(cfg.reminder_interval_seconds(), 15);
    }

    #[tokio::test]
    async fn load_with_defaults_merges_override() {
        let dir = std::env::temp_dir().join(format!("albistari_cfg_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);

        let default_path = dir.join("config.default.toml");
        std::fs::write(
            &default_path,
            r#"
            [scraper]
            base_url = "https://www.berria.eus"
            fetch_timeout_seconds = 10
        "#,
        )
        .expect("write default config");

        let override_path = dir.join("config.toml");
        std::fs::write(
            &override_path,
            r#"
            [scraper]
            fetch_timeout_seconds = 3
        "#,
        )
        .expect("write override config");

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load config");
        assert_eq!(cfg.scraper.base_url, "https://www.berria.eus");
        assert_eq!(cfg.scraper.fetch_timeout_seconds(), 3);
    }
}
