use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub jira: JiraConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub project: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_automation_author")]
    pub automation_author: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Jira caps `maxResults` at 1000 for the search endpoint.
pub const MAX_PAGE_SIZE: usize = 1000;

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}
fn default_automation_author() -> String {
    "Automation for Jira".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub updated_on_rewrite: UpdatedOnRewrite,
}

/// Which issue timestamp the update path stores in the `updated` column.
///
/// Rows have historically been rewritten with the issue's `created` value in
/// both timestamp columns. `Created` keeps that behavior; `Updated` writes the
/// real `updated` value, matching what the insert path does.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdatedOnRewrite {
    #[default]
    Created,
    Updated,
}

impl Config {
    /// Configuration for tests and tooling that only need a store path.
    pub fn minimal(db_path: PathBuf) -> Self {
        Self {
            db: DbConfig { path: db_path },
            jira: JiraConfig {
                base_url: "http://localhost".to_string(),
                project: "TI".to_string(),
                page_size: default_page_size(),
                automation_author: default_automation_author(),
                timeout_secs: default_timeout_secs(),
            },
            sync: SyncConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.jira.base_url.trim().is_empty() {
        anyhow::bail!("jira.base_url must not be empty");
    }

    if config.jira.project.trim().is_empty() {
        anyhow::bail!("jira.project must not be empty");
    }

    if config.jira.page_size == 0 || config.jira.page_size > MAX_PAGE_SIZE {
        anyhow::bail!("jira.page_size must be in 1..={}", MAX_PAGE_SIZE);
    }

    if config.sync.interval_secs == 0 {
        anyhow::bail!("sync.interval_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[db]
path = "./data/jira.db"

[jira]
base_url = "https://example.atlassian.net/"
project = "TI"
page_size = 250
automation_author = "Robot"

[sync]
interval_secs = 30

[store]
updated_on_rewrite = "updated"
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(FULL).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.jira.page_size, 250);
        assert_eq!(config.jira.automation_author, "Robot");
        assert_eq!(config.sync.interval_secs, 30);
        assert_eq!(
            config.store.updated_on_rewrite,
            UpdatedOnRewrite::Updated
        );
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str(
            r#"
[db]
path = "jira.db"

[jira]
base_url = "https://example.atlassian.net/"
project = "TI"
"#,
        )
        .unwrap();
        assert_eq!(config.jira.page_size, 1000);
        assert_eq!(config.jira.automation_author, "Automation for Jira");
        assert_eq!(config.sync.interval_secs, 5);
        assert_eq!(
            config.store.updated_on_rewrite,
            UpdatedOnRewrite::Created
        );
    }

    #[test]
    fn test_rejects_oversized_page() {
        let mut config = Config::minimal(PathBuf::from("jira.db"));
        config.jira.page_size = 5000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = Config::minimal(PathBuf::from("jira.db"));
        config.sync.interval_secs = 0;
        assert!(validate(&config).is_err());
    }
}
