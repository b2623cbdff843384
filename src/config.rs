use crate::error::Result;
use crate::repo::cache::DEFAULT_CACHE_LIFETIME_SECONDS;
use crate::repo::github::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "nextversion.toml";
/// File looked up in the user config directory
pub const USER_CONFIG_FILE: &str = ".nextversion.toml";

/// Represents the complete configuration for git-next-version.
///
/// Every section is optional in the file; command-line flags override the
/// loaded values.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub labels: LabelsConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Where the repository lives locally and on the hosting service
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Guessed from the environment or the remote URL when unset
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Empty means "guess the default branch"
    #[serde(default)]
    pub branches: Vec<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            owner: None,
            name: None,
            remote: default_remote(),
            branches: Vec::new(),
            api_url: default_api_url(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Returns the default labels of major pull requests.
fn default_major_labels() -> Vec<String> {
    strings(&["major", "breaking", "Type: Major", "Type: Breaking"])
}

/// Returns the default labels of minor pull requests.
fn default_minor_labels() -> Vec<String> {
    strings(&["feature", "Type: Feature", "Type: Minor", "Type: Added"])
}

/// Returns the default labels of pull requests left out entirely.
fn default_ignore_labels() -> Vec<String> {
    strings(&["Type: Hidden"])
}

/// Pull-request label rules.
///
/// All lists are OR-matched against the labels of a pull request.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LabelsConfig {
    #[serde(default = "default_major_labels")]
    pub major: Vec<String>,

    #[serde(default = "default_minor_labels")]
    pub minor: Vec<String>,

    #[serde(default = "default_ignore_labels")]
    pub ignore: Vec<String>,

    /// Empty means no filtering
    #[serde(default)]
    pub must_have: Vec<String>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        LabelsConfig {
            major: default_major_labels(),
            minor: default_minor_labels(),
            ignore: default_ignore_labels(),
            must_have: Vec::new(),
        }
    }
}

fn default_minimal_delay_seconds() -> u32 {
    5
}

/// Tag selection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TagsConfig {
    /// Empty means every tag qualifies
    #[serde(default)]
    pub regex: String,

    #[serde(default = "default_minimal_delay_seconds")]
    pub minimal_delay_seconds: u32,
}

impl Default for TagsConfig {
    fn default() -> Self {
        TagsConfig {
            regex: String::new(),
            minimal_delay_seconds: default_minimal_delay_seconds(),
        }
    }
}

fn default_cache_location() -> String {
    ".".to_string()
}

fn default_cache_lifetime() -> i64 {
    DEFAULT_CACHE_LIFETIME_SECONDS
}

/// Pull-request cache settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Existing directory holding the snapshots
    #[serde(default = "default_cache_location")]
    pub location: String,

    #[serde(default = "default_cache_lifetime")]
    pub lifetime_seconds: i64,

    #[serde(default)]
    pub dont_try_to_update: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: false,
            location: default_cache_location(),
            lifetime_seconds: default_cache_lifetime(),
            dont_try_to_update: false,
        }
    }
}

/// One section of the rendered changelog
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogCategory {
    pub title: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ChangelogCategory {
    pub fn new(title: &str, labels: &[&str]) -> Self {
        ChangelogCategory {
            title: title.to_string(),
            labels: strings(labels),
        }
    }
}

/// Returns the default changelog categories.
fn default_categories() -> Vec<ChangelogCategory> {
    vec![
        ChangelogCategory::new("Added", &["Type: Added", "Type: Feature", "feature"]),
        ChangelogCategory::new("Fixed", &["Type: Fixed", "Type: Bug", "bug"]),
        ChangelogCategory::new("Changed", &["Type: Changed"]),
    ]
}

/// Changelog rendering.
///
/// Pull requests matching no category are listed under "Other".
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<ChangelogCategory>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            categories: default_categories(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `nextversion.toml` in current directory
/// 3. `.nextversion.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(LOCAL_CONFIG_FILE).exists() {
        fs::read_to_string(LOCAL_CONFIG_FILE)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(USER_CONFIG_FILE);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.repository.remote, "origin");
        assert_eq!(config.repository.api_url, "https://api.github.com");
        assert!(config.repository.branches.is_empty());
        assert_eq!(config.labels.major, vec!["major", "breaking", "Type: Major", "Type: Breaking"]);
        assert_eq!(config.labels.minor, vec!["feature", "Type: Feature", "Type: Minor", "Type: Added"]);
        assert_eq!(config.labels.ignore, vec!["Type: Hidden"]);
        assert!(config.labels.must_have.is_empty());
        assert_eq!(config.tags.minimal_delay_seconds, 5);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.location, ".");
        assert_eq!(config.cache.lifetime_seconds, 3600);
        assert_eq!(config.changelog.categories.len(), 3);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let config: Config = toml::from_str(
            r#"
            [labels]
            major = ["semver: major"]

            [cache]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.labels.major, vec!["semver: major"]);
        assert_eq!(config.labels.minor, default_minor_labels());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.lifetime_seconds, 3600);
    }
}
