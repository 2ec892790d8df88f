use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use yamlnav_project::ScanOptions;

pub const ENV_CACHE_TTL: &str = "YAMLNAV_CACHE_TTL";
pub const ENV_STRUCTURED: &str = "YAMLNAV_STRUCTURED";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub max_depth: usize,
    pub max_file_size: u64,
    pub extensions: Vec<String>,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            max_depth: scan.max_depth,
            max_file_size: scan.max_file_size,
            extensions: scan.extensions,
            include_hidden: scan.include_hidden,
            respect_gitignore: scan.respect_gitignore,
        }
    }
}

/// Session settings.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache: CacheConfig,
    pub history: HistoryConfig,
    pub project: ProjectConfig,
    /// Try a full YAML parse before the line scanner.
    pub structured_parser: bool,
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if `src` is not valid YAML or contains unknown keys.
    pub fn from_yaml_str(src: &str) -> Result<Self, ConfigError> {
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(src)?)
    }

    /// Load from an optional file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override variable holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_yaml_str(&src)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `YAMLNAV_CACHE_TTL` and `YAMLNAV_STRUCTURED` as returned by
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to something unparseable.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CACHE_TTL) {
            self.cache.ttl_secs = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_CACHE_TTL,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_STRUCTURED) {
            self.structured_parser = parse_flag(&value).ok_or(ConfigError::Env {
                var: ENV_STRUCTURED,
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.project.max_depth,
            max_file_size: self.project.max_file_size,
            extensions: self.project.extensions.clone(),
            include_hidden: self.project.include_hidden,
            respect_gitignore: self.project.respect_gitignore,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, ENV_CACHE_TTL, ENV_STRUCTURED};
    use color_eyre::eyre;
    use indoc::indoc;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.history.max_entries, 100);
        assert_eq!(config.project.max_depth, 10);
        assert_eq!(config.project.max_file_size, 1024 * 1024);
        assert_eq!(config.project.extensions, vec!["yaml", "yml"]);
        assert!(!config.project.include_hidden);
        assert!(config.project.respect_gitignore);
        assert!(!config.structured_parser);
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> eyre::Result<()> {
        let config = Config::from_yaml_str(indoc! {"
            cache:
              ttl_secs: 5
            project:
              extensions: [yaml]
            structured_parser: true
        "})?;
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 5);
        assert_eq!(config.project.extensions, vec!["yaml"]);
        assert_eq!(config.project.max_depth, 10);
        assert!(config.structured_parser);
        assert_eq!(config.scan_options().extensions, vec!["yaml"]);
        Ok(())
    }

    #[test]
    fn empty_file_is_default() -> eyre::Result<()> {
        assert_eq!(Config::from_yaml_str("\n")?, Config::default());
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_yaml_str("cache:\n  ttl: 5\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn env_overrides() -> eyre::Result<()> {
        let mut config = Config::default();
        config.apply_env_overrides(|var| match var {
            ENV_CACHE_TTL => Some("12".to_string()),
            ENV_STRUCTURED => Some("on".to_string()),
            _ => None,
        })?;
        assert_eq!(config.cache.ttl_secs, 12);
        assert!(config.structured_parser);

        let err = config
            .apply_env_overrides(|var| (var == ENV_STRUCTURED).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_STRUCTURED, .. }));
        Ok(())
    }
}
