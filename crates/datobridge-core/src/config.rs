//! Integration configuration management.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for datobridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// CMS connection and watch settings.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Output settings for snapshots and helpers.
    #[serde(default)]
    pub output: OutputConfig,
}

/// CMS connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Project API token. Falls back to `token_env_var`, then `env_file`.
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable consulted when no explicit token is set.
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,

    /// Local secrets file consulted last.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Fetch the latest unpublished version of every record.
    #[serde(default)]
    pub preview: bool,

    /// Named content environment to query.
    #[serde(default)]
    pub environment: Option<String>,

    /// Watch for content changes outside of one-shot builds.
    #[serde(default = "default_true")]
    pub live_reload: bool,

    /// Seconds between two change checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Resource group the host rebuilds when content changes.
    #[serde(default = "default_resource_group")]
    pub resource_group: String,

    /// Website base URL (deprecated, ignored).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Site domain (deprecated, ignored).
    #[serde(default)]
    pub domain: Option<String>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the CLI writes the repository snapshot.
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,

    /// Theme color used by favicon tags.
    #[serde(default)]
    pub theme_color: Option<String>,

    /// Pretty-print snapshot JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

// Default value functions
fn default_token_env_var() -> String {
    "DATO_API_TOKEN".to_string()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_api_base_url() -> String {
    "https://site-api.datocms.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_resource_group() -> String {
    "touched_dato_content".to_string()
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("data/dato.json")
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env_var: default_token_env_var(),
            env_file: default_env_file(),
            api_base_url: default_api_base_url(),
            preview: false,
            environment: None,
            live_reload: true,
            poll_interval_secs: default_poll_interval_secs(),
            resource_group: default_resource_group(),
            base_url: None,
            domain: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
            theme_color: None,
            pretty: true,
        }
    }
}

// The token never shows up in logs.
impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env_var", &self.token_env_var)
            .field("env_file", &self.env_file)
            .field("api_base_url", &self.api_base_url)
            .field("preview", &self.preview)
            .field("environment", &self.environment)
            .field("live_reload", &self.live_reload)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("resource_group", &self.resource_group)
            .finish_non_exhaustive()
    }
}

impl CmsConfig {
    /// Interval between two watch ticks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Names of deprecated options that are set.
    #[must_use]
    pub fn deprecated_options(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.base_url.is_some() {
            names.push("base_url");
        }
        if self.domain.is_some() {
            names.push("domain");
        }
        names
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration layered with `DATOBRIDGE_<SECTION>__<KEY>` variables.
    ///
    /// The file is optional here so the integration can run from the
    /// environment alone.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("DATOBRIDGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, normalizing the API base URL.
    fn validate(&mut self) -> Result<()> {
        let base = self.cms.api_base_url.trim();
        if base.is_empty() {
            return Err(CoreError::config("cms.api_base_url cannot be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::config(format!(
                "cms.api_base_url must be an http(s) URL, got {base:?}"
            )));
        }
        if base.ends_with('/') {
            tracing::warn!("cms.api_base_url should not have a trailing slash");
            self.cms.api_base_url = base.trim_end_matches('/').to_string();
        }

        if self.cms.poll_interval_secs == 0 {
            return Err(CoreError::config(
                "cms.poll_interval_secs must be greater than zero",
            ));
        }

        if self.cms.resource_group.trim().is_empty() {
            return Err(CoreError::config("cms.resource_group cannot be empty"));
        }

        for name in self.cms.deprecated_options() {
            tracing::warn!(option = name, "deprecated option is ignored");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r##"
[cms]
token = "secret"
api_base_url = "https://cms.example.com"
preview = true
environment = "staging"
live_reload = false
poll_interval_secs = 3
resource_group = "cms_content"

[output]
snapshot = "build/cms.json"
theme_color = "#336699"
pretty = false
"##
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.cms.token.as_deref(), Some("secret"));
        assert_eq!(config.cms.api_base_url, "https://cms.example.com");
        assert!(config.cms.preview);
        assert_eq!(config.cms.environment.as_deref(), Some("staging"));
        assert!(!config.cms.live_reload);
        assert_eq!(config.cms.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.cms.resource_group, "cms_content");
        assert_eq!(config.output.snapshot, PathBuf::from("build/cms.json"));
        assert_eq!(config.output.theme_color.as_deref(), Some("#336699"));
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        std::fs::write(&config_path, "").expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert!(config.cms.token.is_none());
        assert_eq!(config.cms.token_env_var, "DATO_API_TOKEN");
        assert_eq!(config.cms.env_file, PathBuf::from(".env"));
        assert_eq!(config.cms.api_base_url, "https://site-api.datocms.com");
        assert!(!config.cms.preview);
        assert!(config.cms.live_reload);
        assert_eq!(config.cms.poll_interval_secs, 10);
        assert_eq!(config.cms.resource_group, "touched_dato_content");
        assert_eq!(config.output.snapshot, PathBuf::from("data/dato.json"));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        std::fs::write(
            &config_path,
            "[cms]\napi_base_url = \"https://cms.example.com/\"\n",
        )
        .expect("write");

        let config = Config::load(&config_path).expect("load config");
        assert_eq!(config.cms.api_base_url, "https://cms.example.com");
    }

    #[test]
    fn test_config_validation_bad_url() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        std::fs::write(&config_path, "[cms]\napi_base_url = \"ftp://nope\"\n").expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("http(s) URL"));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        std::fs::write(&config_path, "[cms]\npoll_interval_secs = 0\n").expect("write");

        let result = Config::load(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("poll_interval_secs")
        );
    }

    #[test]
    fn test_deprecated_options_accepted() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("datobridge.toml");
        std::fs::write(
            &config_path,
            "[cms]\nbase_url = \"https://example.com\"\ndomain = \"example.com\"\n",
        )
        .expect("write");

        let config = Config::load(&config_path).expect("load config");
        assert_eq!(config.cms.deprecated_options(), vec!["base_url", "domain"]);
    }

    #[test]
    fn test_load_with_env_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::load_with_env(&dir.path().join("absent.toml")).expect("load config");
        assert_eq!(config.cms.resource_group, "touched_dato_content");
    }

    #[test]
    fn test_debug_redacts_token() {
        let cms = CmsConfig {
            token: Some("super-secret".to_string()),
            ..CmsConfig::default()
        };
        let debug = format!("{cms:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/datobridge.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
