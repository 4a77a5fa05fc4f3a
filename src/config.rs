//! Configuration Management
//!
//! Resolves the CMDB instance, credentials and target table from CLI flags,
//! the environment and an optional config file, in that order of precedence.

use crate::cmdb::error::{CmdbError, CmdbResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_INSTANCE: &str = "SERVICENOW_INSTANCE";
pub const ENV_USER: &str = "SERVICENOW_USER";
pub const ENV_PASSWORD: &str = "SERVICENOW_PASSWORD";
pub const ENV_TABLE: &str = "SERVICENOW_TABLE";
pub const ENV_BASE_URL: &str = "SERVICENOW_BASE_URL";

/// Table queried when none is configured
pub const DEFAULT_TABLE: &str = "cmdb_ci_linux_server";

/// Basic-auth credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// On-disk configuration. Passwords are only taken from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl FileConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cmdbctl").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults if the file
    /// is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("Ignoring malformed config file {:?}: {}", path, err);
                Self::default()
            }),
            Err(err) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, err);
                Self::default()
            }
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instance: Option<String>,
    pub table: Option<String>,
    pub base_url: Option<String>,
}

/// Resolved runtime configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    base_url: String,
    pub table: String,
    pub credentials: Credentials,
}

impl Config {
    /// Resolve configuration from CLI overrides, the process environment and
    /// the default config file
    pub fn load(overrides: &Overrides) -> CmdbResult<Self> {
        Self::resolve(overrides, &FileConfig::load(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration (CLI > env > file > default)
    pub fn resolve<F>(overrides: &Overrides, file: &FileConfig, env: F) -> CmdbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        // Per level, a base URL wins over an instance name
        let base_url = [
            (non_empty(&overrides.base_url), non_empty(&overrides.instance)),
            (lookup(ENV_BASE_URL), lookup(ENV_INSTANCE)),
            (non_empty(&file.base_url), non_empty(&file.instance)),
        ]
        .into_iter()
        .find_map(|(base_url, instance)| match (base_url, instance) {
            (Some(url), _) => Some(validate_base_url(&url)),
            (None, Some(instance)) => Some(instance_url(&instance)),
            (None, None) => None,
        })
        .unwrap_or_else(|| {
            Err(CmdbError::Config(format!(
                "no ServiceNow instance configured. Set {} or use --instance",
                ENV_INSTANCE
            )))
        })?;

        let table = non_empty(&overrides.table)
            .or_else(|| lookup(ENV_TABLE))
            .or_else(|| non_empty(&file.table))
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let username = lookup(ENV_USER)
            .or_else(|| non_empty(&file.username))
            .unwrap_or_default();
        let password = lookup(ENV_PASSWORD).unwrap_or_default();

        Ok(Self {
            base_url,
            table,
            credentials: Credentials::new(username, password),
        })
    }

    /// Base URL of the instance, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Table API collection URL for the configured table
    pub fn table_url(&self) -> String {
        format!(
            "{}/api/now/table/{}",
            self.base_url,
            urlencoding::encode(&self.table)
        )
    }
}

fn instance_url(instance: &str) -> CmdbResult<String> {
    if instance.contains(['/', ':', '@']) {
        return Err(CmdbError::Config(format!(
            "invalid instance name '{}'. Use --base-url for full URLs",
            instance
        )));
    }
    Ok(format!("https://{}.service-now.com", instance))
}

fn validate_base_url(raw: &str) -> CmdbResult<String> {
    let url = Url::parse(raw)
        .map_err(|err| CmdbError::Config(format!("invalid base URL '{}': {}", raw, err)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CmdbError::Config(format!(
            "unsupported URL scheme '{}' in base URL",
            url.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_from_env() {
        let env = env_from(&[
            (ENV_INSTANCE, "dev12345"),
            (ENV_USER, "admin"),
            (ENV_PASSWORD, "hunter2"),
        ]);
        let config = Config::resolve(&Overrides::default(), &FileConfig::default(), env).unwrap();

        assert_eq!(config.base_url(), "https://dev12345.service-now.com");
        assert_eq!(config.table, DEFAULT_TABLE);
        assert_eq!(config.credentials, Credentials::new("admin", "hunter2"));
        assert_eq!(
            config.table_url(),
            "https://dev12345.service-now.com/api/now/table/cmdb_ci_linux_server"
        );
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let env = env_from(&[(ENV_INSTANCE, "from-env"), (ENV_TABLE, "env_table")]);
        let file = FileConfig {
            instance: Some("from-file".into()),
            table: Some("file_table".into()),
            ..Default::default()
        };
        let overrides = Overrides {
            instance: Some("from-cli".into()),
            ..Default::default()
        };

        let config = Config::resolve(&overrides, &file, env).unwrap();
        assert_eq!(config.base_url(), "https://from-cli.service-now.com");
        assert_eq!(config.table, "env_table");
    }

    #[test]
    fn test_file_used_when_env_empty() {
        let env = env_from(&[(ENV_INSTANCE, ""), (ENV_USER, "")]);
        let file = FileConfig {
            instance: Some("filed".into()),
            username: Some("svc_cmdb".into()),
            ..Default::default()
        };

        let config = Config::resolve(&Overrides::default(), &file, env).unwrap();
        assert_eq!(config.base_url(), "https://filed.service-now.com");
        assert_eq!(config.credentials.username, "svc_cmdb");
        assert!(config.credentials.password.is_empty());
    }

    #[test]
    fn test_base_url_takes_precedence_and_is_trimmed() {
        let env = env_from(&[(ENV_BASE_URL, "http://127.0.0.1:8080/"), (ENV_INSTANCE, "x")]);
        let config = Config::resolve(&Overrides::default(), &FileConfig::default(), env).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_cli_instance_beats_env_base_url() {
        let env = env_from(&[(ENV_BASE_URL, "https://stale.example.com")]);
        let overrides = Overrides {
            instance: Some("prod".into()),
            ..Default::default()
        };

        let config = Config::resolve(&overrides, &FileConfig::default(), env).unwrap();
        assert_eq!(config.base_url(), "https://prod.service-now.com");
    }

    #[test]
    fn test_env_instance_beats_file_base_url() {
        let env = env_from(&[(ENV_INSTANCE, "dev7")]);
        let file = FileConfig {
            base_url: Some("http://localhost:9000".into()),
            ..Default::default()
        };

        let config = Config::resolve(&Overrides::default(), &file, env).unwrap();
        assert_eq!(config.base_url(), "https://dev7.service-now.com");
    }

    #[test]
    fn test_empty_file_table_falls_back_to_default() {
        let file = FileConfig {
            instance: Some("acme".into()),
            table: Some(String::new()),
            ..Default::default()
        };

        let config = Config::resolve(&Overrides::default(), &file, env_from(&[])).unwrap();
        assert_eq!(config.table, DEFAULT_TABLE);
        assert!(config.table_url().ends_with("/api/now/table/cmdb_ci_linux_server"));
    }

    #[test]
    fn test_missing_instance_is_config_error() {
        let result = Config::resolve(&Overrides::default(), &FileConfig::default(), env_from(&[]));
        assert!(matches!(result, Err(CmdbError::Config(_))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let overrides = Overrides {
            base_url: Some("ftp://example.com".into()),
            ..Default::default()
        };
        let result = Config::resolve(&overrides, &FileConfig::default(), env_from(&[]));
        assert!(matches!(result, Err(CmdbError::Config(_))));

        let overrides = Overrides {
            base_url: Some("not a url".into()),
            ..Default::default()
        };
        let result = Config::resolve(&overrides, &FileConfig::default(), env_from(&[]));
        assert!(matches!(result, Err(CmdbError::Config(_))));
    }

    #[test]
    fn test_instance_with_url_characters_rejected() {
        let overrides = Overrides {
            instance: Some("https://dev.service-now.com".into()),
            ..Default::default()
        };
        let result = Config::resolve(&overrides, &FileConfig::default(), env_from(&[]));
        assert!(matches!(result, Err(CmdbError::Config(_))));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_file_config_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"instance": "acme", "table": "cmdb_ci_server"}"#).unwrap();

        let file = FileConfig::load_from(&path);
        assert_eq!(file.instance.as_deref(), Some("acme"));
        assert_eq!(file.table.as_deref(), Some("cmdb_ci_server"));
        assert!(file.username.is_none());
    }

    #[test]
    fn test_file_config_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileConfig::load_from(&dir.path().join("nope.json"));
        assert!(missing.instance.is_none());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{instance").unwrap();
        let malformed = FileConfig::load_from(&path);
        assert!(malformed.instance.is_none());
    }
}
