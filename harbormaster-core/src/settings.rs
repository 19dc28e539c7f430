//! Settings for the registry client and provisioner.
//!
//! Resolution order: built-in defaults, then `~/.harbormaster/config.yaml` if
//! present, then environment overrides. Like [`crate::store`], every loader
//! has an `_at(home, …)` form for tests and a no-arg wrapper.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;
use crate::routes::{Routes, ROUTES_ENV};

pub const BASE_API_URL_ENV: &str = "HARBOR_BASE_API_URL";
pub const USERNAME_ENV: &str = "HARBOR_USERNAME";
pub const PASSWORD_ENV: &str = "HARBOR_PASSWORD";
pub const TIMEOUT_ENV: &str = "HARBOR_TIMEOUT_SECS";

/// Connection settings for the registry service API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarborSettings {
    /// Base of the v1 API, e.g. `https://harbor.example.com/api/`.
    pub base_api_url: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HarborSettings {
    fn default() -> Self {
        Self {
            base_api_url: "http://harbor-nginx:8080/api/".to_string(),
            username: "admin".to_string(),
            password: None,
            timeout_secs: 30,
        }
    }
}

/// What to write when the robot account already existed and no token came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingTokenPolicy {
    /// Write all three records; the password is empty.
    #[default]
    WriteEmpty,
    /// Write only the registry URL record.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub harbor: HarborSettings,
    /// Comma-separated route list; see [`crate::routes`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<String>,
    pub webhook_name: String,
    pub missing_token: MissingTokenPolicy,
    /// Serialize concurrent operations on the same project name.
    pub serialize_per_project: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            harbor: HarborSettings::default(),
            routes: None,
            webhook_name: "Lagoon Default Webhook".to_string(),
            missing_token: MissingTokenPolicy::default(),
            serialize_per_project: false,
        }
    }
}

impl Settings {
    pub fn routes(&self) -> Routes {
        Routes::resolve(self.routes.as_deref())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_API_URL_ENV) {
            self.harbor.base_api_url = url;
        }
        if let Some(user) = lookup(USERNAME_ENV) {
            self.harbor.username = user;
        }
        if let Some(password) = lookup(PASSWORD_ENV) {
            self.harbor.password = Some(password);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.harbor.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
        }
        if let Some(routes) = lookup(ROUTES_ENV) {
            self.routes = Some(routes);
        }
        Ok(self)
    }
}

/// Load `<home>/.harbormaster/config.yaml`, or defaults if it does not exist.
pub fn load_file_at(home: &Path) -> Result<Settings, ConfigError> {
    let path = paths::config_path(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// File settings under `home` overlaid with the process environment.
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    load_file_at(home)?.apply_env(|key| std::env::var(key).ok())
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;
    use crate::routes::DEFAULT_REGISTRY_URL;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let home = TempDir::new().expect("tempdir");
        let settings = load_file_at(home.path()).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.routes().registry_url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn file_values_are_read() {
        let home = TempDir::new().expect("tempdir");
        let path = paths::config_path(home.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(
            &path,
            "harbor:\n  base_api_url: https://harbor.example.com/api/\nmissing_token: skip\n",
        )
        .expect("write");

        let settings = load_file_at(home.path()).expect("load");
        assert_eq!(settings.harbor.base_api_url, "https://harbor.example.com/api/");
        assert_eq!(settings.harbor.username, "admin");
        assert_eq!(settings.missing_token, MissingTokenPolicy::Skip);
    }

    #[test]
    fn malformed_file_reports_path() {
        let home = TempDir::new().expect("tempdir");
        let path = paths::config_path(home.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "harbor: [unclosed").expect("write");

        let err = load_file_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn env_overrides_file() {
        let settings = Settings::default()
            .apply_env(env(&[
                (BASE_API_URL_ENV, "https://registry.test/api/"),
                (PASSWORD_ENV, "s3cret"),
                (TIMEOUT_ENV, "5"),
                (ROUTES_ENV, "harbor-nginx.test"),
            ]))
            .expect("apply");
        assert_eq!(settings.harbor.base_api_url, "https://registry.test/api/");
        assert_eq!(settings.harbor.password.as_deref(), Some("s3cret"));
        assert_eq!(settings.harbor.timeout_secs, 5);
        assert_eq!(settings.routes().registry_url, "harbor-nginx.test");
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Settings::default()
            .apply_env(env(&[(TIMEOUT_ENV, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: TIMEOUT_ENV, .. }));
    }
}
