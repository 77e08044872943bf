//! Runtime settings
//!
//! Loaded from `~/.config/routine-builder/config.toml` when present, then
//! overridden by `ROUTINE_*` environment variables. The completion API
//! credential is never read from the file; it only comes from
//! `OPENAI_API_KEY`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog resource: an http(s) URL or a local path
    pub catalog: String,
    /// Base URL of the generateRoutine proxy
    pub backend_url: String,
    pub search_url: String,
    pub completions_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Listen address for `serve`
    pub bind: String,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: "products.json".to_string(),
            backend_url: "http://127.0.0.1:8787".to_string(),
            search_url: "https://api.duckduckgo.com/".to_string(),
            completions_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 700,
            bind: "127.0.0.1:8787".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load from the default config location plus environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("routine-builder").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&raw)?;
        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Apply `ROUTINE_*` overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("ROUTINE_CATALOG") {
            self.catalog = v;
        }
        if let Some(v) = lookup("ROUTINE_BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = lookup("ROUTINE_SEARCH_URL") {
            self.search_url = v;
        }
        if let Some(v) = lookup("ROUTINE_COMPLETIONS_URL") {
            self.completions_url = v;
        }
        if let Some(v) = lookup("ROUTINE_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("ROUTINE_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("ROUTINE_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "ROUTINE_HTTP_TIMEOUT_SECS",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// HTTP client shared by every outbound call, with the bounded timeout
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.http_timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            })
    }
}

/// Client-side credential for the direct completion fallback, if configured
pub fn credential() -> Option<String> {
    std::env::var(CREDENTIAL_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "catalog = \"https://cdn.example.com/products.json\"").unwrap();
        writeln!(file, "max_tokens = 900").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.catalog, "https://cdn.example.com/products.json");
        assert_eq!(settings.max_tokens, 900);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.http_timeout_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ROUTINE_BACKEND_URL", "http://worker.local"),
            ("ROUTINE_HTTP_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.backend_url, "http://worker.local");
        assert_eq!(settings.http_timeout(), Duration::from_secs(5));
        assert_eq!(settings.catalog, "products.json");
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|k| {
            (k == "ROUTINE_HTTP_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
