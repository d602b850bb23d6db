use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::notify::RESEND_ENDPOINT;

pub const PROJECT_CONFIG_PATH: &str = ".recall/config.toml";
pub const DEFAULT_HISTORY_PATH: &str = ".recall/review-history.json";

pub const ENV_SITE_URL: &str = "SITE_URL";
pub const ENV_API_KEY: &str = "RESEND_API_KEY";
pub const ENV_EMAIL_TO: &str = "REVIEW_EMAIL_TO";
pub const ENV_EMAIL_FROM: &str = "REVIEW_EMAIL_FROM";
pub const ENV_BLOB_TOKEN: &str = "RECALL_BLOB_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_site_name")]
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: default_site_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Build the catalog from markdown under this directory.
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
    /// Read a saved `search.json`.
    #[serde(default)]
    pub search_index: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
    /// Blob endpoint; takes precedence over `path` when set.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_sender")]
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_sender(),
            to: None,
            endpoint: default_endpoint(),
        }
    }
}

/// Where the catalog comes from after applying precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    ContentDir(PathBuf),
    SearchIndexFile(PathBuf),
    SearchIndexUrl(String),
}

/// Where the history lives after applying precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySource {
    File(PathBuf),
    Blob { url: String, token: Option<String> },
}

/// Settings the daily trigger needs, with environment overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    pub site_url: String,
    pub site_name: String,
    pub sender: String,
    pub recipient: Option<String>,
    pub api_key: Option<String>,
}

impl ReviewSettings {
    /// Names of the delivery settings that are absent or blank.
    #[must_use]
    pub fn missing_delivery_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.api_key.as_deref()) {
            missing.push(ENV_API_KEY);
        }
        if is_blank(self.recipient.as_deref()) {
            missing.push(ENV_EMAIL_TO);
        }
        if self.site_url.trim().is_empty() {
            missing.push(ENV_SITE_URL);
        }
        missing
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Environment lookups, injectable for tests.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl<S: std::hash::BuildHasher> EnvSource for std::collections::HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned().filter(|v| !v.trim().is_empty())
    }
}

impl ProjectConfig {
    /// Resolve the catalog source. `content_dir` beats `search_index`, which
    /// beats `{site_url}/search.json`. Relative paths resolve against `root`.
    pub fn catalog_source(&self, root: &Path, env: &dyn EnvSource) -> Result<CatalogSource> {
        if let Some(dir) = &self.catalog.content_dir {
            return Ok(CatalogSource::ContentDir(root.join(dir)));
        }
        if let Some(path) = &self.catalog.search_index {
            return Ok(CatalogSource::SearchIndexFile(root.join(path)));
        }
        let site_url = self.site_url(env).with_context(|| {
            format!("no catalog configured: set [catalog] in {PROJECT_CONFIG_PATH} or {ENV_SITE_URL}")
        })?;
        Ok(CatalogSource::SearchIndexUrl(format!(
            "{}/search.json",
            site_url.trim_end_matches('/')
        )))
    }

    /// Resolve the history source. A blob `url` beats the file `path`.
    #[must_use]
    pub fn history_source(&self, root: &Path, env: &dyn EnvSource) -> HistorySource {
        match &self.history.url {
            Some(url) => HistorySource::Blob {
                url: url.clone(),
                token: env.var(ENV_BLOB_TOKEN),
            },
            None => HistorySource::File(root.join(&self.history.path)),
        }
    }

    fn site_url(&self, env: &dyn EnvSource) -> Option<String> {
        env.var(ENV_SITE_URL).or_else(|| self.site.url.clone())
    }

    /// Trigger settings. Environment values win over the file. The API key is
    /// only ever read from the environment.
    #[must_use]
    pub fn review_settings(&self, env: &dyn EnvSource) -> ReviewSettings {
        ReviewSettings {
            site_url: self.site_url(env).unwrap_or_default(),
            site_name: self.site.name.clone(),
            sender: env
                .var(ENV_EMAIL_FROM)
                .unwrap_or_else(|| self.mail.from.clone()),
            recipient: env.var(ENV_EMAIL_TO).or_else(|| self.mail.to.clone()),
            api_key: env.var(ENV_API_KEY),
        }
    }
}

/// Load the project config. An explicit `path` must exist; otherwise
/// `<root>/.recall/config.toml` is tried, then the user config directory.
pub fn load_project_config(root: &Path, path: Option<&Path>) -> Result<ProjectConfig> {
    if let Some(path) = path {
        return read_config(path);
    }

    let project_path = root.join(PROJECT_CONFIG_PATH);
    if project_path.exists() {
        return read_config(&project_path);
    }

    match user_config_path().filter(|p| p.exists()) {
        Some(user_path) => read_config(&user_path),
        None => Ok(ProjectConfig::default()),
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("recall/config.toml"))
}

fn read_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_site_name() -> String {
    "blog".to_string()
}

fn default_history_path() -> PathBuf {
    PathBuf::from(DEFAULT_HISTORY_PATH)
}

fn default_sender() -> String {
    "Blog Review <onboarding@resend.dev>".to_string()
}

fn default_endpoint() -> String {
    RESEND_ENDPOINT.to_string()
}
