pub mod index;
pub mod run;
pub mod status;
pub mod tags;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use recall_core::catalog::{Catalog, ContentDir, SearchIndexFile, SearchIndexUrl};
use recall_core::config::{CatalogSource, EnvSource, HistorySource, ProjectConfig};
use recall_core::history::{BlobStore, HistoryStore, JsonFileStore};
use tracing::debug;

/// Catalog adapter selected by the project config.
pub fn open_catalog(
    config: &ProjectConfig,
    project_root: &Path,
    env: &dyn EnvSource,
) -> anyhow::Result<Box<dyn Catalog>> {
    let source = config.catalog_source(project_root, env)?;
    debug!(?source, "catalog source");
    Ok(match source {
        CatalogSource::ContentDir(dir) => Box::new(ContentDir::new(dir)),
        CatalogSource::SearchIndexFile(path) => Box::new(SearchIndexFile::new(path)),
        CatalogSource::SearchIndexUrl(url) => Box::new(SearchIndexUrl::new(url)),
    })
}

/// History store selected by the project config.
pub fn open_history(
    config: &ProjectConfig,
    project_root: &Path,
    env: &dyn EnvSource,
) -> Box<dyn HistoryStore> {
    match config.history_source(project_root, env) {
        HistorySource::File(path) => {
            debug!(path = %path.display(), "history file");
            Box::new(JsonFileStore::new(path))
        }
        HistorySource::Blob { url, token } => {
            debug!(%url, authorized = token.is_some(), "history blob");
            Box::new(BlobStore::new(url, token))
        }
    }
}

/// Content root for commands that read markdown directly. An explicit
/// `--content` wins over `[catalog] content_dir`.
pub fn content_root(
    explicit: Option<&Path>,
    config: &ProjectConfig,
    project_root: &Path,
) -> anyhow::Result<PathBuf> {
    explicit
        .or(config.catalog.content_dir.as_deref())
        .map(|dir| project_root.join(dir))
        .context("no content directory: pass --content or set [catalog] content_dir")
}

/// `--now` values: any RFC 3339 timestamp, normalized to UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp: {err}"))
}
