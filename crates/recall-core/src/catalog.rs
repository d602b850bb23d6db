//! Post catalog: where the scheduler learns which posts exist.
//!
//! The site publishes a search index (`/search.json`) listing blog posts and
//! projects. Only blog entries are scheduled for review.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::content;
use crate::model::BlogPost;

const BLOG_PREFIX: &str = "/blog/";

/// Collection an index entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Blog,
    Project,
}

/// One record of the site search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub description: String,
    /// Site path including the collection prefix, e.g. `/blog/hello-world`.
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// Source of catalog entries.
pub trait Catalog {
    fn entries(&self) -> Result<Vec<CatalogEntry>>;
}

/// Blog entries with the `/blog/` prefix stripped from their slug.
#[must_use]
pub fn blog_posts(entries: &[CatalogEntry]) -> Vec<BlogPost> {
    entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Blog)
        .filter_map(|entry| {
            let slug = entry.slug.strip_prefix(BLOG_PREFIX).unwrap_or(&entry.slug);
            let slug = slug.trim_matches('/');
            (!slug.is_empty()).then(|| BlogPost::new(slug, &entry.title, &entry.description))
        })
        .collect()
}

/// Search index served by the live site.
#[derive(Debug, Clone)]
pub struct SearchIndexUrl {
    url: String,
}

impl SearchIndexUrl {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// `{site_url}/search.json`.
    #[must_use]
    pub fn for_site(site_url: &str) -> Self {
        Self::new(format!("{}/search.json", site_url.trim_end_matches('/')))
    }
}

impl Catalog for SearchIndexUrl {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let response = ureq::get(&self.url)
            .set("Accept", "application/json")
            .set("User-Agent", "recall-cli")
            .call()
            .map_err(|err| anyhow::anyhow!("search index request failed for {}: {err}", self.url))?;

        response
            .into_json::<Vec<CatalogEntry>>()
            .with_context(|| format!("failed to decode search index from {}", self.url))
    }
}

/// A search index saved to disk (e.g. the build output's `search.json`).
#[derive(Debug, Clone)]
pub struct SearchIndexFile {
    path: PathBuf,
}

impl SearchIndexFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Catalog for SearchIndexFile {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let bytes =
            fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

/// Search index built on the fly from the markdown content directory.
#[derive(Debug, Clone)]
pub struct ContentDir {
    root: PathBuf,
}

impl ContentDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Catalog for ContentDir {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let site = content::load_site(&self.root)?;
        Ok(content::build_search_index(&site.blog, &site.projects))
    }
}

/// Fixed entries, for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog for StaticCatalog {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}
