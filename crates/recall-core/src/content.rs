//! Markdown content on disk.
//!
//! The site keeps two collections under its content root:
//!
//! ```text
//! <root>/blog/<slug>.md       title, description, pubDate, tags, draft, ...
//! <root>/projects/<slug>.md   title, description, pubDate, techStack, ...
//! ```
//!
//! Each file starts with a `---` delimited YAML frontmatter block. Slugs come
//! from the path relative to the collection directory without the extension,
//! each segment slugified, so `blog/Notes/Hello World.md` has slug
//! `notes/hello-world`. A frontmatter `slug:` replaces the derived one.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::{CatalogEntry, EntryKind};
use crate::tags::Tagged;

const FRONTMATTER_FENCE: &str = "---";
const EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Blog post frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogFrontmatter {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "date_field::required")]
    pub pub_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "date_field::optional")]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Project frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFrontmatter {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "date_field::required")]
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub hero_image: Option<String>,
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Frontmatter shared by both collections.
pub trait Frontmatter: for<'de> Deserialize<'de> {
    /// Explicit `slug:` set in the file, if any.
    fn slug_override(&self) -> Option<&str>;
}

impl Frontmatter for BlogFrontmatter {
    fn slug_override(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

impl Frontmatter for ProjectFrontmatter {
    fn slug_override(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

/// One parsed content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPost<F> {
    pub slug: String,
    pub data: F,
}

pub type BlogEntry = ContentPost<BlogFrontmatter>;
pub type ProjectEntry = ContentPost<ProjectFrontmatter>;

impl Tagged for BlogEntry {
    fn tags(&self) -> &[String] {
        &self.data.tags
    }
}

/// Both collections of a content root.
#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub blog: Vec<BlogEntry>,
    pub projects: Vec<ProjectEntry>,
}

/// Errors parsing a single content file.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{}: missing `---` frontmatter block", path.display())]
    MissingFrontmatter { path: PathBuf },

    #[error("{}: invalid frontmatter: {source}", path.display())]
    InvalidFrontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load `blog` and `projects` under `root`. Missing collections are empty.
pub fn load_site(root: &Path) -> Result<SiteContent> {
    Ok(SiteContent {
        blog: load_collection(root, "blog")?,
        projects: load_collection(root, "projects")?,
    })
}

/// Load every markdown file in `root/<collection>`, sorted by slug.
pub fn load_collection<F: Frontmatter>(
    root: &Path,
    collection: &str,
) -> Result<Vec<ContentPost<F>>> {
    let dir = root.join(collection);
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "collection directory absent");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_markdown(&dir, &mut files)?;

    let mut posts = Vec::with_capacity(files.len());
    for path in files {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let data: F = parse_frontmatter(&path, &raw)?;
        let slug = data
            .slug_override()
            .map(|slug| slug.trim_matches('/').to_string())
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| slug_for(&dir, &path));
        posts.push(ContentPost { slug, data });
    }

    posts.sort_by(|a, b| a.slug.cmp(&b.slug));
    debug!(collection, count = posts.len(), "loaded content collection");
    Ok(posts)
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if is_markdown(&path) {
            out.push(path);
        } else {
            warn!(path = %path.display(), "skipping non-markdown file in content collection");
        }
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

fn slug_for(collection_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(collection_dir).unwrap_or(path);
    relative
        .with_extension("")
        .components()
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}

/// URL slug for one path segment, the way the site generator derives it:
/// lowercase, punctuation dropped, spaces become `-`. Letters and digits of
/// any script are kept.
#[must_use]
pub fn slugify(segment: &str) -> String {
    segment
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('-')
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}

/// Deserialize the frontmatter block at the top of `raw`.
pub fn parse_frontmatter<F>(path: &Path, raw: &str) -> Result<F, ContentError>
where
    F: for<'de> Deserialize<'de>,
{
    let missing = || ContentError::MissingFrontmatter {
        path: path.to_path_buf(),
    };

    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.lines();
    if lines.next().map(str::trim_end) != Some(FRONTMATTER_FENCE) {
        return Err(missing());
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == FRONTMATTER_FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
        yaml.push('\n');
    }
    if !closed {
        return Err(missing());
    }

    serde_yaml::from_str(&yaml).map_err(|source| ContentError::InvalidFrontmatter {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a frontmatter date: RFC 3339, `YYYY-MM-DD`, or `Mon DD YYYY`.
#[must_use]
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%b %d %Y", "%B %d %Y", "%b %d, %Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

mod date_field {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_pub_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date {raw:?}")))
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => super::parse_pub_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date {raw:?}"))),
        }
    }
}

/// The site's `search.json`: published blog posts and projects, newest first.
#[must_use]
pub fn build_search_index(blog: &[BlogEntry], projects: &[ProjectEntry]) -> Vec<CatalogEntry> {
    let posts = blog
        .iter()
        .filter(|post| !post.data.draft)
        .map(|post| CatalogEntry {
            title: post.data.title.clone(),
            description: post.data.description.clone(),
            slug: format!("/blog/{}", post.slug),
            kind: EntryKind::Blog,
            date: Some(post.data.pub_date),
        });
    let work = projects.iter().map(|project| CatalogEntry {
        title: project.data.title.clone(),
        description: project.data.description.clone(),
        slug: format!("/projects/{}", project.slug),
        kind: EntryKind::Project,
        date: Some(project.data.pub_date),
    });

    let mut index: Vec<CatalogEntry> = posts.chain(work).collect();
    index.sort_by(|a, b| b.date.cmp(&a.date));
    index
}
