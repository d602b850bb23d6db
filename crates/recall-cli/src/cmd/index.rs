//! `recall index`: build the site's `search.json` from markdown.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use recall_core::catalog::{CatalogEntry, EntryKind};
use recall_core::config::ProjectConfig;
use recall_core::content;
use recall_core::error::ErrorCode;
use tracing::info;

use crate::cmd::content_root;
use crate::output::{CliError, OutputMode, render, render_error};

#[derive(Args, Debug, Default)]
pub struct IndexArgs {
    /// Content root holding `blog/` and `projects/` (defaults to `[catalog] content_dir`).
    #[arg(long, value_name = "DIR")]
    pub content: Option<PathBuf>,

    /// Write the index as JSON to this file instead of printing it.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

fn write_rows(entries: &Vec<CatalogEntry>, w: &mut dyn Write) -> io::Result<()> {
    for entry in entries {
        let kind = match entry.kind {
            EntryKind::Blog => "blog",
            EntryKind::Project => "project",
        };
        let date = entry
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        writeln!(w, "{kind}\t{date}\t{}\t{}", entry.slug, entry.title)?;
    }
    Ok(())
}

fn write_index_file(path: &Path, entries: &[CatalogEntry]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_vec(entries).context("failed to serialize search index")?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, body).with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to move {} to {}", tmp_path.display(), path.display()))
}

pub fn run_index(
    args: &IndexArgs,
    output: OutputMode,
    config: &ProjectConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    let root = content_root(args.content.as_deref(), config, project_root)?;
    let site = match content::load_site(&root) {
        Ok(site) => site,
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ContentParseError),
            )?;
            return Err(err);
        }
    };
    let entries = content::build_search_index(&site.blog, &site.projects);

    match &args.output {
        Some(path) => {
            let path = project_root.join(path);
            write_index_file(&path, &entries)?;
            info!(path = %path.display(), entries = entries.len(), "wrote search index");
            Ok(())
        }
        None => render(output, &entries, write_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn entries() -> Vec<CatalogEntry> {
        vec![CatalogEntry {
            title: "Hello".to_string(),
            description: "First".to_string(),
            slug: "/blog/hello".to_string(),
            kind: EntryKind::Blog,
            date: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single(),
        }]
    }

    #[test]
    fn rows_show_kind_date_and_slug() {
        let mut buf = Vec::new();
        write_rows(&entries(), &mut buf).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "blog\t2024-02-01\t/blog/hello\tHello\n"
        );
    }

    #[test]
    fn index_file_matches_the_site_shape() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("dist/search.json");
        write_index_file(&path, &entries()).expect("write");

        let raw = fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value[0]["type"], "Blog");
        assert_eq!(value[0]["slug"], "/blog/hello");
        assert!(!dir.path().join("dist/search.json.tmp").exists());
    }
}
