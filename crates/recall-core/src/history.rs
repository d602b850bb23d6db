//! Review history persistence.
//!
//! The whole [`ReviewHistory`] mapping is read and written as one JSON
//! document. There is no partial update, no version token, and no lock: the
//! daily trigger is the only writer and runs once at a time, so the last
//! write wins.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::ReviewHistory;

/// Whole-document get/set over the review history.
pub trait HistoryStore {
    /// Current history. A store that has never been written returns an empty map.
    fn load(&self) -> Result<ReviewHistory>;

    /// Replace the stored history.
    fn save(&self, history: &ReviewHistory) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// History kept in a JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<ReviewHistory> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no history file yet");
            return Ok(ReviewHistory::new());
        }

        let bytes =
            fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ReviewHistory::new());
        }

        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn save(&self, history: &ReviewHistory) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(history).context("failed to serialize history")?;

        fs::write(&tmp_path, body)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to atomically move {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        debug!(path = %self.path.display(), entries = history.len(), "saved history");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP blob store
// ---------------------------------------------------------------------------

/// History kept as a single JSON blob behind an HTTP key-value endpoint.
///
/// `GET url` reads the blob (404 means empty), `PUT url` replaces it.
#[derive(Debug, Clone)]
pub struct BlobStore {
    url: String,
    token: Option<String>,
}

impl BlobStore {
    #[must_use]
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
        }
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl HistoryStore for BlobStore {
    fn load(&self) -> Result<ReviewHistory> {
        let request = self
            .authorize(ureq::get(&self.url))
            .set("Accept", "application/json");

        decode_blob(&self.url, request.call())
    }

    fn save(&self, history: &ReviewHistory) -> Result<()> {
        self.authorize(ureq::put(&self.url))
            .send_json(history)
            .map_err(|err| anyhow::anyhow!("history blob write failed for {}: {err}", self.url))?;
        Ok(())
    }
}

/// Turn a blob `GET` result into history. A 404, a blank body, and a JSON
/// `null` all mean nothing has been stored yet.
fn decode_blob(url: &str, result: Result<ureq::Response, ureq::Error>) -> Result<ReviewHistory> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(404, _)) => {
            debug!(url, "no history blob yet");
            return Ok(ReviewHistory::new());
        }
        Err(err) => anyhow::bail!("history blob request failed for {url}: {err}"),
    };

    let body = response
        .into_string()
        .with_context(|| format!("failed to read history blob at {url}"))?;
    if body.trim().is_empty() {
        return Ok(ReviewHistory::new());
    }
    serde_json::from_str::<Option<ReviewHistory>>(&body)
        .map(Option::unwrap_or_default)
        .with_context(|| format!("failed to decode history blob at {url}"))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store for tests and callers that embed the trigger.
/// Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: RefCell<ReviewHistory>,
    saves: RefCell<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(history: ReviewHistory) -> Self {
        Self {
            history: RefCell::new(history),
            saves: RefCell::new(0),
        }
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> ReviewHistory {
        self.history.borrow().clone()
    }

    /// Number of successful `save` calls.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<ReviewHistory> {
        Ok(self.history.borrow().clone())
    }

    fn save(&self, history: &ReviewHistory) -> Result<()> {
        *self.history.borrow_mut() = history.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PostReviewState, ReviewBox};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn state(slug: &str, review_box: ReviewBox) -> PostReviewState {
        PostReviewState {
            slug: slug.to_string(),
            title: format!("Post {slug}"),
            review_box,
            last_seen: Utc
                .with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
                .single()
                .expect("valid date"),
            times_reviewed: 2,
        }
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("history.json"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn blank_file_is_empty_history() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, "\n").expect("write");
        assert!(JsonFileStore::new(path).load().expect("load").is_empty());
    }

    #[test]
    fn file_store_round_trips_and_creates_parents() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("nested/.recall/history.json"));

        let mut history = ReviewHistory::new();
        history.insert("a".to_string(), state("a", ReviewBox::Two));
        store.save(&history).expect("save");

        assert_eq!(store.load().expect("load"), history);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_reports_corrupt_documents() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").expect("write");
        let err = JsonFileStore::new(&path).load().expect_err("corrupt");
        assert!(err.to_string().contains("failed to parse"));
    }

    fn response(status: u16, body: &str) -> ureq::Response {
        ureq::Response::new(status, "status", body).expect("response")
    }

    #[test]
    fn blob_not_found_is_empty_history() {
        let missing = Err(ureq::Error::Status(404, response(404, "")));
        assert!(decode_blob("http://blob", missing).expect("404").is_empty());
    }

    #[test]
    fn blob_null_or_blank_body_is_empty_history() {
        assert!(decode_blob("http://blob", Ok(response(200, "null"))).expect("null").is_empty());
        assert!(decode_blob("http://blob", Ok(response(200, " \n"))).expect("blank").is_empty());
    }

    #[test]
    fn blob_body_decodes_history() {
        let body = r#"{"a":{"slug":"a","title":"Post a","box":2,"lastSeen":"2024-03-01T00:00:00.000Z","timesReviewed":2}}"#;
        let history = decode_blob("http://blob", Ok(response(200, body))).expect("decode");
        assert_eq!(history["a"], state("a", ReviewBox::Two));
    }

    #[test]
    fn blob_server_errors_and_garbage_fail() {
        let err = decode_blob(
            "http://blob",
            Err(ureq::Error::Status(500, response(500, "boom"))),
        )
        .expect_err("500");
        assert!(err.to_string().contains("http://blob"));

        let err = decode_blob("http://blob", Ok(response(200, "<html>"))).expect_err("garbage");
        assert!(err.to_string().contains("failed to decode"));
    }

    #[test]
    fn memory_store_counts_saves() {
        let mut initial = ReviewHistory::new();
        initial.insert("a".to_string(), state("a", ReviewBox::One));
        let store = MemoryStore::new(initial);

        let mut history = store.load().expect("load");
        history.insert("b".to_string(), state("b", ReviewBox::One));
        store.save(&history).expect("save");

        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.save_count(), 1);
    }
}
