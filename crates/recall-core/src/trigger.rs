//! The once-a-day review run.
//!
//! One invocation: fetch the catalog, load the history, select a post,
//! advance its box, send the email, and only then persist. Any failure before
//! the send leaves the store untouched; a failed send also leaves it
//! untouched, so the same post is offered again on the next run.
//!
//! There is no retry. Tomorrow's run is the retry.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{self, Catalog};
use crate::config::ReviewSettings;
use crate::email::{self, SiteInfo};
use crate::error::ErrorCode;
use crate::history::HistoryStore;
use crate::leitner;
use crate::model::{PostReviewState, ReviewBox};
use crate::notify::{Dispatcher, OutgoingEmail};

/// Whether the run actually delivers and persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Deliver,
    /// Select and render, but neither send nor write.
    DryRun,
}

/// Why a run ended without sending anything. None of these are failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    ConfigurationMissing { missing: Vec<&'static str> },
    NoPosts,
    NothingDue,
}

impl SkipReason {
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing { .. } => "mail settings are not configured",
            Self::NoPosts => "the catalog has no blog posts",
            Self::NothingDue => "no post is due for review today",
        }
    }
}

/// The post picked for today and its state after this review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSelection {
    pub slug: String,
    pub title: String,
    #[serde(rename = "box")]
    pub review_box: ReviewBox,
    pub times_reviewed: u32,
    pub next_review_days: i64,
    pub subject: String,
    #[serde(skip)]
    pub html: String,
    #[serde(skip)]
    pub state: PostReviewState,
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Sent {
        #[serde(flatten)]
        review: ReviewSelection,
        delivery_id: String,
    },
    Previewed {
        #[serde(flatten)]
        review: ReviewSelection,
    },
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
}

/// Hard failures. The history store was not modified in any of these cases,
/// except that a `HistorySaveFailed` run did deliver its email.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("failed to fetch the post catalog: {0:#}")]
    CatalogFetchFailed(#[source] anyhow::Error),

    #[error("failed to load review history: {0:#}")]
    HistoryLoadFailed(#[source] anyhow::Error),

    #[error("failed to send review email for {slug}: {source:#}")]
    DispatchFailed {
        slug: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("review email for {slug} was sent but history was not saved: {source:#}")]
    HistorySaveFailed {
        slug: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TriggerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CatalogFetchFailed(_) => ErrorCode::CatalogFetchFailed,
            Self::HistoryLoadFailed(_) => ErrorCode::HistoryReadFailed,
            Self::DispatchFailed { .. } => ErrorCode::DispatchFailed,
            Self::HistorySaveFailed { .. } => ErrorCode::HistoryWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Run one daily review.
pub fn run_daily_review<R: Rng + ?Sized>(
    settings: &ReviewSettings,
    catalog: &dyn Catalog,
    store: &dyn HistoryStore,
    dispatcher: &dyn Dispatcher,
    rng: &mut R,
    now: DateTime<Utc>,
    mode: RunMode,
) -> Result<TriggerOutcome, TriggerError> {
    let credentials = match mode {
        RunMode::DryRun => None,
        RunMode::Deliver => {
            let missing = settings.missing_delivery_settings();
            if !missing.is_empty() {
                warn!(?missing, "skipping review run: mail settings missing");
                return Ok(TriggerOutcome::Skipped {
                    reason: SkipReason::ConfigurationMissing { missing },
                });
            }
            settings.api_key.as_deref().zip(settings.recipient.as_deref())
        }
    };

    let entries = catalog.entries().map_err(TriggerError::CatalogFetchFailed)?;
    let posts = catalog::blog_posts(&entries);
    if posts.is_empty() {
        info!("skipping review run: no blog posts in catalog");
        return Ok(TriggerOutcome::Skipped {
            reason: SkipReason::NoPosts,
        });
    }

    let mut history = store.load().map_err(TriggerError::HistoryLoadFailed)?;

    let Some(post) = leitner::select_post_for_review(&posts, &history, now, rng) else {
        info!(posts = posts.len(), "skipping review run: nothing due");
        return Ok(TriggerOutcome::Skipped {
            reason: SkipReason::NothingDue,
        });
    };

    let state = leitner::advance_box(history.get(&post.slug), post, now);
    let site = SiteInfo {
        url: &settings.site_url,
        name: &settings.site_name,
    };
    let review = ReviewSelection {
        slug: post.slug.clone(),
        title: post.title.clone(),
        review_box: state.review_box,
        times_reviewed: state.times_reviewed,
        next_review_days: leitner::next_review_days(state.review_box),
        subject: email::subject(post),
        html: email::html(post, &state, &site),
        state,
    };

    let Some((api_key, recipient)) = credentials else {
        info!(slug = %review.slug, "dry run: selected post, nothing sent");
        return Ok(TriggerOutcome::Previewed { review });
    };

    let message = OutgoingEmail {
        from: settings.sender.clone(),
        to: recipient.to_string(),
        subject: review.subject.clone(),
        html: review.html.clone(),
    };
    let receipt = dispatcher
        .send(api_key, &message)
        .map_err(|source| TriggerError::DispatchFailed {
            slug: review.slug.clone(),
            source,
        })?;

    history.insert(review.slug.clone(), review.state.clone());
    store
        .save(&history)
        .map_err(|source| TriggerError::HistorySaveFailed {
            slug: review.slug.clone(),
            source,
        })?;

    info!(
        slug = %review.slug,
        review_box = %review.review_box,
        times_reviewed = review.times_reviewed,
        delivery_id = %receipt.id,
        "review email sent"
    );
    Ok(TriggerOutcome::Sent {
        review,
        delivery_id: receipt.id,
    })
}
