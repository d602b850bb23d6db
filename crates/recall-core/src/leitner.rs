//! Leitner-box scheduling for blog post reviews.
//!
//! Every post moves through three boxes. A post in box `n` becomes due once
//! `interval(n)` whole days have passed since its last review:
//!
//! | box | interval |
//! |-----|----------|
//! | 1   | 1 day    |
//! | 2   | 3 days   |
//! | 3   | 7 days   |
//!
//! Reviews only promote. Box 3 is absorbing and a missed review never
//! demotes; the interval alone brings a post back around.
//!
//! All functions are pure. `now` and the random source are always supplied by
//! the caller so selection is reproducible under test.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::model::{BlogPost, PostReviewState, ReviewBox, ReviewHistory};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole days between `last_seen` and `now`, rounded toward negative infinity.
///
/// This is elapsed-time division, not calendar-date subtraction: 23 hours is
/// zero days even if midnight was crossed.
#[must_use]
pub fn days_since(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_seen)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// Whether `state` has waited at least its box interval as of `now`.
#[must_use]
pub fn is_due_for_review(state: &PostReviewState, now: DateTime<Utc>) -> bool {
    days_since(state.last_seen, now) >= state.review_box.interval_days()
}

/// Earliest instant at which `state` becomes due.
#[must_use]
pub fn due_at(state: &PostReviewState) -> DateTime<Utc> {
    state.last_seen + Duration::days(state.review_box.interval_days())
}

/// Pick the single post to review today.
///
/// Unseen posts (no history entry) always win and are chosen uniformly at
/// random. Otherwise the due post in the lowest box wins, earliest in catalog
/// order on ties. Posts that have history but are not yet due are never
/// returned.
pub fn select_post_for_review<'a, R: Rng + ?Sized>(
    posts: &'a [BlogPost],
    history: &ReviewHistory,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'a BlogPost> {
    let mut unseen: Vec<&BlogPost> = Vec::new();
    let mut due: Vec<(&BlogPost, ReviewBox)> = Vec::new();

    for post in posts {
        match history.get(&post.slug) {
            None => unseen.push(post),
            Some(state) if is_due_for_review(state, now) => due.push((post, state.review_box)),
            Some(_) => {}
        }
    }

    debug!(
        total = posts.len(),
        unseen = unseen.len(),
        due = due.len(),
        "partitioned catalog for review"
    );

    if let Some(post) = unseen.choose(rng) {
        return Some(*post);
    }

    // `min_by_key` keeps the first of equal minimums, which preserves catalog order.
    due.into_iter()
        .min_by_key(|(_, review_box)| *review_box)
        .map(|(post, _)| post)
}

/// State after reviewing `post` at `now`.
///
/// A first review lands in box 1. Later reviews promote by one box, capped at
/// box 3, and refresh the cached title.
#[must_use]
pub fn advance_box(
    prior: Option<&PostReviewState>,
    post: &BlogPost,
    now: DateTime<Utc>,
) -> PostReviewState {
    match prior {
        None => PostReviewState {
            slug: post.slug.clone(),
            title: post.title.clone(),
            review_box: ReviewBox::One,
            last_seen: now,
            times_reviewed: 1,
        },
        Some(state) => PostReviewState {
            slug: state.slug.clone(),
            title: post.title.clone(),
            review_box: state.review_box.promoted(),
            last_seen: now,
            times_reviewed: state.times_reviewed.saturating_add(1),
        },
    }
}

/// Interval that will apply after the next promotion from `review_box`.
///
/// Display only ("next review in N days"); scheduling never consults it.
#[must_use]
pub const fn next_review_days(review_box: ReviewBox) -> i64 {
    review_box.promoted().interval_days()
}
