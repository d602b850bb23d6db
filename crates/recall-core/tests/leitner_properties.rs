use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use recall_core::leitner::{
    advance_box, days_since, due_at, is_due_for_review, next_review_days, select_post_for_review,
};
use recall_core::model::{BlogPost, PostReviewState, ReviewBox, ReviewHistory};

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date")
}

fn arb_box() -> impl Strategy<Value = ReviewBox> {
    prop_oneof![
        Just(ReviewBox::One),
        Just(ReviewBox::Two),
        Just(ReviewBox::Three)
    ]
}

fn state(slug: &str, review_box: ReviewBox, last_seen: DateTime<Utc>) -> PostReviewState {
    PostReviewState {
        slug: slug.to_string(),
        title: slug.to_string(),
        review_box,
        last_seen,
        times_reviewed: 1,
    }
}

proptest! {
    #[test]
    fn advancing_never_demotes_and_caps_at_three(review_box in arb_box(), times in 1u32..1000) {
        let post = BlogPost::new("p", "P", "d");
        let mut prior = state("p", review_box, epoch());
        prior.times_reviewed = times;

        let next = advance_box(Some(&prior), &post, epoch() + Duration::days(30));
        prop_assert!(next.review_box >= prior.review_box);
        prop_assert!(next.review_box.as_u8() <= 3);
        prop_assert_eq!(next.times_reviewed, times + 1);
        prop_assert_eq!(next.review_box.as_u8(), (review_box.as_u8() + 1).min(3));
    }

    #[test]
    fn due_exactly_when_whole_days_reach_interval(
        review_box in arb_box(),
        elapsed_ms in 0i64..(30 * 86_400_000),
    ) {
        let last = state("p", review_box, epoch());
        let now = epoch() + Duration::milliseconds(elapsed_ms);
        let whole_days = elapsed_ms / 86_400_000;

        prop_assert_eq!(days_since(epoch(), now), whole_days);
        prop_assert_eq!(
            is_due_for_review(&last, now),
            whole_days >= review_box.interval_days()
        );
        prop_assert_eq!(is_due_for_review(&last, now), now >= due_at(&last));
    }

    #[test]
    fn selection_prefers_unseen_then_lowest_due_box(
        boxes in proptest::collection::vec(proptest::option::of(arb_box()), 1..12),
        seed in any::<u64>(),
    ) {
        let now = epoch() + Duration::days(100);
        let posts: Vec<BlogPost> = (0..boxes.len())
            .map(|i| BlogPost::new(format!("p{i}"), format!("P{i}"), "d"))
            .collect();
        let history: ReviewHistory = posts
            .iter()
            .zip(&boxes)
            .filter_map(|(post, b)| b.map(|b| (post.slug.clone(), state(&post.slug, b, epoch()))))
            .collect();

        let picked = select_post_for_review(&posts, &history, now, &mut StdRng::seed_from_u64(seed))
            .expect("everything is due after 100 days");

        if boxes.iter().any(Option::is_none) {
            prop_assert!(!history.contains_key(&picked.slug));
        } else {
            let lowest = boxes.iter().flatten().min().copied().expect("non-empty");
            let first = posts
                .iter()
                .zip(&boxes)
                .find(|(_, b)| **b == Some(lowest))
                .map(|(post, _)| post)
                .expect("lowest exists");
            prop_assert_eq!(picked, first);
        }
    }
}

#[test]
fn next_review_days_reads_the_promoted_interval() {
    assert_eq!(next_review_days(ReviewBox::One), 3);
    assert_eq!(next_review_days(ReviewBox::Two), 7);
    assert_eq!(next_review_days(ReviewBox::Three), 7);
}

#[test]
fn nothing_due_when_every_post_was_just_reviewed() {
    let posts = vec![BlogPost::new("a", "A", "d"), BlogPost::new("b", "B", "d")];
    let history: ReviewHistory = posts
        .iter()
        .map(|p| (p.slug.clone(), state(&p.slug, ReviewBox::One, epoch())))
        .collect();
    let now = epoch() + Duration::hours(23);
    assert!(select_post_for_review(&posts, &history, now, &mut StdRng::seed_from_u64(0)).is_none());
}
