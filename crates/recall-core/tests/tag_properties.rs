use proptest::prelude::*;
use recall_core::tags::{
    all_tags, build_tag_tree, expand_tag, posts_by_tag, root_tags, slug_to_tag, tag_to_slug,
};

fn arb_segment() -> impl Strategy<Value = String> {
    // Any Unicode except the separator; empty segments included on purpose.
    proptest::collection::vec(any::<char>().prop_filter("no separator", |c| *c != '/'), 0..6)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_tag() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_segment(), 1..5).prop_map(|segments| segments.join("/"))
}

fn arb_clean_tag() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-c가나]{1,2}", 1..4).prop_map(|segments| segments.join("/"))
}

fn arb_posts() -> impl Strategy<Value = Vec<Vec<String>>> {
    proptest::collection::vec(proptest::collection::vec(arb_clean_tag(), 0..4), 0..8)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn slug_round_trips_any_tag(tag in arb_tag()) {
        prop_assert_eq!(slug_to_tag(&tag_to_slug(&tag)).expect("decodes"), tag);
    }

    #[test]
    fn slug_segments_line_up_with_tag_segments(tag in arb_tag()) {
        let slug = tag_to_slug(&tag);
        prop_assert_eq!(slug.split('/').count(), tag.split('/').count());
        prop_assert!(slug.is_ascii());
    }

    #[test]
    fn expansion_ends_with_the_normalized_tag(tag in arb_clean_tag()) {
        let expanded = expand_tag(&tag);
        prop_assert_eq!(expanded.len(), tag.split('/').count());
        prop_assert_eq!(expanded.last().map(String::as_str), Some(tag.as_str()));
        for pair in expanded.windows(2) {
            let prefix = format!("{}/", pair[0]);
            prop_assert!(pair[1].starts_with(&prefix));
        }
    }

    #[test]
    fn tree_counts_match_tag_queries(posts in arb_posts()) {
        let tree = build_tag_tree(&posts);
        for tag in all_tags(&posts) {
            let node = tree.get(&tag).expect("every expanded tag is in the tree");
            prop_assert_eq!(node.count, posts_by_tag(&posts, &tag).len());
        }
    }

    #[test]
    fn parent_count_never_below_child_count(posts in arb_posts()) {
        let tree = build_tag_tree(&posts);
        for tag in all_tags(&posts) {
            let node = tree.get(&tag).expect("present");
            for child in node.children.values() {
                prop_assert!(child.count <= node.count);
            }
            prop_assert!(node.count <= posts.len());
        }
    }

    #[test]
    fn root_tags_are_the_single_segment_tags(posts in arb_posts()) {
        let roots: Vec<String> = all_tags(&posts)
            .into_iter()
            .filter(|tag| !tag.contains('/'))
            .collect();
        prop_assert_eq!(root_tags(&posts), roots);
    }
}

#[test]
fn korean_parent_and_child_counted_once() {
    let posts = vec![vec!["개발".to_string(), "개발/React".to_string()]];
    let tree = build_tag_tree(&posts);
    assert_eq!(tree.get("개발").map(|n| n.count), Some(1));
    assert_eq!(tree.get("개발/React").map(|n| n.count), Some(1));
}

#[test]
fn descendant_query_excludes_siblings() {
    let posts = vec![
        vec!["개발/React".to_string()],
        vec!["개발/React/Next.js".to_string()],
        vec!["개발/TypeScript".to_string()],
    ];
    let found = posts_by_tag(&posts, "개발/React");
    assert_eq!(found.len(), 2);
    assert!(!found.contains(&&posts[2]));
}
