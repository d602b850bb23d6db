//! Hierarchical `/`-delimited tags.
//!
//! A tag such as `개발/React/Next.js` implies every prefix (`개발`,
//! `개발/React`), so a post tagged with a leaf is also found under each of its
//! ancestors. Counts in the tag tree are per post: a post tagged both `개발`
//! and `개발/React` contributes once to `개발`.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

const SEPARATOR: char = '/';

/// Anything that carries a list of raw tag strings.
pub trait Tagged {
    fn tags(&self) -> &[String];
}

impl Tagged for Vec<String> {
    fn tags(&self) -> &[String] {
        self
    }
}

/// A tag split into its non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTag {
    pub segments: Vec<String>,
    pub full: String,
}

/// Count tree over expanded tag paths. The root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagTreeNode {
    pub count: usize,
    pub children: BTreeMap<String, TagTreeNode>,
}

impl TagTreeNode {
    /// Node for `path`, or `None` if no post carries that tag.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Self> {
        segments(path).try_fold(self, |node, segment| node.children.get(segment))
    }

    fn child_mut(&mut self, segment: &str) -> &mut Self {
        self.children.entry(segment.to_string()).or_default()
    }
}

/// Errors from decoding tag slugs.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// A percent-decoded segment was not valid UTF-8.
    #[error("tag slug segment {segment:?} does not decode to UTF-8")]
    InvalidSlug {
        segment: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

#[must_use]
pub fn parse_tag(raw: &str) -> ParsedTag {
    ParsedTag {
        segments: segments(raw).map(str::to_string).collect(),
        full: raw.to_string(),
    }
}

/// Every prefix path of `tag`, root first: `a/b/c` → `[a, a/b, a/b/c]`.
#[must_use]
pub fn expand_tag(tag: &str) -> Vec<String> {
    let mut expanded = Vec::new();
    let mut path = String::new();
    for segment in segments(tag) {
        if !path.is_empty() {
            path.push(SEPARATOR);
        }
        path.push_str(segment);
        expanded.push(path.clone());
    }
    expanded
}

/// Expanded tag set of one post, de-duplicated, in first-seen order.
fn expanded_tags<T: Tagged>(post: &T) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in post.tags() {
        for path in expand_tag(tag) {
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
    }
    out
}

#[must_use]
pub fn build_tag_tree<T: Tagged>(posts: &[T]) -> TagTreeNode {
    let mut root = TagTreeNode::default();

    for post in posts {
        for path in expanded_tags(post) {
            let node = segments(&path).fold(&mut root, TagTreeNode::child_mut);
            node.count += 1;
        }
    }

    root
}

/// Posts tagged `tag` or any descendant of it, in input order.
#[must_use]
pub fn posts_by_tag<'a, T: Tagged>(posts: &'a [T], tag: &str) -> Vec<&'a T> {
    let prefix = format!("{tag}{SEPARATOR}");
    posts
        .iter()
        .filter(|post| {
            post.tags()
                .iter()
                .any(|t| t == tag || t.starts_with(&prefix))
        })
        .collect()
}

/// Every expanded tag across `posts`, sorted.
#[must_use]
pub fn all_tags<T: Tagged>(posts: &[T]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| post.tags().iter().flat_map(|tag| expand_tag(tag)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Top-level segments across `posts`, sorted.
#[must_use]
pub fn root_tags<T: Tagged>(posts: &[T]) -> Vec<String> {
    build_tag_tree(posts).children.into_keys().collect()
}

/// Marks `encodeURIComponent` leaves bare on top of `A-Z a-z 0-9 - _ . ~`.
const URI_COMPONENT_MARKS: &str = "!'()*";

/// Percent-encode each segment, keeping `/` as the hierarchy separator.
/// Matches the site's tag URLs byte for byte.
#[must_use]
pub fn tag_to_slug(tag: &str) -> String {
    tag.split(SEPARATOR)
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut buf = [0_u8; 4];
    for ch in segment.chars() {
        if URI_COMPONENT_MARKS.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Inverse of [`tag_to_slug`].
pub fn slug_to_tag(slug: &str) -> Result<String, TagError> {
    let decoded = slug
        .split(SEPARATOR)
        .map(|segment| {
            urlencoding::decode(segment)
                .map(std::borrow::Cow::into_owned)
                .map_err(|source| TagError::InvalidSlug {
                    segment: segment.to_string(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(decoded.join("/"))
}
