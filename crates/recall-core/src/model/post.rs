use serde::{Deserialize, Serialize};

/// A publishable blog post as seen by the scheduler.
///
/// `slug` is the bare post slug (no `/blog/` prefix) and is the key used in
/// the review history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl BlogPost {
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}
