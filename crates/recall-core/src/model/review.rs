use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Review history keyed by post slug. Persisted as one JSON object.
pub type ReviewHistory = BTreeMap<String, PostReviewState>;

/// The three Leitner boxes.
///
/// Serialized as the bare integer `1`, `2`, or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewBox {
    One,
    Two,
    Three,
}

impl ReviewBox {
    /// Whole days that must elapse after a review before the post is due again.
    #[must_use]
    pub const fn interval_days(self) -> i64 {
        match self {
            Self::One => 1,
            Self::Two => 3,
            Self::Three => 7,
        }
    }

    /// The box a post moves to after one more review. `Three` is absorbing.
    #[must_use]
    pub const fn promoted(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two | Self::Three => Self::Three,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl fmt::Display for ReviewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Rejected box number on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("review box must be 1, 2, or 3 (got {0})")]
pub struct InvalidBox(pub u8);

impl TryFrom<u8> for ReviewBox {
    type Error = InvalidBox;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(InvalidBox(other)),
        }
    }
}

impl From<ReviewBox> for u8 {
    fn from(value: ReviewBox) -> Self {
        value.as_u8()
    }
}

/// Per-post review record.
///
/// Field names are camelCase on the wire so history documents written by the
/// site tooling load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReviewState {
    pub slug: String,
    pub title: String,
    #[serde(rename = "box")]
    pub review_box: ReviewBox,
    #[serde(with = "iso_millis")]
    pub last_seen: DateTime<Utc>,
    pub times_reviewed: u32,
}

/// `lastSeen` is written like JavaScript's `Date#toISOString` and read as any
/// RFC 3339 timestamp.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
