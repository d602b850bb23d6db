use std::fmt;

/// Machine-readable error codes for scripted callers and cron logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ConfigurationMissing,
    CatalogFetchFailed,
    ContentParseError,
    HistoryReadFailed,
    HistoryWriteFailed,
    DispatchFailed,
    InvalidTagSlug,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ConfigurationMissing => "E1002",
            Self::CatalogFetchFailed => "E2001",
            Self::ContentParseError => "E2002",
            Self::HistoryReadFailed => "E3001",
            Self::HistoryWriteFailed => "E3002",
            Self::DispatchFailed => "E4001",
            Self::InvalidTagSlug => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ConfigurationMissing => "Mail settings missing",
            Self::CatalogFetchFailed => "Post catalog unavailable",
            Self::ContentParseError => "Content file could not be parsed",
            Self::HistoryReadFailed => "Review history could not be read",
            Self::HistoryWriteFailed => "Review history could not be written",
            Self::DispatchFailed => "Review email was not delivered",
            Self::InvalidTagSlug => "Tag slug is not valid percent-encoded UTF-8",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .recall/config.toml and retry."),
            Self::ConfigurationMissing => {
                Some("Set RESEND_API_KEY, REVIEW_EMAIL_TO and SITE_URL ([mail].to and [site].url also work).")
            }
            Self::CatalogFetchFailed => {
                Some("Check [site].url or [catalog] settings; tomorrow's run retries.")
            }
            Self::ContentParseError => Some("Fix the frontmatter block at the top of the file."),
            Self::HistoryReadFailed => Some("Inspect or restore the review history document."),
            Self::HistoryWriteFailed => Some("Check disk space, permissions, or blob credentials."),
            Self::DispatchFailed => {
                Some("History was left untouched; tomorrow's run picks the post again.")
            }
            Self::InvalidTagSlug => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
