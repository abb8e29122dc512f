use std::fmt;

/// Closed taxonomy of terminal conversion failures.
///
/// The wire format is `"{kind}: {message}"` — the queue store only persists
/// a string as `failedReason`, so the kind is prefixed onto it and recovered
/// with [`FailureClassification::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    NavigationError,
    BotDetected,
    BlankPage,
    Paywall,
    Truncated,
    LowContrast,
    MissingContent,
    QualityFailed,
    DownloadFailed,
    NotPdf,
    FileMissing,
    Unknown,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NavigationError => "navigation_error",
            Self::BotDetected => "bot_detected",
            Self::BlankPage => "blank_page",
            Self::Paywall => "paywall",
            Self::Truncated => "truncated",
            Self::LowContrast => "low_contrast",
            Self::MissingContent => "missing_content",
            Self::QualityFailed => "quality_failed",
            Self::DownloadFailed => "download_failed",
            Self::NotPdf => "not_pdf",
            Self::FileMissing => "file_missing",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "timeout" => Self::Timeout,
            "navigation_error" => Self::NavigationError,
            "bot_detected" => Self::BotDetected,
            "blank_page" => Self::BlankPage,
            "paywall" => Self::Paywall,
            "truncated" => Self::Truncated,
            "low_contrast" => Self::LowContrast,
            "missing_content" => Self::MissingContent,
            "quality_failed" => Self::QualityFailed,
            "download_failed" => Self::DownloadFailed,
            "not_pdf" => Self::NotPdf,
            "file_missing" => Self::FileMissing,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A terminal failure, carrying both the typed kind and a human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureClassification {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureClassification {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Format as the wire representation stored in `failedReason`.
    #[must_use]
    pub fn format(&self) -> String {
        format!("{}: {}", self.kind.as_str(), self.message)
    }

    /// Recover a typed classification from a `failedReason` string.
    ///
    /// If the string has no recognized `kind:` prefix, the whole string is
    /// kept as the message and the kind is `Unknown` — this never fails,
    /// since any raised error (even one not produced by this crate) must be
    /// classifiable.
    #[must_use]
    pub fn parse(reason: &str) -> Self {
        match reason.split_once(": ") {
            Some((kind_str, rest)) => {
                let kind = FailureKind::from_str(kind_str);
                if kind == FailureKind::Unknown && kind_str != "unknown" {
                    Self::new(FailureKind::Unknown, reason.to_string())
                } else {
                    Self::new(kind, rest.to_string())
                }
            }
            None => Self::new(FailureKind::Unknown, reason.to_string()),
        }
    }

    #[must_use]
    pub fn is_bot_detected(&self) -> bool {
        self.kind == FailureKind::BotDetected
    }
}

impl fmt::Display for FailureClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_prefixes_kind() {
        let f = FailureClassification::new(FailureKind::Paywall, "subscribe to continue reading");
        assert_eq!(f.format(), "paywall: subscribe to continue reading");
    }

    #[test]
    fn round_trips_through_parse() {
        let f = FailureClassification::new(FailureKind::Truncated, "only 120 chars");
        let s = f.format();
        let back = FailureClassification::parse(&s);
        assert_eq!(back, f);
    }

    #[test]
    fn parse_unrecognized_kind_keeps_whole_string() {
        let back = FailureClassification::parse("some plain error with a colon: detail");
        assert_eq!(back.kind, FailureKind::Unknown);
        assert_eq!(back.message, "some plain error with a colon: detail");
    }

    #[test]
    fn parse_no_colon_is_unknown() {
        let back = FailureClassification::parse("boom");
        assert_eq!(back.kind, FailureKind::Unknown);
        assert_eq!(back.message, "boom");
    }

    #[test]
    fn all_kinds_round_trip() {
        let kinds = [
            FailureKind::Timeout,
            FailureKind::NavigationError,
            FailureKind::BotDetected,
            FailureKind::BlankPage,
            FailureKind::Paywall,
            FailureKind::Truncated,
            FailureKind::LowContrast,
            FailureKind::MissingContent,
            FailureKind::QualityFailed,
            FailureKind::DownloadFailed,
            FailureKind::NotPdf,
            FailureKind::FileMissing,
            FailureKind::Unknown,
        ];
        for kind in kinds {
            assert_eq!(FailureKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn is_bot_detected_true_only_for_bot_detected() {
        assert!(FailureClassification::new(FailureKind::BotDetected, "x").is_bot_detected());
        assert!(!FailureClassification::new(FailureKind::Timeout, "x").is_bot_detected());
    }
}
