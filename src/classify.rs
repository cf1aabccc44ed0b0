//! Keyword classification of inbound replies.

use std::fmt;

/// Decision extracted from a reply's free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Yes,
    No,
    Unrecognized,
}

impl Classification {
    /// Acknowledgement text sent back to the replier.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            Self::Yes => "✅ Noted: YES",
            Self::No => "❌ Noted: NO",
            Self::Unrecognized => "Got it. Thanks!",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
            Self::Unrecognized => write!(f, "UNRECOGNIZED"),
        }
    }
}

/// Trim and lowercase a reply body. This is the form that gets persisted.
pub fn normalize_body(body: &str) -> String {
    body.trim().to_lowercase()
}

/// Classify a reply by substring match. "yes" is checked before "no", so a
/// body containing both is a YES.
pub fn classify(body: &str) -> Classification {
    let text = normalize_body(body);
    if text.contains("yes") {
        Classification::Yes
    } else if text.contains("no") {
        Classification::No
    } else {
        Classification::Unrecognized
    }
}
