//! Destination phone number normalization and validation.

use std::sync::LazyLock;

use regex::Regex;

pub const REQUIRED_REASON: &str = "Phone number is required";
pub const COUNTRY_CODE_REASON: &str =
    "Phone number must start with country code (e.g., +1234567890)";
pub const FORMAT_REASON: &str =
    "Invalid phone number format. Use +[country code][number] (10-15 digits total)";

/// `+`, a non-zero digit, then 9 to 14 more digits. ASCII digits only.
static E164: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{9,14}$").unwrap());

/// Outcome of validating a destination number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Present exactly when `valid` is false.
    pub error_reason: Option<String>,
    /// The stripped number, present exactly when `valid` is true.
    pub normalized: Option<String>,
}

impl ValidationResult {
    fn ok(normalized: String) -> Self {
        Self {
            valid: true,
            error_reason: None,
            normalized: Some(normalized),
        }
    }

    fn fail(reason: &str) -> Self {
        Self {
            valid: false,
            error_reason: Some(reason.to_string()),
            normalized: None,
        }
    }

    /// Convert into a `Result` carrying the normalized number or the reason.
    pub fn into_result(self) -> Result<String, String> {
        match (self.normalized, self.error_reason) {
            (Some(number), None) => Ok(number),
            (_, reason) => Err(reason.unwrap_or_else(|| FORMAT_REASON.to_string())),
        }
    }
}

/// Strip whitespace, parentheses and hyphens.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect()
}

/// Validate a raw destination number.
pub fn validate(raw: Option<&str>) -> ValidationResult {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return ValidationResult::fail(REQUIRED_REASON),
    };

    let clean = normalize(raw);
    if !clean.starts_with('+') {
        return ValidationResult::fail(COUNTRY_CODE_REASON);
    }
    if !E164.is_match(&clean) {
        return ValidationResult::fail(FORMAT_REASON);
    }
    ValidationResult::ok(clean)
}
