//! Bookmark input validation
//!
//! Pure, synchronous checks run before any write reaches the store. The store
//! is never asked to persist a title/URL pair that fails these rules.

use thiserror::Error;
use url::Url;

/// Minimum title length after trimming
pub const TITLE_MIN_LEN: usize = 3;

/// Maximum title length after trimming
pub const TITLE_MAX_LEN: usize = 100;

/// Errors from validating a candidate bookmark
///
/// All of these are recovered locally by editing the input; none warrant a
/// retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title must be at least {TITLE_MIN_LEN} characters")]
    TitleTooShort,

    #[error("Title must be at most {TITLE_MAX_LEN} characters")]
    TitleTooLong,

    #[error("URL must be an absolute http or https address")]
    InvalidUrl,
}

/// A validated, trimmed title/URL pair ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub url: String,
}

/// Validate a candidate title/URL pair
///
/// Both inputs are trimmed first. Titles must be within
/// [`TITLE_MIN_LEN`, `TITLE_MAX_LEN`] characters; URLs must parse as absolute
/// with an `http` or `https` scheme.
pub fn validate(title: &str, url: &str) -> Result<Draft, ValidationError> {
    let title = title.trim();
    let url = url.trim();

    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len < TITLE_MIN_LEN {
        return Err(ValidationError::TitleTooShort);
    }
    if len > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong);
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(Draft {
        title: title.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pair() {
        let draft = validate("My Site", "https://example.com").unwrap();
        assert_eq!(draft.title, "My Site");
        assert_eq!(draft.url, "https://example.com");
    }

    #[test]
    fn test_inputs_are_trimmed() {
        let draft = validate("  My Site  ", "  https://example.com  ").unwrap();
        assert_eq!(draft.title, "My Site");
        assert_eq!(draft.url, "https://example.com");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(validate("", "https://x.com"), Err(ValidationError::EmptyTitle));
        assert_eq!(
            validate("   ", "https://x.com"),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn test_title_too_short() {
        assert_eq!(
            validate("ab", "https://x.com"),
            Err(ValidationError::TitleTooShort)
        );
        // Exactly at the minimum is fine
        assert!(validate("abc", "https://x.com").is_ok());
    }

    #[test]
    fn test_title_too_long() {
        let long = "a".repeat(TITLE_MAX_LEN + 1);
        assert_eq!(
            validate(&long, "https://x.com"),
            Err(ValidationError::TitleTooLong)
        );
        // Exactly at the maximum is fine
        let max = "a".repeat(TITLE_MAX_LEN);
        assert!(validate(&max, "https://x.com").is_ok());
    }

    #[test]
    fn test_url_wrong_scheme() {
        assert_eq!(
            validate("My Site", "ftp://x.com"),
            Err(ValidationError::InvalidUrl)
        );
    }

    #[test]
    fn test_url_not_absolute() {
        assert_eq!(
            validate("My Site", "/relative/path"),
            Err(ValidationError::InvalidUrl)
        );
        assert_eq!(
            validate("My Site", "not a url"),
            Err(ValidationError::InvalidUrl)
        );
    }

    #[test]
    fn test_http_scheme_accepted() {
        assert!(validate("Plain", "http://example.com").is_ok());
    }

    #[test]
    fn test_error_display() {
        let msg = ValidationError::TitleTooShort.to_string();
        assert!(msg.contains("at least 3"));
    }
}
