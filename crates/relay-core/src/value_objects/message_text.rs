//! Message text - sanitized, length-bounded message body
//!
//! Every message body passes through here exactly once, on receipt: HTML
//! tags are stripped, surrounding whitespace is trimmed, and the result
//! must be 1..=1000 characters. Anything stored or broadcast downstream is
//! already in this form.

use std::fmt;

use crate::error::DomainError;

/// Sanitized message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// Maximum length in characters, counted after sanitization
    pub const MAX_LENGTH: usize = 1000;

    /// Sanitize and validate raw client input
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyMessage`] if nothing remains after
    /// stripping and trimming, [`DomainError::MessageTooLong`] if the
    /// result exceeds [`Self::MAX_LENGTH`] characters.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let stripped = strip_tags(raw);
        let trimmed = stripped.trim();

        if trimmed.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::MessageTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// View the sanitized text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the sanitized text
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MessageText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Remove `<...>` spans. A `<` with no later `>` is kept as literal text.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_trims() {
        let text = MessageText::new("  <b>hi</b> there  ").unwrap();
        assert_eq!(text.as_str(), "hi there");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = MessageText::new("hello world").unwrap();
        assert_eq!(text.as_str(), "hello world");
    }

    #[test]
    fn unmatched_angle_bracket_is_literal() {
        let text = MessageText::new("2 < 3").unwrap();
        assert_eq!(text.as_str(), "2 < 3");

        let text = MessageText::new("a <b").unwrap();
        assert_eq!(text.as_str(), "a <b");
    }

    #[test]
    fn nested_brackets_strip_to_first_close() {
        let text = MessageText::new("x <<b> y").unwrap();
        assert_eq!(text.as_str(), "x  y");
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert!(matches!(
            MessageText::new(""),
            Err(DomainError::EmptyMessage)
        ));
        assert!(matches!(
            MessageText::new("   \t  "),
            Err(DomainError::EmptyMessage)
        ));
    }

    #[test]
    fn rejects_tag_only_input() {
        assert!(matches!(
            MessageText::new("<script></script>"),
            Err(DomainError::EmptyMessage)
        ));
    }

    #[test]
    fn accepts_exactly_max_length() {
        let raw = "a".repeat(MessageText::MAX_LENGTH);
        let text = MessageText::new(&raw).unwrap();
        assert_eq!(text.as_str().chars().count(), MessageText::MAX_LENGTH);
    }

    #[test]
    fn rejects_one_past_max_length() {
        let raw = "a".repeat(MessageText::MAX_LENGTH + 1);
        assert!(matches!(
            MessageText::new(&raw),
            Err(DomainError::MessageTooLong { max: 1000 })
        ));
    }

    #[test]
    fn length_is_counted_after_sanitization() {
        // Tags do not count against the limit once stripped.
        let raw = format!("<em>{}</em>", "b".repeat(MessageText::MAX_LENGTH));
        assert!(MessageText::new(&raw).is_ok());
    }

    #[test]
    fn length_is_counted_in_characters() {
        let raw = "é".repeat(MessageText::MAX_LENGTH);
        assert!(MessageText::new(&raw).is_ok());

        let raw = "é".repeat(MessageText::MAX_LENGTH + 1);
        assert!(MessageText::new(&raw).is_err());
    }
}
