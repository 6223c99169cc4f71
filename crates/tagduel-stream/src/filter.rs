//! Acceptance predicate for raw posts

use crate::StreamConfig;
use std::fmt;
use tagduel_domain::RawPost;

/// Why a post was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No text, or empty text
    MissingText,
    /// No language declared and `lang_none` is off
    MissingLanguage,
    /// Declared language differs from the requested one
    LanguageMismatch,
    /// `hash_only` is on and the structured hashtag list is empty
    NoHashtags,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::MissingText => "missing text",
            Rejection::MissingLanguage => "missing language",
            Rejection::LanguageMismatch => "language mismatch",
            Rejection::NoHashtags => "no hashtags",
        };
        f.write_str(reason)
    }
}

/// Decides whether a raw post is accepted
///
/// `lang_none` only widens the language check: posts without a language are
/// accepted, and posts that declare one must still match `lang`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFilter {
    lang: String,
    lang_none: bool,
    hash_only: bool,
}

impl StreamFilter {
    /// Create a filter
    pub fn new(lang: impl Into<String>, lang_none: bool, hash_only: bool) -> Self {
        Self {
            lang: lang.into(),
            lang_none,
            hash_only,
        }
    }

    /// Create a filter from stream configuration
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.lang.clone(), config.lang_none, config.hash_only)
    }

    /// Check a post, returning the first failed condition
    pub fn check(&self, post: &RawPost) -> Result<(), Rejection> {
        if !post.text().is_some_and(|text| !text.is_empty()) {
            return Err(Rejection::MissingText);
        }

        if post.has_language() {
            if post.language() != Some(self.lang.as_str()) {
                return Err(Rejection::LanguageMismatch);
            }
        } else if !self.lang_none {
            return Err(Rejection::MissingLanguage);
        }

        if self.hash_only && post.hashtags().is_empty() {
            return Err(Rejection::NoHashtags);
        }

        Ok(())
    }

    /// Whether the post is accepted
    pub fn accepts(&self, post: &RawPost) -> bool {
        self.check(post).is_ok()
    }
}
